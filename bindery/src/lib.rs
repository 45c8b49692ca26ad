//! # Bindery
//!
//! A runtime dependency-resolution container for Rust.
//!
//! Bind types to ready instances or provider functions, then resolve
//! them anywhere — the container walks the dependency graph, constructs
//! what is missing, caches singletons, and completes circular object
//! graphs through [`Deferred`] handles.
//!
//! # Quick start
//! ```rust
//! use bindery::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct Config {
//!     url: String,
//! }
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let container = Container::new();
//! container.bind_instance(Config { url: "pg://localhost".into() }).unwrap();
//! container.bind_provider(|r: &Resolver<'_>| {
//!     let config: Config = r.resolve()?;
//!     Ok(Arc::new(Database { url: config.url }))
//! }).unwrap();
//!
//! let db: Arc<Database> = container.resolve().unwrap();
//! assert_eq!(db.url, "pg://localhost");
//! ```
//!
//! # Crate layout
//! - [`container`](bindery_container) — the engine: binding, resolution,
//!   cycle completion, invocation.
//! - [`support`](bindery_support) — rendering helpers used in error
//!   messages.

pub use bindery_container::{
    BindOptions, BinderyError, BindingKey, Compatibility, Container, Deferred, FromResolver,
    Invokable, InvokeOptions, Resolver, Result, global, prelude,
};

pub use bindery_container as container;
pub use bindery_support as support;
