//! Runtime dependency-resolution container.
//!
//! Binds types to instances or providers, resolves whole object graphs
//! on demand, caches singletons, and completes circular dependencies
//! through [`Deferred`] handles instead of failing on them. All
//! operations are thread-safe behind `&self`.
//!
//! Start with [`Container`] for an owned container, or the [`global`]
//! module for the process-wide default.

pub mod compat;
pub mod container;
pub mod cycle;
pub mod error;
pub mod global;
pub mod invoke;
pub mod key;
pub mod registry;
pub mod resolver;

mod cache;

pub use compat::Compatibility;
pub use container::{BindOptions, Container, prelude};
pub use cycle::Deferred;
pub use error::{BinderyError, Result};
pub use invoke::{FromResolver, Invokable, InvokeOptions};
pub use key::BindingKey;
pub use resolver::Resolver;
