//! # The Container
//!
//! Binds abstract types to ready instances or provider functions and
//! resolves arbitrary type requests by walking the dependency graph,
//! instantiating missing nodes on demand, caching singletons, and
//! completing cyclic object graphs through deferred handles.
//!
//! # Architecture
//! ```text
//! bind_* ──> BindingRegistry ──┐
//!                              ├──> Resolver (per call, own chain)
//! resolve / invoke ────────────┘        │
//!                          SingletonCache ⇄ PendingPatches
//! ```
//!
//! # Examples
//! ```rust
//! use bindery_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, msg: &str);
//! }
//!
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger {
//!     fn log(&self, msg: &str) { println!("{msg}"); }
//! }
//!
//! struct UserService {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let container = Container::new();
//! container.bind_instance(Arc::new(ConsoleLogger) as Arc<dyn Logger>).unwrap();
//! container.bind_provider(|r: &Resolver<'_>| {
//!     Ok(Arc::new(UserService { logger: r.resolve()? }))
//! }).unwrap();
//!
//! let service: Arc<UserService> = container.resolve().unwrap();
//! service.logger.log("resolved");
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cache::SingletonCache;
use crate::compat::{Compatibility, ConversionTable};
use crate::cycle::{Deferred, PendingPatches};
use crate::error::{BinderyError, Result};
use crate::invoke::{Invokable, InvokeOptions};
use crate::key::BindingKey;
use crate::registry::{Binding, BindingRegistry, FactoryFn, Shared};
use crate::resolver::Resolver;

// ============================================================
// BindOptions
// ============================================================

/// Options for a `bind_*` call.
///
/// Defaults: singleton, unnamed slot. Mirrors the classic functional
/// options as a small builder.
///
/// # Examples
/// ```rust,ignore
/// container.bind_provider_with(
///     BindOptions::new().transient().named("scratch"),
///     |_| Ok(Buffer::with_capacity(4096)),
/// )?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BindOptions {
    singleton: bool,
    key: Option<&'static str>,
}

impl BindOptions {
    pub fn new() -> Self {
        Self {
            singleton: true,
            key: None,
        }
    }

    /// A new value is constructed on every resolve; nothing is cached.
    pub fn transient(mut self) -> Self {
        self.singleton = false;
        self
    }

    /// Binds under a named slot, independent of the unnamed one.
    pub fn named(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }
}

impl Default for BindOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Container
// ============================================================

/// Thread-safe dependency-resolution container.
///
/// All operations take `&self`; the registry and cache are guarded by
/// locks, and the resolution chain lives in a per-call [`Resolver`], so
/// `bind`, `resolve`, `has`, and `invoke` may be called concurrently
/// against one instance.
///
/// Providers run synchronously on the calling thread: a provider that
/// blocks, blocks its caller — the container imposes no timeout. Panics
/// inside a provider are not caught. There is no resolution depth
/// limit; a non-cyclic, infinitely deep graph recurses until resource
/// exhaustion.
pub struct Container {
    pub(crate) registry: BindingRegistry,
    pub(crate) cache: SingletonCache,
    pub(crate) conversions: ConversionTable,
    pub(crate) pending: PendingPatches,
}

impl Container {
    pub fn new() -> Self {
        Self {
            registry: BindingRegistry::new(),
            cache: SingletonCache::new(),
            conversions: ConversionTable::new(),
            pending: PendingPatches::new(),
        }
    }

    // ── Bind: instances ──

    /// Binds a ready value. Resolving it returns a value identical to
    /// the one bound (clone the `Arc` for cheap shared identity).
    ///
    /// The last bind for a slot wins; any cached value for the slot is
    /// replaced.
    pub fn bind_instance<T: Send + Sync + 'static>(&self, value: T) -> Result<()> {
        self.install_instance(BindingKey::of::<T>(), Arc::new(value));
        Ok(())
    }

    /// Binds a ready value under a named slot.
    pub fn bind_instance_keyed<T: Send + Sync + 'static>(
        &self,
        name: &'static str,
        value: T,
    ) -> Result<()> {
        self.install_instance(BindingKey::named::<T>(name), Arc::new(value));
        Ok(())
    }

    /// Binds a value of a convertible type `U` into the slot for `T`.
    ///
    /// The conversion runs eagerly at bind time. Fails with
    /// `CannotBind` naming both types if no `U → T` conversion edge is
    /// registered.
    pub fn bind_instance_as<T, U>(&self, value: U) -> Result<()>
    where
        T: Send + Sync + 'static,
        U: Send + Sync + 'static,
    {
        match self
            .conversions
            .compatibility(TypeId::of::<T>(), TypeId::of::<U>())
        {
            Compatibility::Identical => {
                self.install_instance(BindingKey::of::<T>(), Arc::new(value));
                Ok(())
            }
            Compatibility::Convertible => {
                let converted = self.conversions.apply(
                    TypeId::of::<U>(),
                    TypeId::of::<T>(),
                    type_name::<U>(),
                    type_name::<T>(),
                    &value,
                )?;
                self.install_instance(BindingKey::of::<T>(), converted);
                Ok(())
            }
            Compatibility::Incompatible => Err(BinderyError::CannotBind {
                requested: type_name::<T>(),
                candidate: type_name::<U>(),
            }),
        }
    }

    // ── Bind: providers ──

    /// Binds a provider (factory) for `T`, singleton by default.
    ///
    /// The provider runs on first resolve; with the singleton flag set
    /// its result is cached and reused for every later resolve of the
    /// slot.
    pub fn bind_provider<T, F>(&self, provider: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
    {
        self.bind_provider_with(BindOptions::new(), provider)
    }

    /// [`Container::bind_provider`] with explicit [`BindOptions`].
    pub fn bind_provider_with<T, F>(&self, opts: BindOptions, provider: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
    {
        let key = BindingKey::with_name::<T>(opts.key);
        let factory: FactoryFn =
            Arc::new(move |r: &Resolver<'_>| Ok(Arc::new(provider(r)?) as Shared));
        self.install_provider(key, factory, opts.singleton);
        Ok(())
    }

    /// Binds a provider returning a convertible type `U` into the slot
    /// for `T`. The result converts at resolve time; the missing edge
    /// is reported as `CannotBind` at bind time.
    pub fn bind_provider_as<T, U, F>(&self, opts: BindOptions, provider: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        U: Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<U> + Send + Sync + 'static,
    {
        match self
            .conversions
            .compatibility(TypeId::of::<T>(), TypeId::of::<U>())
        {
            Compatibility::Incompatible => Err(BinderyError::CannotBind {
                requested: type_name::<T>(),
                candidate: type_name::<U>(),
            }),
            Compatibility::Identical => {
                let key = BindingKey::with_name::<T>(opts.key);
                let factory: FactoryFn =
                    Arc::new(move |r: &Resolver<'_>| Ok(Arc::new(provider(r)?) as Shared));
                self.install_provider(key, factory, opts.singleton);
                Ok(())
            }
            Compatibility::Convertible => {
                let key = BindingKey::with_name::<T>(opts.key);
                let factory: FactoryFn = Arc::new(move |r: &Resolver<'_>| {
                    let produced = provider(r)?;
                    r.container().conversions.apply(
                        TypeId::of::<U>(),
                        TypeId::of::<T>(),
                        type_name::<U>(),
                        type_name::<T>(),
                        &produced,
                    )
                });
                self.install_provider(key, factory, opts.singleton);
                Ok(())
            }
        }
    }

    /// Binds a plain function as a provider: its parameters are
    /// resolved from the container, its `Ok` value becomes the bound
    /// type.
    ///
    /// ```rust,ignore
    /// fn make_service(db: Arc<Database>) -> Result<Arc<Service>> { ... }
    /// container.bind_fn(make_service)?;
    /// ```
    pub fn bind_fn<F, Args>(&self, f: F) -> Result<()>
    where
        F: Invokable<Args> + Clone + Send + Sync + 'static,
        F::Output: Send + Sync + 'static,
    {
        self.bind_fn_with(BindOptions::new(), f)
    }

    /// [`Container::bind_fn`] with explicit [`BindOptions`].
    pub fn bind_fn_with<F, Args>(&self, opts: BindOptions, f: F) -> Result<()>
    where
        F: Invokable<Args> + Clone + Send + Sync + 'static,
        F::Output: Send + Sync + 'static,
    {
        let key = BindingKey::with_name::<F::Output>(opts.key);
        let factory: FactoryFn = Arc::new(move |r: &Resolver<'_>| {
            let produced = r.invoke(f.clone())?;
            Ok(Arc::new(produced) as Shared)
        });
        self.install_provider(key, factory, opts.singleton);
        Ok(())
    }

    // ── Conversions ──

    /// Registers a `From → To` conversion edge, enabling `bind_*_as`
    /// and the resolver's fallback scan between the two types.
    pub fn add_conversion<From, To>(
        &self,
        convert: impl Fn(&From) -> To + Send + Sync + 'static,
    ) where
        From: 'static,
        To: Send + Sync + 'static,
    {
        self.conversions.register::<From, To>(convert);
    }

    // ── Resolve / Has / Invoke ──

    /// Resolves a value by type.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.resolve()?;
    /// ```
    pub fn resolve<T: Clone + Send + Sync + 'static>(&self) -> Result<T> {
        Resolver::new(self).resolve()
    }

    /// Resolves a value from a named binding slot.
    pub fn resolve_keyed<T: Clone + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<T> {
        Resolver::new(self).resolve_keyed(name)
    }

    /// Top-level deferred resolve. With a fresh chain nothing can be
    /// mid-construction, so the handle is ready unless resolution
    /// fails; the form exists for symmetry with [`Resolver`].
    pub fn resolve_deferred<T: Clone + Send + Sync + 'static>(&self) -> Result<Deferred<T>> {
        Resolver::new(self).resolve_deferred()
    }

    /// Named-slot variant of [`Container::resolve_deferred`].
    pub fn resolve_deferred_keyed<T: Clone + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<Deferred<T>> {
        Resolver::new(self).resolve_deferred_keyed(name)
    }

    /// Returns `true` if an instance, provider, or cached value exists
    /// for the slot.
    pub fn has<T: 'static>(&self) -> bool {
        let key = BindingKey::of::<T>();
        self.registry.has(&key) || self.cache.contains(&key)
    }

    /// Named-slot variant of [`Container::has`].
    pub fn has_keyed<T: 'static>(&self, name: &'static str) -> bool {
        let key = BindingKey::named::<T>(name);
        self.registry.has(&key) || self.cache.contains(&key)
    }

    /// Invokes a function, resolving each parameter by type.
    pub fn invoke<F, Args>(&self, f: F) -> Result<F::Output>
    where
        F: Invokable<Args>,
    {
        Resolver::new(self).invoke(f)
    }

    /// [`Container::invoke`] with positional overrides and keys.
    pub fn invoke_with<F, Args>(&self, f: F, opts: InvokeOptions) -> Result<F::Output>
    where
        F: Invokable<Args>,
    {
        Resolver::new(self).invoke_with(f, opts)
    }

    // ── Internal ──

    fn install_instance(&self, key: BindingKey, value: Shared) {
        debug!(key = %key, "Binding instance");
        self.registry.bind(
            key.clone(),
            Binding::Instance {
                value: Arc::clone(&value),
            },
        );
        // Write-through: instance resolves are plain cache hits.
        self.cache.insert(key, value);
    }

    fn install_provider(&self, key: BindingKey, factory: FactoryFn, singleton: bool) {
        debug!(key = %key, singleton, "Binding provider");
        // A provider replacing an instance must not leave the old value
        // resolvable.
        self.cache.invalidate(&key);
        self.registry
            .bind(key, Binding::Provider { factory, singleton });
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.registry.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

// ============================================================
// Prelude
// ============================================================

pub mod prelude {
    pub use super::{BindOptions, Container};
    pub use crate::cycle::Deferred;
    pub use crate::error::{BinderyError, Result};
    pub use crate::invoke::{FromResolver, Invokable, InvokeOptions};
    pub use crate::key::BindingKey;
    pub use crate::resolver::Resolver;
}

// ============================================================
// Tests
// ============================================================
