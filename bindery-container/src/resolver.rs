//! Per-call resolution context.
//!
//! A [`Resolver`] is created for every top-level `resolve`/`invoke` call
//! and carries the resolution chain: the `(type, key)` slots currently
//! under construction on this call stack. The chain is deliberately NOT
//! container state — concurrent resolutions each get their own, so one
//! call's cycle detection can never corrupt another's.
//!
//! Resolution order for a slot:
//! 1. singleton cache hit (the only path with no chain interaction);
//! 2. slot already on the chain — a cycle; eager resolution fails, a
//!    deferred resolution hands out a placeholder handle;
//! 3. bound provider — push, run, pop, cache if singleton, backpatch;
//! 4. fallback scan for a convertible binding under the same slot name;
//! 5. nothing matches — `NotFound`.

use std::any::type_name;
use std::cell::RefCell;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::container::Container;
use crate::cycle::Deferred;
use crate::error::{BinderyError, CircularDependencyError, NotFoundError, Result};
use crate::invoke::{Invokable, InvokeOptions};
use crate::key::BindingKey;
use crate::registry::{Binding, FactoryFn, Shared};

/// Resolution context scoped to one top-level call.
///
/// Providers receive a `&Resolver` to resolve their own dependencies;
/// nested resolutions share this context and therefore its chain.
pub struct Resolver<'a> {
    container: &'a Container,
    chain: RefCell<Vec<BindingKey>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self {
            container,
            chain: RefCell::new(Vec::new()),
        }
    }

    /// The container this resolution runs against.
    pub fn container(&self) -> &Container {
        self.container
    }

    /// Resolves a value by type.
    pub fn resolve<T: Clone + Send + Sync + 'static>(&self) -> Result<T> {
        self.resolve_slot(BindingKey::of::<T>())
    }

    /// Resolves a value from a named binding slot.
    pub fn resolve_keyed<T: Clone + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<T> {
        self.resolve_slot(BindingKey::named::<T>(name))
    }

    /// Resolves a value that may be part of a cycle.
    ///
    /// If the slot is already under construction on this chain, the
    /// returned handle is empty and will be patched with the canonical
    /// value once the provider at the cycle point completes. Otherwise
    /// it resolves normally and the handle is ready immediately.
    ///
    /// Only singleton bindings may close a cycle; a transient binding
    /// on the chain fails with `CircularDependency`.
    pub fn resolve_deferred<T: Clone + Send + Sync + 'static>(&self) -> Result<Deferred<T>> {
        self.deferred_slot(BindingKey::of::<T>())
    }

    /// Named-slot variant of [`Resolver::resolve_deferred`].
    pub fn resolve_deferred_keyed<T: Clone + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> Result<Deferred<T>> {
        self.deferred_slot(BindingKey::named::<T>(name))
    }

    /// Invokes a function with container-resolved arguments, sharing
    /// this chain (used by providers that are plain functions).
    pub fn invoke<F, Args>(&self, f: F) -> Result<F::Output>
    where
        F: Invokable<Args>,
    {
        f.call_with(self, InvokeOptions::new())
    }

    /// [`Resolver::invoke`] with call-scoped options.
    pub fn invoke_with<F, Args>(&self, f: F, opts: InvokeOptions) -> Result<F::Output>
    where
        F: Invokable<Args>,
    {
        f.call_with(self, opts)
    }

    // ── internals ──

    fn resolve_slot<T: Clone + Send + Sync + 'static>(&self, key: BindingKey) -> Result<T> {
        let shared = self.resolve_erased(&key)?;
        downcast_shared(shared, key)
    }

    fn deferred_slot<T: Clone + Send + Sync + 'static>(
        &self,
        key: BindingKey,
    ) -> Result<Deferred<T>> {
        if let Some(hit) = self.container.cache.get(&key) {
            return Ok(Deferred::ready(downcast_shared(hit, key)?));
        }

        if self.on_chain(&key) {
            // Transient values never share identity, so a cycle through
            // one can never be completed.
            if !self.chain_binding_is_singleton(&key) {
                return Err(self.cycle_error(&key));
            }
            let handle = Deferred::pending();
            self.container.pending.register(key, handle.patch_fn());
            return Ok(handle);
        }

        Ok(Deferred::ready(self.resolve_slot(key)?))
    }

    pub(crate) fn resolve_erased(&self, key: &BindingKey) -> Result<Shared> {
        // 1. cache
        if let Some(hit) = self.container.cache.get(key) {
            return Ok(hit);
        }

        // 2. re-entrancy
        if self.on_chain(key) {
            return Err(self.cycle_error(key));
        }

        // 3. active binding
        if let Some(binding) = self.container.registry.get(key) {
            match binding {
                Binding::Instance { value } => {
                    // Written through to the cache at bind time. Never
                    // re-cached here: a concurrent rebind may already
                    // have displaced this value.
                    return Ok(value);
                }
                Binding::Provider { factory, singleton } => {
                    trace!(key = %key, "Running provider");
                    let value = self.run_provider(key, factory)?;
                    return Ok(self.complete(key, value, singleton));
                }
            }
        }

        // 4. fallback scan over convertible bindings
        if let Some(value) = self.resolve_convertible(key)? {
            return Ok(value);
        }

        // 5. nothing matches
        Err(self.not_found(key))
    }

    /// Runs a provider with `key` on the chain; the chain entry is
    /// removed whether or not the provider succeeds.
    fn run_provider(&self, key: &BindingKey, factory: FactoryFn) -> Result<Shared> {
        self.chain.borrow_mut().push(key.clone());
        let produced = factory(self);
        self.chain.borrow_mut().pop();
        if produced.is_err() {
            // Handles issued against this attempt must stay empty; a
            // later retry hands out fresh placeholders.
            self.container.pending.abandon(key);
        }
        produced
    }

    /// Post-construction bookkeeping: cache singletons and patch every
    /// placeholder waiting on this slot.
    fn complete(&self, key: &BindingKey, value: Shared, singleton: bool) -> Shared {
        if singleton {
            self.container.cache.insert(key.clone(), Arc::clone(&value));
        }
        self.container.pending.fulfil(key, &value);
        value
    }

    /// Step 4: look for a binding of a different type under the same
    /// slot name with a registered conversion to the requested type.
    /// The converted result is cached under the requested slot so
    /// future requests hit step 1.
    fn resolve_convertible(&self, requested: &BindingKey) -> Result<Option<Shared>> {
        let conversions = &self.container.conversions;
        let Some((source, binding)) = self
            .container
            .registry
            .scan_convertible(requested, conversions)
        else {
            return Ok(None);
        };

        match binding {
            Binding::Instance { value } => {
                let converted = conversions.apply(
                    source.type_id(),
                    requested.type_id(),
                    source.type_name(),
                    requested.type_name(),
                    &*value,
                )?;
                self.container
                    .cache
                    .insert(requested.clone(), Arc::clone(&converted));
                Ok(Some(converted))
            }
            Binding::Provider { factory, singleton } => {
                trace!(source = %source, requested = %requested, "Running convertible provider");
                let produced = self.run_provider(requested, factory)?;
                let converted = conversions.apply(
                    source.type_id(),
                    requested.type_id(),
                    source.type_name(),
                    requested.type_name(),
                    &*produced,
                )?;
                Ok(Some(self.complete(requested, converted, singleton)))
            }
        }
    }

    fn on_chain(&self, key: &BindingKey) -> bool {
        self.chain.borrow().contains(key)
    }

    /// Singleton flag of whatever is constructing `key` on this chain:
    /// the direct binding, or the convertible source the fallback scan
    /// selected.
    fn chain_binding_is_singleton(&self, key: &BindingKey) -> bool {
        if let Some(binding) = self.container.registry.get(key) {
            return binding.is_singleton();
        }
        match self
            .container
            .registry
            .scan_convertible(key, &self.container.conversions)
        {
            Some((_, binding)) => binding.is_singleton(),
            None => true,
        }
    }

    fn cycle_error(&self, key: &BindingKey) -> BinderyError {
        let mut chain = self.chain.borrow().clone();
        chain.push(key.clone());
        warn!(chain = ?chain, "Circular dependency detected");
        BinderyError::CircularDependency(CircularDependencyError { chain })
    }

    fn not_found(&self, key: &BindingKey) -> BinderyError {
        BinderyError::NotFound(NotFoundError {
            requested: key.clone(),
            required_by: self.chain.borrow().last().cloned(),
            suggestions: self.find_suggestions(key),
        })
    }

    fn find_suggestions(&self, key: &BindingKey) -> Vec<BindingKey> {
        let keys = self.container.registry.keys();
        let names: Vec<&str> = keys.iter().map(|k| k.type_name()).collect();
        let picks =
            bindery_support::rendering::suggest_similar(key.type_name(), &names, 3);
        keys.into_iter()
            .filter(|k| k != key && picks.iter().any(|p| p == k.type_name()))
            .collect()
    }
}

fn downcast_shared<T: Clone + Send + Sync + 'static>(
    shared: Shared,
    key: BindingKey,
) -> Result<T> {
    shared
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| BinderyError::ConstructionFailed {
            key,
            source: format!("type mismatch: expected {}", type_name::<T>()).into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{BindOptions, Container};

    #[test]
    fn not_found_carries_required_by() {
        #[derive(Debug)]
        struct Service;

        let container = Container::new();
        container
            .bind_provider(|r: &Resolver<'_>| {
                let _missing: u64 = r.resolve()?;
                Ok(Arc::new(Service))
            })
            .unwrap();

        let err = container.resolve::<Arc<Service>>().unwrap_err();
        match err {
            BinderyError::NotFound(e) => {
                assert!(e.requested.type_name().contains("u64"));
                let parent = e.required_by.expect("nested resolution records parent");
                assert!(parent.type_name().contains("Service"));
            }
            other => panic!("expected NotFound, got: {other}"),
        }
    }

    #[test]
    fn eager_resolve_of_cycle_fails_with_chain() {
        #[derive(Debug)]
        struct A;
        struct B;

        let container = Container::new();
        container
            .bind_provider(|r: &Resolver<'_>| {
                let _b: Arc<B> = r.resolve()?;
                Ok(Arc::new(A))
            })
            .unwrap();
        container
            .bind_provider(|r: &Resolver<'_>| {
                let _a: Arc<A> = r.resolve()?;
                Ok(Arc::new(B))
            })
            .unwrap();

        let err = container.resolve::<Arc<A>>().unwrap_err();
        match err {
            BinderyError::CircularDependency(e) => {
                // A → B → A
                assert_eq!(e.chain.len(), 3);
                assert_eq!(e.chain.first(), e.chain.last());
            }
            other => panic!("expected CircularDependency, got: {other}"),
        }
    }

    #[test]
    fn transient_fallback_binding_cannot_close_a_cycle() {
        #[derive(Debug)]
        struct Stage;
        struct Pipeline {
            #[allow(dead_code)]
            stage: Deferred<Arc<Stage>>,
        }

        let container = Container::new();
        container.add_conversion::<Arc<Pipeline>, Arc<Stage>>(|_| Arc::new(Stage));
        // Only a transient binding exists, and only for the convertible
        // source type; the cycle closes through the fallback scan.
        container
            .bind_provider_with(BindOptions::new().transient(), |r: &Resolver<'_>| {
                Ok(Arc::new(Pipeline {
                    stage: r.resolve_deferred()?,
                }))
            })
            .unwrap();

        let err = container.resolve::<Arc<Stage>>().unwrap_err();
        assert!(matches!(err, BinderyError::CircularDependency(_)));
    }

    #[test]
    fn chain_is_cleared_after_failure() {
        struct A;

        let container = Container::new();
        container
            .bind_provider(|r: &Resolver<'_>| {
                let _a: Arc<A> = r.resolve()?;
                Ok(Arc::new(A))
            })
            .unwrap();

        assert!(container.resolve::<Arc<A>>().is_err());

        // Rebind to something constructible; the previous failure must
        // not leave chain residue behind (fresh resolver per call).
        container.bind_instance(Arc::new(A)).unwrap();
        assert!(container.resolve::<Arc<A>>().is_ok());
    }

    #[test]
    fn provider_error_propagates_to_caller() {
        struct Leaf;
        #[derive(Debug)]
        struct Root;

        let container = Container::new();
        container
            .bind_provider(|_: &Resolver<'_>| -> Result<Arc<Leaf>> {
                Err(BinderyError::ConstructionFailed {
                    key: BindingKey::of::<Arc<Leaf>>(),
                    source: "connection refused".into(),
                })
            })
            .unwrap();
        container
            .bind_provider(|r: &Resolver<'_>| {
                let _leaf: Arc<Leaf> = r.resolve()?;
                Ok(Arc::new(Root))
            })
            .unwrap();

        let err = container.resolve::<Arc<Root>>().unwrap_err();
        assert!(matches!(err, BinderyError::ConstructionFailed { .. }));
    }
}
