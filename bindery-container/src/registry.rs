//! Binding registry — stores one active binding per `(type, key)` slot.
//!
//! A binding is either a ready instance or a provider (factory) with its
//! singleton flag. The last `bind` call for a slot wins.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::compat::ConversionTable;
use crate::error::Result;
use crate::key::BindingKey;
use crate::resolver::Resolver;

/// A type-erased resolved value.
///
/// Everything the container hands out is one of these; typed wrappers
/// downcast and clone out at the edge. Cloning the `Arc` preserves the
/// identity of the inner value, which is what the singleton and cycle
/// guarantees are built on.
pub type Shared = Arc<dyn Any + Send + Sync>;

/// Type-erased provider function.
///
/// Receives the per-call [`Resolver`] so it can resolve its own
/// dependencies; `Arc` because bindings are shared between threads.
pub type FactoryFn = Arc<dyn for<'a> Fn(&Resolver<'a>) -> Result<Shared> + Send + Sync>;

/// The two binding shapes.
#[derive(Clone)]
pub(crate) enum Binding {
    /// A ready value, directly assignable.
    Instance { value: Shared },
    /// A factory invoked on demand; its result is cached when
    /// `singleton` is set.
    Provider { factory: FactoryFn, singleton: bool },
}

impl Binding {
    /// Whether resolving this binding produces one shared value.
    pub(crate) fn is_singleton(&self) -> bool {
        match self {
            Binding::Instance { .. } => true,
            Binding::Provider { singleton, .. } => *singleton,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Instance { .. } => f.debug_struct("Instance").finish_non_exhaustive(),
            Binding::Provider { singleton, .. } => f
                .debug_struct("Provider")
                .field("singleton", singleton)
                .finish_non_exhaustive(),
        }
    }
}

/// Stores all active bindings.
///
/// Guarded by a read-write lock; lookups clone the binding out so no
/// lock is held while a provider runs.
pub(crate) struct BindingRegistry {
    bindings: RwLock<HashMap<BindingKey, Binding>>,
}

impl BindingRegistry {
    pub(crate) fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Installs a binding. The previous binding for the slot, if any,
    /// is displaced — last bind wins.
    pub(crate) fn bind(&self, key: BindingKey, binding: Binding) {
        debug!(key = %key, binding = ?binding, "Bound");
        self.bindings.write().insert(key, binding);
    }

    /// Looks up the active binding for a slot.
    pub(crate) fn get(&self, key: &BindingKey) -> Option<Binding> {
        self.bindings.read().get(key).cloned()
    }

    /// Returns `true` if an instance or a provider exists for the slot.
    pub(crate) fn has(&self, key: &BindingKey) -> bool {
        self.bindings.read().contains_key(key)
    }

    /// All bound keys (for "did you mean?" suggestions).
    pub(crate) fn keys(&self) -> Vec<BindingKey> {
        self.bindings.read().keys().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// Fallback scan: finds a binding under the same slot name whose
    /// type has a registered conversion to the requested type.
    ///
    /// Instances are preferred over providers, matching the original
    /// resolution order.
    pub(crate) fn scan_convertible(
        &self,
        requested: &BindingKey,
        conversions: &ConversionTable,
    ) -> Option<(BindingKey, Binding)> {
        let bindings = self.bindings.read();

        let mut provider_hit: Option<(BindingKey, Binding)> = None;
        for (key, binding) in bindings.iter() {
            if key.name() != requested.name() || key.type_id() == requested.type_id() {
                continue;
            }
            if !conversions.convertible(key.type_id(), requested.type_id()) {
                continue;
            }
            trace!(from = %key, to = %requested, "Fallback scan matched");
            match binding {
                Binding::Instance { .. } => return Some((key.clone(), binding.clone())),
                Binding::Provider { .. } => {
                    if provider_hit.is_none() {
                        provider_hit = Some((key.clone(), binding.clone()));
                    }
                }
            }
        }

        provider_hit
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("bindings", &self.len())
            .finish()
    }
}
