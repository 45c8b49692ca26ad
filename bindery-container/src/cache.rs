//! Singleton cache — already-constructed values per `(type, key)` slot.
//!
//! Consulted before any provider runs; populated lazily the first time a
//! singleton binding resolves (and eagerly for instance bindings and
//! converted fallback results). Entries are only invalidated by a new
//! bind on the same slot.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

use crate::key::BindingKey;
use crate::registry::Shared;

pub(crate) struct SingletonCache {
    values: DashMap<BindingKey, Shared>,
}

impl SingletonCache {
    pub(crate) fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// Cache lookup; clones the `Arc` out so no shard lock escapes.
    pub(crate) fn get(&self, key: &BindingKey) -> Option<Shared> {
        let hit = self.values.get(key).map(|v| Arc::clone(v.value()));
        if hit.is_some() {
            trace!(key = %key, "Cache hit");
        }
        hit
    }

    pub(crate) fn insert(&self, key: BindingKey, value: Shared) {
        trace!(key = %key, "Cached");
        self.values.insert(key, value);
    }

    /// Drops the stale entry for a slot that is being re-bound.
    pub(crate) fn invalidate(&self, key: &BindingKey) {
        if self.values.remove(key).is_some() {
            trace!(key = %key, "Cache invalidated");
        }
    }

    pub(crate) fn contains(&self, key: &BindingKey) -> bool {
        self.values.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}

impl fmt::Debug for SingletonCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let cache = SingletonCache::new();
        let key = BindingKey::of::<String>();
        cache.insert(key.clone(), Arc::new(String::from("hi")));

        let value = cache.get(&key).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "hi");
        assert!(cache.contains(&key));
    }

    #[test]
    fn get_preserves_identity() {
        let cache = SingletonCache::new();
        let key = BindingKey::of::<Arc<String>>();
        let original = Arc::new(String::from("shared"));
        cache.insert(key.clone(), Arc::new(Arc::clone(&original)));

        let a = cache.get(&key).unwrap();
        let b = cache.get(&key).unwrap();
        let a = a.downcast_ref::<Arc<String>>().unwrap();
        let b = b.downcast_ref::<Arc<String>>().unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert!(Arc::ptr_eq(a, &original));
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = SingletonCache::new();
        let key = BindingKey::of::<i32>();
        cache.insert(key.clone(), Arc::new(1i32));
        cache.invalidate(&key);
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn keyed_entries_are_independent() {
        let cache = SingletonCache::new();
        cache.insert(BindingKey::named::<i32>("a"), Arc::new(1i32));

        assert!(cache.get(&BindingKey::of::<i32>()).is_none());
        assert!(cache.get(&BindingKey::named::<i32>("b")).is_none());
        assert!(cache.get(&BindingKey::named::<i32>("a")).is_some());
    }
}
