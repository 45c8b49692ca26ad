//! Cycle breaking — deferred handles and the pending-patch table.
//!
//! When a resolution re-enters a type that is already under construction
//! on the current chain, the resolver cannot produce the finished value
//! yet. Instead it hands out a [`Deferred`] placeholder: a shared cell
//! that every participant in the cycle holds. Once the real value exists
//! (the provider at the cycle point completes), the pending table patches
//! the cell and all holders observe the same canonical instance.
//!
//! After the outermost `resolve`/`invoke` call returns successfully,
//! every handle created during that call is filled. If a provider in the
//! middle of a cycle fails, its placeholders stay empty — `get()` keeps
//! returning `None`, which is the explicit "never completed" state.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use crate::key::BindingKey;
use crate::registry::Shared;

/// A placeholder for a value still under construction.
///
/// Cloning the handle is cheap and every clone observes the single fill.
/// For an edge that did not actually close a cycle the handle is ready
/// immediately.
///
/// # Examples
/// ```rust,ignore
/// struct Engine { telemetry: Deferred<Arc<Telemetry>> }
///
/// container.bind_provider(|r| {
///     Ok(Arc::new(Engine { telemetry: r.resolve_deferred()? }))
/// })?;
/// ```
pub struct Deferred<T> {
    cell: Arc<OnceCell<T>>,
}

impl<T> Deferred<T> {
    /// An unfilled handle, registered for patching.
    pub(crate) fn pending() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// A handle that is already complete.
    pub(crate) fn ready(value: T) -> Self {
        Self {
            cell: Arc::new(OnceCell::with_value(value)),
        }
    }

    /// The finished value, or `None` while the cycle point is still
    /// under construction (or its provider failed).
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Whether the real value has been patched in.
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: Clone + Send + Sync + 'static> Deferred<T> {
    /// Builds the type-erased patch that fills this handle.
    pub(crate) fn patch_fn(&self) -> PatchFn {
        let cell = Arc::clone(&self.cell);
        Box::new(move |value: &Shared| {
            if let Some(v) = value.downcast_ref::<T>() {
                let _ = cell.set(v.clone());
            }
        })
    }
}

// Manual impl: cloning must not require T: Clone.
impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Deferred").field(value).finish(),
            None => f.write_str("Deferred(<pending>)"),
        }
    }
}

/// A patch that writes the finished value into one deferred cell.
pub(crate) type PatchFn = Box<dyn FnOnce(&Shared) + Send>;

/// Pending patches per slot, consumed when the slot's provider completes.
pub(crate) struct PendingPatches {
    table: Mutex<HashMap<BindingKey, Vec<PatchFn>>>,
}

impl PendingPatches {
    pub(crate) fn new() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Schedules a patch for when `key` finishes construction.
    pub(crate) fn register(&self, key: BindingKey, patch: PatchFn) {
        debug!(key = %key, "Deferred placeholder issued");
        self.table.lock().entry(key).or_default().push(patch);
    }

    /// Runs and discards every patch scheduled for `key`.
    pub(crate) fn fulfil(&self, key: &BindingKey, value: &Shared) {
        let patches = self.table.lock().remove(key);
        if let Some(patches) = patches {
            debug!(key = %key, count = patches.len(), "Backpatching placeholders");
            for patch in patches {
                patch(value);
            }
        }
    }

    /// Discards every patch scheduled for `key` without running it.
    /// Called when the provider for `key` fails, so the handles from the
    /// failed attempt stay empty instead of being filled by a later
    /// retry.
    pub(crate) fn abandon(&self, key: &BindingKey) {
        if let Some(patches) = self.table.lock().remove(key) {
            debug!(key = %key, count = patches.len(), "Abandoning placeholders");
        }
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, key: &BindingKey) -> bool {
        self.table.lock().contains_key(key)
    }
}

impl fmt::Debug for PendingPatches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingPatches")
            .field("slots", &self.table.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_handle() {
        let d = Deferred::ready(42i32);
        assert!(d.is_ready());
        assert_eq!(d.get(), Some(&42));
    }

    #[test]
    fn pending_handle_is_empty() {
        let d: Deferred<i32> = Deferred::pending();
        assert!(!d.is_ready());
        assert_eq!(d.get(), None);
    }

    #[test]
    fn clones_observe_the_same_fill() {
        let d: Deferred<Arc<String>> = Deferred::pending();
        let sibling = d.clone();

        let pending = PendingPatches::new();
        let key = BindingKey::of::<Arc<String>>();
        pending.register(key.clone(), d.patch_fn());

        let value = Arc::new(String::from("canonical"));
        let shared: Shared = Arc::new(Arc::clone(&value));
        pending.fulfil(&key, &shared);

        assert!(d.is_ready());
        assert!(sibling.is_ready());
        assert!(Arc::ptr_eq(d.get().unwrap(), &value));
        assert!(Arc::ptr_eq(sibling.get().unwrap(), d.get().unwrap()));
    }

    #[test]
    fn fulfil_drains_the_slot() {
        let pending = PendingPatches::new();
        let key = BindingKey::of::<i32>();

        let d: Deferred<i32> = Deferred::pending();
        pending.register(key.clone(), d.patch_fn());
        assert!(pending.is_pending(&key));

        let shared: Shared = Arc::new(7i32);
        pending.fulfil(&key, &shared);
        assert!(!pending.is_pending(&key));
        assert_eq!(d.get(), Some(&7));

        // Fulfilling again is a no-op.
        pending.fulfil(&key, &shared);
    }

    #[test]
    fn fulfil_multiple_patches() {
        let pending = PendingPatches::new();
        let key = BindingKey::of::<u8>();

        let handles: Vec<Deferred<u8>> = (0..3).map(|_| Deferred::pending()).collect();
        for handle in &handles {
            pending.register(key.clone(), handle.patch_fn());
        }

        let shared: Shared = Arc::new(9u8);
        pending.fulfil(&key, &shared);

        for handle in &handles {
            assert_eq!(handle.get(), Some(&9));
        }
    }

    #[test]
    fn wrong_typed_value_leaves_cell_empty() {
        let pending = PendingPatches::new();
        let key = BindingKey::of::<i32>();

        let d: Deferred<i32> = Deferred::pending();
        pending.register(key.clone(), d.patch_fn());

        let shared: Shared = Arc::new(String::from("not an i32"));
        pending.fulfil(&key, &shared);
        assert_eq!(d.get(), None);
    }

    #[test]
    fn abandon_discards_patches() {
        let pending = PendingPatches::new();
        let key = BindingKey::of::<i32>();

        let d: Deferred<i32> = Deferred::pending();
        pending.register(key.clone(), d.patch_fn());
        pending.abandon(&key);
        assert!(!pending.is_pending(&key));

        // A fulfil after the abandon reaches no handle.
        let shared: Shared = Arc::new(7i32);
        pending.fulfil(&key, &shared);
        assert_eq!(d.get(), None);
    }
}
