//! Pending registry
//!
//! Holds the deferred computations created during one render pass. Every
//! pass gets its own registry; it is made visible to wrapped helpers only
//! while the synchronous engine render runs, through a task-local key.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use serde_json::Value;

use crate::placeholder::PlaceholderId;

/// A not-yet-resolved helper result
pub type DeferredValue = BoxFuture<'static, anyhow::Result<Value>>;

/// One deferred helper invocation waiting to be resolved
pub struct PendingEntry {
    pub id: PlaceholderId,
    pub computation: DeferredValue,
}

impl std::fmt::Debug for PendingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEntry")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

tokio::task_local! {
    static ACTIVE_PASS: Arc<PendingRegistry>;
}

/// Deferred computations of a single render pass, in insertion order.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: Mutex<Vec<PendingEntry>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a computation under a fresh id and return that id.
    ///
    /// Ids are random v4 UUIDs; a clash with a live entry is still checked so
    /// two pending entries never share a token.
    pub fn insert(&self, computation: DeferredValue) -> PlaceholderId {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut id = PlaceholderId::new();
        while entries.iter().any(|e| e.id == id) {
            id = PlaceholderId::new();
        }
        entries.push(PendingEntry { id, computation });
        id
    }

    /// Remove and return every entry, oldest first.
    pub fn drain(&self) -> Vec<PendingEntry> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *entries)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` with `registry` as the active pass.
    ///
    /// `f` must be synchronous: the registry is visible to helpers only until
    /// `f` returns.
    pub fn enter<R>(registry: &Arc<PendingRegistry>, f: impl FnOnce() -> R) -> R {
        ACTIVE_PASS.sync_scope(Arc::clone(registry), f)
    }

    /// Defer `computation` into the active pass, if there is one.
    ///
    /// Returns the computation back when no pass is active.
    pub fn defer(computation: DeferredValue) -> Result<PlaceholderId, DeferredValue> {
        match ACTIVE_PASS.try_with(Arc::clone) {
            Ok(registry) => Ok(registry.insert(computation)),
            Err(_) => Err(computation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn ready(v: &str) -> DeferredValue {
        let v = Value::String(v.to_string());
        async move { Ok(v) }.boxed()
    }

    #[test]
    fn test_insert_and_drain_in_order() {
        let registry = PendingRegistry::new();
        let a = registry.insert(ready("a"));
        let b = registry.insert(ready("b"));
        assert_eq!(registry.len(), 2);

        let drained = registry.drain();
        assert_eq!(drained.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a, b]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_defer_outside_pass_hands_back() {
        assert!(PendingRegistry::defer(ready("x")).is_err());
    }

    #[test]
    fn test_defer_inside_pass() {
        let registry = Arc::new(PendingRegistry::new());
        let Ok(id) = PendingRegistry::enter(&registry, || PendingRegistry::defer(ready("x"))) else {
            panic!("no active pass");
        };
        let drained = registry.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id, id);
    }

    #[test]
    fn test_nested_passes_are_separate() {
        let outer = Arc::new(PendingRegistry::new());
        let inner = Arc::new(PendingRegistry::new());

        PendingRegistry::enter(&outer, || {
            assert!(PendingRegistry::defer(ready("outer")).is_ok());
            PendingRegistry::enter(&inner, || {
                assert!(PendingRegistry::defer(ready("inner")).is_ok());
            });
            assert!(PendingRegistry::defer(ready("outer again")).is_ok());
        });

        assert_eq!(outer.len(), 2);
        assert_eq!(inner.len(), 1);
    }
}
