//! The meta store: slice registry, synchronous dispatch, change
//! notification.
//!
//! The store holds one slice per tracked action, keyed by a name
//! derived from the action's type prefix and role (`"{prefix}@meta"` or
//! `"{prefix}@metas"`). Dispatch is synchronous: the event is folded
//! into every attached reducer's slice while holding the write lock, so
//! event delivery is serialized and no concurrent mutation of a slice
//! is possible.
//!
//! Subscribers observe a monotonically increasing revision through a
//! `tokio::sync::watch` channel. The revision advances only when a fold
//! actually changed a slice; unmatched events wake nobody.

use reqstate_core::{RequestEvent, StatusReducer, StatusSlice};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;

/// Handle to a meta store.
///
/// Cheap to clone; every clone observes and mutates the same slices.
/// Lifecycle actions take one of these at construction instead of
/// reaching for a process-wide global.
#[derive(Debug, Clone)]
pub struct MetaStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: RwLock<StoreState>,
    revision: watch::Sender<u64>,
}

#[derive(Debug, Default)]
struct StoreState {
    reducers: HashMap<String, StatusReducer>,
    slices: HashMap<String, Arc<StatusSlice>>,
}

impl MetaStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner { state: RwLock::new(StoreState::default()), revision }),
        }
    }

    /// Attach a status reducer, registering its case table.
    ///
    /// The slice itself is created lazily on the first matching event;
    /// until then reads observe the UNSTARTED default. Attaching a
    /// reducer under an already-registered slice name replaces the
    /// previous registration.
    pub fn attach(&self, reducer: StatusReducer) {
        let slice = reducer.slice_name().to_owned();
        let mut state = self.write();
        let replaced = state.reducers.insert(slice.clone(), reducer).is_some();
        let attached = state.reducers.len();
        drop(state);

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("meta_store.reducers.attached").set(attached as f64);
        tracing::debug!(slice = %slice, replaced, "attached status reducer");
    }

    /// Detach the reducer owning `slice_name` and drop its slice.
    ///
    /// Subsequently delivered events bearing the old case table's names
    /// no longer affect anything.
    pub fn detach(&self, slice_name: &str) {
        let mut state = self.write();
        let removed = state.reducers.remove(slice_name).is_some();
        state.slices.remove(slice_name);
        let attached = state.reducers.len();
        drop(state);

        if removed {
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!("meta_store.reducers.attached").set(attached as f64);
            tracing::debug!(slice = %slice_name, "detached status reducer");
        }
    }

    /// Whether a reducer is registered under `slice_name`.
    #[must_use]
    pub fn is_attached(&self, slice_name: &str) -> bool {
        self.read().reducers.contains_key(slice_name)
    }

    /// Deliver `event` to every attached reducer.
    ///
    /// Each reducer whose case table matches the event's type folds it
    /// into its slice; everyone else keeps their existing handle.
    /// Returns whether any slice changed. The revision advances (waking
    /// subscribers) only in that case.
    pub fn dispatch(&self, event: &RequestEvent) -> bool {
        metrics::counter!("meta_store.events.dispatched").increment(1);

        let mut state = self.write();
        let mut updates = Vec::new();
        for (name, reducer) in &state.reducers {
            let previous = state.slices.get(name).map_or_else(
                || Arc::new(reducer.initial()),
                Arc::clone,
            );
            if let Some(next) = reducer.reduce(&previous, event) {
                updates.push((name.clone(), Arc::new(next)));
            }
        }

        let changed = !updates.is_empty();
        for (name, slice) in updates {
            tracing::debug!(slice = %name, event_type = %event.type_name, "slice updated");
            metrics::counter!("meta_store.slices.updated").increment(1);
            state.slices.insert(name, slice);
        }
        drop(state);

        if changed {
            self.inner.revision.send_modify(|revision| *revision += 1);
        } else {
            tracing::trace!(event_type = %event.type_name, "event matched no reducer");
        }

        changed
    }

    /// Snapshot read of the slice stored under `name`.
    ///
    /// `None` means the reducer has not folded any event yet (or was
    /// never attached); callers substitute the UNSTARTED default or
    /// raise, depending on their read mode.
    #[must_use]
    pub fn slice(&self, name: &str) -> Option<Arc<StatusSlice>> {
        self.read().slices.get(name).map(Arc::clone)
    }

    /// Current change revision.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Subscribe to change notifications.
    ///
    /// The receiver resolves once per revision advance; consumers
    /// re-project the slice they care about after each wakeup.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MetaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use reqstate_core::EventTypes;

    fn store_with_singleton(prefix: &str) -> MetaStore {
        let store = MetaStore::new();
        store.attach(StatusReducer::singleton(EventTypes::from_prefix(prefix)));
        store
    }

    #[test]
    fn slice_is_absent_until_first_matching_event() {
        let store = store_with_singleton("fetchUser");
        assert!(store.is_attached("fetchUser@meta"));
        assert!(store.slice("fetchUser@meta").is_none());

        assert!(store.dispatch(&RequestEvent::new("fetchUser prepare")));
        let slice = store.slice("fetchUser@meta").unwrap();
        assert!(slice.as_meta().unwrap().loading);
    }

    #[test]
    fn unmatched_event_changes_nothing() {
        let store = store_with_singleton("fetchUser");
        store.dispatch(&RequestEvent::new("fetchUser prepare"));
        let before = store.slice("fetchUser@meta").unwrap();
        let revision = store.revision();

        assert!(!store.dispatch(&RequestEvent::new("fetchOrders")));
        let after = store.slice("fetchUser@meta").unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn revision_advances_once_per_changing_event() {
        let store = store_with_singleton("fetchUser");
        let base = store.revision();
        store.dispatch(&RequestEvent::new("fetchUser prepare"));
        store.dispatch(&RequestEvent::new("fetchUser"));
        assert_eq!(store.revision(), base + 2);
    }

    #[test]
    fn detach_stops_folding() {
        let store = store_with_singleton("fetchUser");
        store.detach("fetchUser@meta");
        assert!(!store.dispatch(&RequestEvent::new("fetchUser prepare")));
        assert!(store.slice("fetchUser@meta").is_none());
    }

    #[test]
    fn two_reducers_fold_independently() {
        let store = store_with_singleton("fetchUser");
        store.attach(StatusReducer::singleton(EventTypes::from_prefix("fetchOrders")));

        store.dispatch(&RequestEvent::new("fetchOrders prepare"));
        assert!(store.slice("fetchUser@meta").is_none());
        assert!(
            store
                .slice("fetchOrders@meta")
                .unwrap()
                .as_meta()
                .unwrap()
                .loading
        );
    }
}
