//! Read accessors: projecting the current slice for consumption.
//!
//! Two access modes share one set of projection rules:
//!
//! - *point-in-time* reads (`meta`, `metas`, `loading`, `loadings`,
//!   and the per-key variants) read the current store snapshot directly
//! - *subscribed* reads ([`MetaWatcher`]) re-project after every store
//!   change, for consumers that render from a subscription
//!
//! Both resolve absent slices to the UNSTARTED default unless the
//! action opted into must-be-registered semantics, and both fail with
//! [`ReadError::NotRegistered`] when tracking was never configured —
//! a silent default there would hide a programming error.
//!
//! The loadings view is memoized per slice handle: two reads against an
//! unchanged collection return the exact same `Arc`, so a
//! subscription-based consumer comparing by reference sees no spurious
//! change.

use crate::action::RequestAction;
use reqstate_core::{
    LoadingView, ReadError, Role, Status, StatusCollection, StatusSlice, Tracking,
};
use std::sync::{Arc, PoisonError};
use tokio::sync::watch;

/// Memo pair for the derived loadings view.
///
/// `source` is the slice handle the view was computed from; comparing
/// handles by pointer identity decides whether the cached view is still
/// current. `None` stands for the not-yet-present slice, so repeated
/// UNSTARTED reads share one empty view too.
#[derive(Debug)]
pub(crate) struct LoadingsCache {
    source: Option<Arc<StatusSlice>>,
    view: Arc<LoadingView>,
}

impl<Args, Handle> RequestAction<Args, Handle> {
    /// Current singleton status.
    ///
    /// # Errors
    ///
    /// - [`ReadError::NotRegistered`] when tracking was never configured
    /// - [`ReadError::TrackingMismatch`] when this action tracks a keyed
    ///   collection
    /// - [`ReadError::SliceMissing`] when the slice is absent under
    ///   must-be-registered semantics
    pub fn meta(&self) -> Result<Status, ReadError> {
        let slice = self.tracked_slice(Role::Meta)?;
        Ok(slice
            .as_deref()
            .and_then(StatusSlice::as_meta)
            .cloned()
            .unwrap_or_else(Status::unset))
    }

    /// Shorthand for `meta().loading`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::meta`].
    pub fn loading(&self) -> Result<bool, ReadError> {
        self.meta().map(|status| status.loading)
    }

    /// Current keyed status collection.
    ///
    /// # Errors
    ///
    /// - [`ReadError::NotRegistered`] when tracking was never configured
    /// - [`ReadError::TrackingMismatch`] when this action tracks a
    ///   singleton status
    /// - [`ReadError::SliceMissing`] when the slice is absent under
    ///   must-be-registered semantics
    pub fn metas(&self) -> Result<StatusCollection, ReadError> {
        let slice = self.tracked_slice(Role::Metas)?;
        Ok(slice
            .as_deref()
            .and_then(StatusSlice::as_metas)
            .cloned()
            .unwrap_or_default())
    }

    /// Status of one collection entry, defaulting when never invoked.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::metas`].
    pub fn meta_of(&self, key: &str) -> Result<Status, ReadError> {
        self.metas().map(|collection| collection.pick(key))
    }

    /// Loading flag of one collection entry.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::metas`].
    pub fn loading_of(&self, key: &str) -> Result<bool, ReadError> {
        self.meta_of(key).map(|status| status.loading)
    }

    /// The derived loadings view, memoized per slice handle.
    ///
    /// Two consecutive calls against an unchanged collection return the
    /// same `Arc<LoadingView>`; after any event changes the collection,
    /// the next call returns a new one reflecting the update.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::metas`].
    pub fn loadings(&self) -> Result<Arc<LoadingView>, ReadError> {
        let slice = self.tracked_slice(Role::Metas)?;

        let mut cache = self
            .loadings_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = cache.as_ref() {
            if same_source(cached.source.as_ref(), slice.as_ref()) {
                return Ok(Arc::clone(&cached.view));
            }
        }

        let view = Arc::new(
            slice
                .as_deref()
                .and_then(StatusSlice::as_metas)
                .map(LoadingView::of)
                .unwrap_or_default(),
        );
        *cache = Some(LoadingsCache { source: slice, view: Arc::clone(&view) });
        Ok(view)
    }

    /// Subscribed read handle over this action's slice.
    #[must_use]
    pub fn watch(&self) -> MetaWatcher<'_, Args, Handle> {
        MetaWatcher { action: self, receiver: self.store.subscribe() }
    }

    /// Fetch the slice for `expected`, enforcing the read-mode policy.
    fn tracked_slice(&self, expected: Role) -> Result<Option<Arc<StatusSlice>>, ReadError> {
        let types = self.read_types();
        let actual = match self.tracking {
            Tracking::None => {
                return Err(ReadError::NotRegistered { prefix: types.prefix().to_owned() });
            }
            Tracking::Singleton => Role::Meta,
            Tracking::Keyed(_) => Role::Metas,
        };
        if actual != expected {
            return Err(ReadError::TrackingMismatch {
                prefix: types.prefix().to_owned(),
                expected,
                actual,
            });
        }

        let name = types.slice_name(expected);
        drop(types);

        match self.store.slice(&name) {
            Some(slice) => Ok(Some(slice)),
            None if self.require_registered => Err(ReadError::SliceMissing { slice: name }),
            None => Ok(None),
        }
    }
}

fn same_source(cached: Option<&Arc<StatusSlice>>, current: Option<&Arc<StatusSlice>>) -> bool {
    match (cached, current) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Subscribed read handle bound to one action.
///
/// Each `next_*` call waits for the store to change, then returns the
/// corresponding point-in-time projection, so both access modes agree
/// on semantics by construction.
#[derive(Debug)]
pub struct MetaWatcher<'a, Args, Handle> {
    action: &'a RequestAction<Args, Handle>,
    receiver: watch::Receiver<u64>,
}

impl<Args, Handle> MetaWatcher<'_, Args, Handle> {
    /// Wait until the store applies a change this watcher has not seen.
    ///
    /// Resolves immediately if a change happened since the previous
    /// call. A dispatch that changes no slice wakes nobody.
    pub async fn changed(&mut self) {
        // The sender lives inside the store held by the borrowed action,
        // so the channel cannot close while this watcher exists.
        let _ = self.receiver.changed().await;
    }

    /// Wait for a change, then project the singleton status.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RequestAction::meta`].
    pub async fn next_meta(&mut self) -> Result<Status, ReadError> {
        self.changed().await;
        self.action.meta()
    }

    /// Wait for a change, then project the loading flag.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RequestAction::loading`].
    pub async fn next_loading(&mut self) -> Result<bool, ReadError> {
        self.changed().await;
        self.action.loading()
    }

    /// Wait for a change, then project one collection entry.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RequestAction::meta_of`].
    pub async fn next_meta_of(&mut self, key: &str) -> Result<Status, ReadError> {
        self.changed().await;
        self.action.meta_of(key)
    }

    /// Wait for a change, then project the memoized loadings view.
    ///
    /// # Errors
    ///
    /// Same conditions as [`RequestAction::loadings`].
    pub async fn next_loadings(&mut self) -> Result<Arc<LoadingView>, ReadError> {
        self.changed().await;
        self.action.loadings()
    }
}
