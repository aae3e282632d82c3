//! Status reducers: pure folds from lifecycle events into status slices.
//!
//! A [`StatusReducer`] owns exactly one store slice and a case table of
//! three event names derived from its type prefix. Delivering an event
//! whose type matches one of those names replaces the slice; any other
//! event leaves it untouched (the standard reducer identity law, which
//! the store exploits to keep the same shared handle and avoid waking
//! subscribers).
//!
//! Folds always replace the whole status record. A prepare arriving
//! after a failure drops the stale error fields instead of merging over
//! them.

use crate::event::{EventKind, EventTypes, RequestEvent, Role};
use crate::status::{Status, StatusCollection};

/// Construction-time status tracking configuration for one action.
///
/// Exactly one variant is active per action instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tracking {
    /// No status tracking; reads fail loudly.
    None,
    /// One singleton [`Status`] per action ("meta").
    Singleton,
    /// One [`StatusCollection`] keyed by this payload field ("metas").
    Keyed(String),
}

impl Tracking {
    /// The slice role this configuration owns, if any.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self {
            Self::None => None,
            Self::Singleton => Some(Role::Meta),
            Self::Keyed(_) => Some(Role::Metas),
        }
    }

    /// Whether any tracking was requested.
    #[must_use]
    pub const fn is_tracked(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// One slice of the store owned by a status reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusSlice {
    /// Singleton status.
    Meta(Status),
    /// Keyed status collection.
    Metas(StatusCollection),
}

impl StatusSlice {
    /// The singleton status, if this slice holds one.
    #[must_use]
    pub const fn as_meta(&self) -> Option<&Status> {
        match self {
            Self::Meta(status) => Some(status),
            Self::Metas(_) => None,
        }
    }

    /// The keyed collection, if this slice holds one.
    #[must_use]
    pub const fn as_metas(&self) -> Option<&StatusCollection> {
        match self {
            Self::Meta(_) => None,
            Self::Metas(collection) => Some(collection),
        }
    }

    /// The role this slice fills.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Meta(_) => Role::Meta,
            Self::Metas(_) => Role::Metas,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReducerMode {
    Singleton,
    Keyed(String),
}

/// A case-addressable reducer folding lifecycle events into one slice.
///
/// Pure: the fold depends only on the previous slice and the event, so
/// replaying the same event sequence from the same initial slice always
/// produces the same final slice.
#[derive(Debug, Clone)]
pub struct StatusReducer {
    slice_name: String,
    types: EventTypes,
    mode: ReducerMode,
}

impl StatusReducer {
    /// Reducer for a singleton status slice (`meta = true`).
    #[must_use]
    pub fn singleton(types: EventTypes) -> Self {
        let slice_name = types.slice_name(Role::Meta);
        Self { slice_name, types, mode: ReducerMode::Singleton }
    }

    /// Reducer for a keyed collection slice (`meta = <payload field>`).
    #[must_use]
    pub fn keyed(types: EventTypes, payload_field: impl Into<String>) -> Self {
        let slice_name = types.slice_name(Role::Metas);
        Self { slice_name, types, mode: ReducerMode::Keyed(payload_field.into()) }
    }

    /// Build the reducer matching a [`Tracking`] configuration.
    ///
    /// Returns `None` for [`Tracking::None`]: nothing to register.
    #[must_use]
    pub fn for_tracking(types: &EventTypes, tracking: &Tracking) -> Option<Self> {
        match tracking {
            Tracking::None => None,
            Tracking::Singleton => Some(Self::singleton(types.clone())),
            Tracking::Keyed(field) => Some(Self::keyed(types.clone(), field.clone())),
        }
    }

    /// The store key this reducer owns.
    #[must_use]
    pub fn slice_name(&self) -> &str {
        &self.slice_name
    }

    /// The case table of event names this reducer answers to.
    #[must_use]
    pub const fn types(&self) -> &EventTypes {
        &self.types
    }

    /// The slice value before any event has been folded.
    #[must_use]
    pub fn initial(&self) -> StatusSlice {
        match self.mode {
            ReducerMode::Singleton => StatusSlice::Meta(Status::unset()),
            ReducerMode::Keyed(_) => StatusSlice::Metas(StatusCollection::new()),
        }
    }

    /// Fold `event` into `previous`.
    ///
    /// Returns `None` when the event's type is not in this reducer's
    /// case table, meaning the slice is unchanged and the caller should
    /// keep the existing handle.
    #[must_use]
    pub fn reduce(&self, previous: &StatusSlice, event: &RequestEvent) -> Option<StatusSlice> {
        let kind = self.types.classify(&event.type_name)?;
        let status = self.fold_status(kind, event);

        let next = match &self.mode {
            ReducerMode::Singleton => StatusSlice::Meta(status),
            ReducerMode::Keyed(field) => {
                let key = event.entry_key(field);
                let collection = previous
                    .as_metas()
                    .cloned()
                    .unwrap_or_default()
                    .with_entry(key, status);
                StatusSlice::Metas(collection)
            }
        };

        Some(next)
    }

    fn fold_status(&self, kind: EventKind, event: &RequestEvent) -> Status {
        match kind {
            EventKind::Prepare => Status {
                action_type: self.types.prepare().to_owned(),
                loading: true,
                ..Status::unset()
            },
            EventKind::Success => Status {
                action_type: self.types.success().to_owned(),
                loading: false,
                ..Status::unset()
            },
            EventKind::Fail => Status {
                action_type: self.types.fail().to_owned(),
                loading: false,
                error_message: event.error_message.clone(),
                http_status: event.http_status,
                business_code: event.business_code.clone(),
            },
        }
    }
}
