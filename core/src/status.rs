//! Status records: the per-action and per-entity lifecycle state.
//!
//! A [`Status`] describes the outcome of the most recent invocation of one
//! logical request action. A [`StatusCollection`] holds one `Status` per
//! entity key for actions that are invoked across many entities (for
//! example one fetch-by-id action shared across table rows).
//!
//! Collections are updated immutably: [`StatusCollection::with_entry`]
//! produces a new collection that shares every untouched entry with its
//! predecessor, so consumers can rely on reference identity to detect
//! change.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Business-level result code reported by a failed request.
///
/// Upstream services report either a string code (`"E_TIMEOUT"`) or a
/// numeric one (`4001`); both are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BusinessCode {
    /// String-valued code
    Text(String),
    /// Numeric code
    Number(i64),
}

impl From<&str> for BusinessCode {
    fn from(code: &str) -> Self {
        Self::Text(code.to_owned())
    }
}

impl From<i64> for BusinessCode {
    fn from(code: i64) -> Self {
        Self::Number(code)
    }
}

/// Lifecycle state of the most recent invocation of a request action.
///
/// # Invariants
///
/// - `loading` is `true` iff `action_type` is the prepare event name
/// - the error fields are `Some` only when `action_type` is the fail
///   event name
///
/// Reads never observe a half-built record: every lifecycle event
/// replaces the whole status, it never merges into the previous one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Status {
    /// Name of the lifecycle event that produced this state.
    ///
    /// Empty for the caller-visible default (action never invoked).
    pub action_type: String,

    /// Whether an invocation is currently in flight.
    pub loading: bool,

    /// Human-readable failure description, fail events only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// HTTP status code of the failed response, if the transport had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    /// Business-level result code of the failed response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_code: Option<BusinessCode>,
}

impl Status {
    /// The caller-visible default: action never invoked.
    ///
    /// Reads resolve to this value (not to an absent entry) whenever the
    /// reducer has not produced data yet.
    #[must_use]
    pub const fn unset() -> Self {
        Self {
            action_type: String::new(),
            loading: false,
            error_message: None,
            http_status: None,
            business_code: None,
        }
    }

    /// Whether this is the never-invoked default.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.action_type.is_empty() && !self.loading
    }

    /// Whether the most recent invocation failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        !self.loading && self.error_message.is_some()
    }
}

/// A keyed collection of [`Status`] records ("metas").
///
/// Keys are derived from a designated field of the request payload.
/// A missing key means "never invoked" and picks as [`Status::unset`].
#[derive(Debug, Clone, Default)]
pub struct StatusCollection {
    entries: HashMap<String, Arc<Status>>,
}

impl StatusCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the status stored at `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Status> {
        self.entries.get(key).map(Arc::as_ref)
    }

    /// Look up the status stored at `key`, falling back to the default.
    ///
    /// Never returns an absent marker: a key that was never folded picks
    /// as [`Status::unset`].
    #[must_use]
    pub fn pick(&self, key: &str) -> Status {
        self.get(key).cloned().unwrap_or_else(Status::unset)
    }

    /// Shorthand for `pick(key).loading`.
    #[must_use]
    pub fn loading(&self, key: &str) -> bool {
        self.get(key).is_some_and(|status| status.loading)
    }

    /// Produce a new collection with `key` replaced by `status`.
    ///
    /// Every other entry is shared with `self` (the `Arc`s are cloned,
    /// the statuses behind them are not).
    #[must_use]
    pub fn with_entry(&self, key: impl Into<String>, status: Status) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(key.into(), Arc::new(status));
        Self { entries }
    }

    /// Number of keys that have been folded at least once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key has been folded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the stored entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Status)> {
        self.entries
            .iter()
            .map(|(key, status)| (key.as_str(), status.as_ref()))
    }

    /// Shared handle to the entry at `key`, used to verify structural
    /// sharing across immutable updates.
    #[must_use]
    pub fn entry_handle(&self, key: &str) -> Option<Arc<Status>> {
        self.entries.get(key).map(Arc::clone)
    }
}

impl PartialEq for StatusCollection {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, status)| other.get(key) == Some(status.as_ref()))
    }
}

/// Derived projection of a [`StatusCollection`] to `key -> loading`.
///
/// The view is cheap to build but consumers compare it by reference to
/// skip re-evaluation, so the runtime memoizes it per collection handle
/// (see the read accessors in the runtime crate).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingView {
    flags: HashMap<String, bool>,
}

impl LoadingView {
    /// Project `collection` into its loading flags.
    #[must_use]
    pub fn of(collection: &StatusCollection) -> Self {
        let flags = collection
            .iter()
            .map(|(key, status)| (key.to_owned(), status.loading))
            .collect();
        Self { flags }
    }

    /// Loading flag for `key`; a never-invoked key is not loading.
    #[must_use]
    pub fn get(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    /// Number of keys in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the view has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Iterate over `(key, loading)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(key, flag)| (key.as_str(), *flag))
    }
}
