//! Lifecycle event model.
//!
//! One logical request action expands into three dispatchable events,
//! all derived from a shared *type prefix*:
//!
//! - prepare: `"{prefix} prepare"` — the request left the building
//! - success: `"{prefix}"` — the base type itself
//! - fail: `"{prefix} fail"` — the request came back broken
//!
//! Inside the crate the three kinds are a tagged union ([`EventKind`]);
//! free-form strings appear only at the wire boundary where events are
//! matched by type name.

use crate::status::BusinessCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const PREPARE_SUFFIX: &str = " prepare";
const FAIL_SUFFIX: &str = " fail";

/// The three lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Request dispatched, response pending.
    Prepare,
    /// Response arrived and was accepted.
    Success,
    /// Response arrived and was rejected, or transport failed.
    Fail,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => write!(f, "prepare"),
            Self::Success => write!(f, "success"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Role of a tracked slice within the store.
///
/// Each tracked action owns exactly one store entry, named after its
/// type prefix and one of these roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Singleton status ("meta").
    Meta,
    /// Keyed status collection ("metas").
    Metas,
}

impl Role {
    /// Stable name used when deriving slice names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Metas => "metas",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three derived event type names for one logical action.
///
/// Derived once from a type prefix; re-derived wholesale when the prefix
/// changes (instance rename), never patched piecemeal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypes {
    prefix: String,
    prepare: String,
    fail: String,
}

impl EventTypes {
    /// Derive the three event names from `prefix`.
    #[must_use]
    pub fn from_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prepare = format!("{prefix}{PREPARE_SUFFIX}");
        let fail = format!("{prefix}{FAIL_SUFFIX}");
        Self { prefix, prepare, fail }
    }

    /// The shared type prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The prepare event name.
    #[must_use]
    pub fn prepare(&self) -> &str {
        &self.prepare
    }

    /// The success event name (the base type itself).
    #[must_use]
    pub fn success(&self) -> &str {
        &self.prefix
    }

    /// The fail event name.
    #[must_use]
    pub fn fail(&self) -> &str {
        &self.fail
    }

    /// The event name for `kind`.
    #[must_use]
    pub fn name_of(&self, kind: EventKind) -> &str {
        match kind {
            EventKind::Prepare => self.prepare(),
            EventKind::Success => self.success(),
            EventKind::Fail => self.fail(),
        }
    }

    /// Match a wire type name against the three derived names.
    ///
    /// Returns `None` for any unrelated event; reducers treat that as
    /// "not mine, leave the slice alone".
    #[must_use]
    pub fn classify(&self, type_name: &str) -> Option<EventKind> {
        if type_name == self.prepare {
            Some(EventKind::Prepare)
        } else if type_name == self.prefix {
            Some(EventKind::Success)
        } else if type_name == self.fail {
            Some(EventKind::Fail)
        } else {
            None
        }
    }

    /// Name of the store slice owned by this action for `role`.
    #[must_use]
    pub fn slice_name(&self, role: Role) -> String {
        format!("{}@{}", self.prefix, role)
    }
}

/// A lifecycle event as delivered by the store's dispatch mechanism.
///
/// The transport emits one prepare event when the request goes out and
/// exactly one success or fail event when it settles. Error fields are
/// populated on fail events only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    /// Wire type name; matched against reducers' case tables.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Request payload; opaque except for the designated entry-key field
    /// in keyed tracking mode.
    #[serde(default)]
    pub payload: Value,

    /// Failure description, fail events only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// HTTP status of the failed response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    /// Business code of the failed response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_code: Option<BusinessCode>,
}

impl RequestEvent {
    /// Create an event with an empty payload.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Value::Null,
            error_message: None,
            http_status: None,
            business_code: None,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attach a failure description.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Attach the HTTP status of the failed response.
    #[must_use]
    pub const fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attach the business code of the failed response.
    #[must_use]
    pub fn with_business_code(mut self, code: impl Into<BusinessCode>) -> Self {
        self.business_code = Some(code.into());
        self
    }

    /// Extract the collection entry key from the designated payload field.
    ///
    /// Strings pass through, numbers and booleans are stringified. A
    /// missing or null field maps to the empty string so the fold still
    /// produces a deterministic entry instead of dropping the update.
    #[must_use]
    pub fn entry_key(&self, field: &str) -> String {
        match self.payload.get(field) {
            Some(Value::String(key)) => key.clone(),
            Some(Value::Number(key)) => key.to_string(),
            Some(Value::Bool(key)) => key.to_string(),
            Some(Value::Null | Value::Array(_) | Value::Object(_)) | None => String::new(),
        }
    }
}

/// The request descriptor handed to the transport.
///
/// Built by the application's request-builder function; the lifecycle
/// action stamps it with the three derived event names before handing
/// it to the dispatch function. Everything else on it is opaque to this
/// crate.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Request payload, forwarded verbatim onto the lifecycle events.
    pub payload: Value,

    /// The three event names the transport must emit; stamped by the
    /// lifecycle action, `None` until then.
    pub types: Option<EventTypes>,
}

impl RequestDescriptor {
    /// Create a descriptor carrying `payload`.
    #[must_use]
    pub const fn new(payload: Value) -> Self {
        Self { payload, types: None }
    }

    /// Stamp the descriptor with the derived event names.
    #[must_use]
    pub fn stamp(mut self, types: EventTypes) -> Self {
        self.types = Some(types);
        self
    }
}
