//! Lifecycle event factories.
//!
//! Building the three events by hand in every test means re-deriving
//! the type names by hand in every test. [`LifecycleEvents`] binds a
//! factory to one [`EventTypes`] so fixtures read as what they are:
//! "the prepare event for this action, with this payload".

use reqstate_core::{BusinessCode, EventTypes, RequestEvent};
use serde_json::Value;

/// Factory for the three lifecycle events of one action.
#[derive(Debug, Clone)]
pub struct LifecycleEvents {
    types: EventTypes,
}

impl LifecycleEvents {
    /// Factory for the action identified by `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { types: EventTypes::from_prefix(prefix) }
    }

    /// Factory bound to already-derived names.
    #[must_use]
    pub const fn from_types(types: EventTypes) -> Self {
        Self { types }
    }

    /// The bound event names.
    #[must_use]
    pub const fn types(&self) -> &EventTypes {
        &self.types
    }

    /// Prepare event with an empty payload.
    #[must_use]
    pub fn prepare(&self) -> RequestEvent {
        RequestEvent::new(self.types.prepare())
    }

    /// Prepare event carrying `payload`.
    #[must_use]
    pub fn prepare_for(&self, payload: Value) -> RequestEvent {
        self.prepare().with_payload(payload)
    }

    /// Success event with an empty payload.
    #[must_use]
    pub fn success(&self) -> RequestEvent {
        RequestEvent::new(self.types.success())
    }

    /// Success event carrying `payload`.
    #[must_use]
    pub fn success_for(&self, payload: Value) -> RequestEvent {
        self.success().with_payload(payload)
    }

    /// Fail event with a message; chain the event's own builders for
    /// payload, HTTP status, and business code.
    #[must_use]
    pub fn fail(&self, message: impl Into<String>) -> RequestEvent {
        RequestEvent::new(self.types.fail()).with_error(message)
    }

    /// Fully populated fail event.
    #[must_use]
    pub fn fail_with(
        &self,
        payload: Value,
        message: impl Into<String>,
        http_status: u16,
        business_code: impl Into<BusinessCode>,
    ) -> RequestEvent {
        self.fail(message)
            .with_payload(payload)
            .with_http_status(http_status)
            .with_business_code(business_code)
    }
}
