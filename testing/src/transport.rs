//! A transport double that records dispatched requests.
//!
//! The real transport executes descriptors and emits lifecycle events
//! when the network settles. [`RecordingTransport`] captures every
//! stamped descriptor instead and lets the test decide when (and how)
//! each request settles, replaying the matching events into the bound
//! store.

use reqstate_core::{RequestDescriptor, RequestEvent};
use reqstate_runtime::MetaStore;
use std::sync::{Arc, Mutex, PoisonError};

/// Transport double: captures descriptors, replays lifecycle events.
///
/// Cheap to clone; all clones share the captured requests.
///
/// # Example
///
/// ```ignore
/// let transport = RecordingTransport::new(store.clone());
/// let action = RequestAction::new(store, "fetchUser", builder, transport.runner())
///     .with_tracking(Tracking::Singleton);
///
/// action.call(42);
/// transport.begin_last();        // prepare
/// assert!(action.loading()?);
/// transport.resolve_last();      // success
/// assert!(!action.loading()?);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    store: MetaStore,
    sent: Mutex<Vec<RequestDescriptor>>,
}

impl RecordingTransport {
    /// Transport double bound to `store`.
    #[must_use]
    pub fn new(store: MetaStore) -> Self {
        Self {
            inner: Arc::new(Inner { store, sent: Mutex::new(Vec::new()) }),
        }
    }

    /// The dispatch function to hand to a `RequestAction`.
    ///
    /// Records each stamped descriptor and returns it unchanged as the
    /// opaque in-flight handle.
    #[must_use]
    pub fn runner(
        &self,
    ) -> impl Fn(RequestDescriptor) -> RequestDescriptor + Send + Sync + 'static {
        let transport = self.clone();
        move |descriptor| {
            transport.record(descriptor.clone());
            descriptor
        }
    }

    /// All captured descriptors, in dispatch order.
    #[must_use]
    pub fn sent(&self) -> Vec<RequestDescriptor> {
        self.lock().clone()
    }

    /// The most recently captured descriptor.
    #[must_use]
    pub fn last(&self) -> Option<RequestDescriptor> {
        self.lock().last().cloned()
    }

    /// Replay the prepare event for the most recent request.
    ///
    /// # Panics
    ///
    /// Panics if no stamped request was captured.
    #[allow(clippy::panic)] // Test double fails loudly
    pub fn begin_last(&self) {
        let (types, payload) = self.last_stamped();
        let event = RequestEvent::new(types.prepare()).with_payload(payload);
        self.inner.store.dispatch(&event);
    }

    /// Replay the success event for the most recent request.
    ///
    /// # Panics
    ///
    /// Panics if no stamped request was captured.
    #[allow(clippy::panic)] // Test double fails loudly
    pub fn resolve_last(&self) {
        let (types, payload) = self.last_stamped();
        let event = RequestEvent::new(types.success()).with_payload(payload);
        self.inner.store.dispatch(&event);
    }

    /// Replay the fail event for the most recent request.
    ///
    /// # Panics
    ///
    /// Panics if no stamped request was captured.
    #[allow(clippy::panic)] // Test double fails loudly
    pub fn reject_last(&self, message: impl Into<String>, http_status: Option<u16>) {
        let (types, payload) = self.last_stamped();
        let mut event = RequestEvent::new(types.fail())
            .with_payload(payload)
            .with_error(message);
        if let Some(status) = http_status {
            event = event.with_http_status(status);
        }
        self.inner.store.dispatch(&event);
    }

    fn record(&self, descriptor: RequestDescriptor) {
        self.lock().push(descriptor);
    }

    #[allow(clippy::panic)] // Test double fails loudly
    fn last_stamped(&self) -> (reqstate_core::EventTypes, serde_json::Value) {
        let Some(descriptor) = self.last() else {
            panic!("RecordingTransport: no request captured yet");
        };
        let Some(types) = descriptor.types else {
            panic!("RecordingTransport: captured descriptor was never stamped");
        };
        (types, descriptor.payload)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RequestDescriptor>> {
        self.inner.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
