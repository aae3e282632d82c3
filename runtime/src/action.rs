//! Lifecycle actions: one object per logical request action.
//!
//! A [`RequestAction`] orchestrates the dispatch of the underlying
//! request. It derives the three event type names from its type prefix,
//! stamps them onto the descriptor produced by the application's
//! request builder, and hands the result to the transport runner. It
//! never inspects the handle the runner returns; that is the caller's
//! business.
//!
//! Depending on its [`Tracking`] configuration the action registers
//! zero or one status reducers with the store at construction time. The
//! read accessors over that slice live in the `accessor` module.

use crate::store::MetaStore;
use reqstate_core::{
    EventTypes, RequestDescriptor, StatusReducer, Tracking,
};
use std::sync::{Mutex, PoisonError, RwLock};

type RequestFn<Args> = Box<dyn Fn(Args) -> RequestDescriptor + Send + Sync>;
type RunFn<Handle> = Box<dyn Fn(RequestDescriptor) -> Handle + Send + Sync>;
type ClearThrottleFn = Box<dyn Fn(&str) + Send + Sync>;

/// Subscriber descriptor for external effect pipelines.
///
/// Produced by [`RequestAction::on_prepare`] and friends; collected and
/// executed elsewhere. The action neither runs nor inspects the effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSubscriber<F> {
    /// Event type name the effect should fire on.
    pub when: String,
    /// The effect itself, opaque to this crate.
    pub effect: F,
}

/// Orchestrator for one logical request action.
///
/// # Type Parameters
///
/// - `Args`: arguments the caller invokes the action with; forwarded to
///   the request builder
/// - `Handle`: whatever the transport runner returns for an in-flight
///   operation; passed through unchanged
///
/// # Example
///
/// ```ignore
/// let fetch_user = RequestAction::new(
///     store.clone(),
///     "user fetchUser",
///     |user_id: u64| RequestDescriptor::new(json!({ "userId": user_id })),
///     |descriptor| transport.run(descriptor),
/// )
/// .with_tracking(Tracking::Singleton);
///
/// let handle = fetch_user.call(42);
/// ```
pub struct RequestAction<Args, Handle> {
    pub(crate) store: MetaStore,
    pub(crate) types: RwLock<EventTypes>,
    pub(crate) tracking: Tracking,
    pub(crate) require_registered: bool,
    pub(crate) loadings_cache: Mutex<Option<crate::accessor::LoadingsCache>>,
    request: RequestFn<Args>,
    run: RunFn<Handle>,
    clear_throttle: ClearThrottleFn,
}

impl<Args, Handle> RequestAction<Args, Handle> {
    /// Create an action with no status tracking.
    ///
    /// # Arguments
    ///
    /// - `store`: the store this action's reducer (if any) registers with
    /// - `prefix`: stable string identity of this logical action
    /// - `request`: builds the request descriptor from call arguments
    /// - `run`: executes the stamped descriptor, returning a handle
    #[must_use]
    pub fn new(
        store: MetaStore,
        prefix: impl Into<String>,
        request: impl Fn(Args) -> RequestDescriptor + Send + Sync + 'static,
        run: impl Fn(RequestDescriptor) -> Handle + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            types: RwLock::new(EventTypes::from_prefix(prefix)),
            tracking: Tracking::None,
            require_registered: false,
            loadings_cache: Mutex::new(None),
            request: Box::new(request),
            run: Box::new(run),
            clear_throttle: Box::new(|_| {}),
        }
    }

    /// Configure status tracking and register the matching reducer.
    #[must_use]
    pub fn with_tracking(mut self, tracking: Tracking) -> Self {
        self.tracking = tracking;
        self.register();
        self
    }

    /// Supply the externally owned throttle-clearing function.
    ///
    /// The action's only involvement is selecting the key: the function
    /// is always called with the success type name.
    #[must_use]
    pub fn with_clear_throttle(mut self, clear: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.clear_throttle = Box::new(clear);
        self
    }

    /// Opt into must-be-registered read semantics.
    ///
    /// With this set, a read that finds no slice in the store raises
    /// [`reqstate_core::ReadError::SliceMissing`] instead of returning
    /// the default status. Use it when silent defaults would mask a
    /// store that was never wired up.
    #[must_use]
    pub fn require_registered(mut self) -> Self {
        self.require_registered = true;
        self
    }

    /// Invoke the action.
    ///
    /// Builds the descriptor, stamps it with the three derived event
    /// names, and hands it to the transport runner. The returned handle
    /// is passed through unchanged. Errors or panics from the builder
    /// and runner propagate to the caller; failure only becomes state
    /// once the transport emits a fail event.
    pub fn call(&self, args: Args) -> Handle {
        let descriptor = (self.request)(args).stamp(self.types());
        (self.run)(descriptor)
    }

    /// Subscriber descriptor firing on the prepare event.
    pub fn on_prepare<F>(&self, effect: F) -> RequestSubscriber<F> {
        RequestSubscriber { when: self.get_prepare_type(), effect }
    }

    /// Subscriber descriptor firing on the success event.
    pub fn on_success<F>(&self, effect: F) -> RequestSubscriber<F> {
        RequestSubscriber { when: self.types().success().to_owned(), effect }
    }

    /// Subscriber descriptor firing on the fail event.
    pub fn on_fail<F>(&self, effect: F) -> RequestSubscriber<F> {
        RequestSubscriber { when: self.get_fail_type(), effect }
    }

    /// The derived prepare event name.
    #[must_use]
    pub fn get_prepare_type(&self) -> String {
        self.read_types().prepare().to_owned()
    }

    /// The derived fail event name.
    ///
    /// The success name is the type prefix itself and needs no getter.
    #[must_use]
    pub fn get_fail_type(&self) -> String {
        self.read_types().fail().to_owned()
    }

    /// The current type prefix.
    #[must_use]
    pub fn type_prefix(&self) -> String {
        self.read_types().prefix().to_owned()
    }

    /// Clear any transport-level throttle cache for this action.
    ///
    /// Delegates to the supplied function, keyed by the success type.
    pub fn clear_throttle(&self) {
        (self.clear_throttle)(self.read_types().success());
    }

    /// Reassign the type prefix (instance rename).
    ///
    /// Recomputes the three derived event names and re-registers the
    /// reducer's case table. Events bearing the old names no longer
    /// affect the slice afterwards; the slice itself starts over from
    /// UNSTARTED under the new name.
    pub fn set_type_prefix(&self, prefix: impl Into<String>) {
        let next = EventTypes::from_prefix(prefix);
        let mut guard = self.write_types();
        if let Some(role) = self.tracking.role() {
            self.store.detach(&guard.slice_name(role));
        }
        tracing::debug!(
            from = %guard.prefix(),
            to = %next.prefix(),
            "type prefix reassigned"
        );
        *guard = next;
        drop(guard);

        self.invalidate_loadings_cache();
        self.register();
    }

    /// Snapshot of the derived event names.
    #[must_use]
    pub fn types(&self) -> EventTypes {
        self.read_types().clone()
    }

    fn register(&self) {
        let types = self.read_types().clone();
        if let Some(reducer) = StatusReducer::for_tracking(&types, &self.tracking) {
            self.store.attach(reducer);
        }
    }

    fn invalidate_loadings_cache(&self) {
        *self
            .loadings_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(crate) fn read_types(&self) -> std::sync::RwLockReadGuard<'_, EventTypes> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_types(&self) -> std::sync::RwLockWriteGuard<'_, EventTypes> {
        self.types.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<Args, Handle> std::fmt::Debug for RequestAction<Args, Handle> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAction")
            .field("prefix", &self.read_types().prefix())
            .field("tracking", &self.tracking)
            .field("require_registered", &self.require_registered)
            .finish_non_exhaustive()
    }
}
