//! # Reqstate Runtime
//!
//! Runtime half of the reqstate architecture: the store that owns the
//! status slices, the lifecycle actions that orchestrate request
//! dispatch, and the read accessors that project status for consumers.
//!
//! ## Core Components
//!
//! - **`MetaStore`**: slice registry with synchronous event dispatch
//!   and watch-based change notification
//! - **`RequestAction`**: derives the three lifecycle event names from
//!   a type prefix, stamps request descriptors, registers status
//!   reducers per its tracking configuration
//! - **Read accessors**: point-in-time and subscribed projections with
//!   a referentially stable, memoized loadings view
//!
//! ## Example
//!
//! ```ignore
//! use reqstate_core::{RequestDescriptor, Tracking};
//! use reqstate_runtime::{MetaStore, RequestAction};
//!
//! let store = MetaStore::new();
//! let fetch_user = RequestAction::new(
//!     store.clone(),
//!     "user fetchUser",
//!     |id: u64| RequestDescriptor::new(serde_json::json!({ "userId": id })),
//!     |descriptor| transport.run(descriptor),
//! )
//! .with_tracking(Tracking::Singleton);
//!
//! fetch_user.call(42);
//! // ... transport emits prepare/success/fail events into the store ...
//! assert!(fetch_user.loading()?);
//! ```

/// The meta store: slice registry and synchronous dispatch.
pub mod store;

/// Lifecycle actions and subscriber descriptors.
pub mod action;

/// Point-in-time and subscribed read accessors.
pub mod accessor;

pub use accessor::MetaWatcher;
pub use action::{RequestAction, RequestSubscriber};
pub use store::MetaStore;
