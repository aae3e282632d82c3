//! # Reqstate Testing
//!
//! Testing utilities and fixtures for the reqstate architecture.
//!
//! This crate provides:
//! - [`LifecycleEvents`]: factories for the three lifecycle events of
//!   one action, derived once from its type prefix
//! - [`StatusReducerTest`]: a Given-When-Then harness over the pure
//!   status fold
//! - [`RecordingTransport`]: a transport double that captures stamped
//!   descriptors and replays prepare/success/fail events into a store
//!
//! ## Example
//!
//! ```ignore
//! use reqstate_testing::{LifecycleEvents, RecordingTransport};
//!
//! let store = MetaStore::new();
//! let transport = RecordingTransport::new(store.clone());
//! let action = RequestAction::new(store, "fetchUser", builder, transport.runner())
//!     .with_tracking(Tracking::Singleton);
//!
//! action.call(42);
//! transport.begin_last();
//! assert!(action.loading()?);
//! ```

/// Lifecycle event factories.
pub mod events;


/// Recording transport double.
pub mod transport;

pub use events::LifecycleEvents;
pub use reducer_test::StatusReducerTest;
pub use transport::RecordingTransport;
