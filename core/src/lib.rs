//! # Reqstate Core
//!
//! Data model and fold logic for tracking asynchronous request
//! lifecycles inside a client-side state store.
//!
//! Every logical request action expands into three dispatchable events
//! derived from one shared type prefix (prepare, success, fail). This
//! crate owns everything that is pure about that machinery:
//!
//! - **Status / `StatusCollection`**: the per-action ("meta") and
//!   per-entity ("metas") lifecycle records
//! - **Event model**: [`event::EventKind`], [`event::EventTypes`],
//!   [`event::RequestEvent`], [`event::RequestDescriptor`]
//! - **`StatusReducer`**: a case-addressable pure fold
//!   `(previous slice, event) -> new slice`
//! - **`ReadError`**: the configuration-error taxonomy for reads
//!
//! The store runtime, the lifecycle action orchestrator, and the read
//! accessors live in the `reqstate-runtime` crate; transports and
//! effect pipelines are external collaborators.
//!
//! ## State machine
//!
//! Per tracked instance (singleton, or one per collection key):
//!
//! ```text
//! UNSTARTED -> PENDING -> (SUCCEEDED | FAILED) -> PENDING -> ...
//! ```
//!
//! Transitions are driven solely by the three events. Reads in
//! `UNSTARTED` resolve to [`status::Status::unset`], never to an absent
//! marker.

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};

/// Status records: `Status`, `StatusCollection`, `LoadingView`.
pub mod status;

/// Lifecycle events, derived type names, and request descriptors.
pub mod event;

/// Pure status reducers and tracking configuration.
pub mod reducer;

/// Read-accessor error taxonomy.
pub mod error;

pub use error::ReadError;
pub use event::{EventKind, EventTypes, RequestDescriptor, RequestEvent, Role};
pub use reducer::{StatusReducer, StatusSlice, Tracking};
pub use status::{BusinessCode, LoadingView, Status, StatusCollection};
