//! Error taxonomy for status reads.
//!
//! An ordinary request failure is not an error here: it is folded into
//! observable state (the FAILED status with its error fields) and never
//! thrown. The variants below are configuration and wiring mistakes,
//! raised loudly so they surface during development instead of being
//! papered over with defaults.

use crate::event::Role;
use thiserror::Error;

/// Errors raised by the read accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// Status tracking was never configured for this action
    /// (`Tracking::None`) but a read was attempted.
    #[error("status tracking is not configured for `{prefix}`")]
    NotRegistered {
        /// Type prefix of the action being read.
        prefix: String,
    },

    /// Tracking is configured but the slice is absent from the store
    /// snapshot under must-be-registered semantics. The reducer was
    /// never attached to this store, or events are being dispatched to
    /// a different store.
    #[error("store has no `{slice}` slice; status reducer was never wired up")]
    SliceMissing {
        /// Name of the missing slice.
        slice: String,
    },

    /// A singleton read was issued against a keyed action, or the other
    /// way round.
    #[error("`{prefix}` tracks a {actual} slice, but a {expected} read was issued")]
    TrackingMismatch {
        /// Type prefix of the action being read.
        prefix: String,
        /// Role the read expected.
        expected: Role,
        /// Role the action actually tracks.
        actual: Role,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_slice() {
        let error = ReadError::SliceMissing { slice: "fetchUser@meta".to_owned() };
        assert!(error.to_string().contains("fetchUser@meta"));

        let mismatch = ReadError::TrackingMismatch {
            prefix: "fetchItem".to_owned(),
            expected: Role::Meta,
            actual: Role::Metas,
        };
        assert!(mismatch.to_string().contains("metas"));
    }
}
