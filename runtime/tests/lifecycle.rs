//! Integration tests for the request lifecycle.
//!
//! End-to-end scenarios wiring a `RequestAction` to a `MetaStore`
//! through the recording transport double: status transitions, keyed
//! isolation, memoized loading views, renames, and read-mode errors.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use reqstate_core::{ReadError, RequestDescriptor, Role, Status, Tracking};
use reqstate_runtime::{MetaStore, RequestAction};
use reqstate_testing::{LifecycleEvents, RecordingTransport};
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// Test Fixtures
// ============================================================================

type ItemAction = RequestAction<&'static str, RequestDescriptor>;

fn singleton_action(store: &MetaStore, transport: &RecordingTransport) -> ItemAction {
    RequestAction::new(
        store.clone(),
        "fetchUser",
        |id| RequestDescriptor::new(json!({ "userId": id })),
        transport.runner(),
    )
    .with_tracking(Tracking::Singleton)
}

fn keyed_action(store: &MetaStore, transport: &RecordingTransport) -> ItemAction {
    RequestAction::new(
        store.clone(),
        "fetchItem",
        |id| RequestDescriptor::new(json!({ "itemId": id })),
        transport.runner(),
    )
    .with_tracking(Tracking::Keyed("itemId".to_owned()))
}

// ============================================================================
// Singleton lifecycle
// ============================================================================

#[test]
fn singleton_lifecycle_prepare_then_success() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = singleton_action(&store, &transport);

    // Never invoked: reads resolve to the default.
    assert_eq!(action.meta().unwrap(), Status::unset());
    assert!(!action.loading().unwrap());

    action.call("alice");
    transport.begin_last();
    assert!(action.loading().unwrap());

    transport.resolve_last();
    let status = action.meta().unwrap();
    assert!(!status.loading);
    assert!(status.error_message.is_none());
    assert_eq!(status.action_type, "fetchUser");
}

#[test]
fn singleton_lifecycle_failure_then_retry() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = singleton_action(&store, &transport);

    action.call("alice");
    transport.begin_last();
    transport.reject_last("timeout", Some(504));

    let failed = action.meta().unwrap();
    assert!(failed.is_failed());
    assert_eq!(failed.error_message.as_deref(), Some("timeout"));
    assert_eq!(failed.http_status, Some(504));

    // Re-invocation re-enters PENDING and drops the stale error.
    action.call("alice");
    transport.begin_last();
    let retried = action.meta().unwrap();
    assert!(retried.loading);
    assert!(retried.error_message.is_none());
}

#[test]
fn overlapping_invocations_are_last_writer_wins() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = singleton_action(&store, &transport);

    action.call("alice");
    transport.begin_last();
    action.call("bob");
    transport.begin_last();
    assert!(action.loading().unwrap());

    // A late success from either invocation settles the shared status.
    transport.resolve_last();
    assert!(!action.loading().unwrap());
}

// ============================================================================
// Keyed lifecycle
// ============================================================================

#[test]
fn keyed_lifecycle_isolates_entries() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = keyed_action(&store, &transport);

    action.call("42");
    transport.begin_last();
    assert!(action.loadings().unwrap().get("42"));
    assert!(action.loading_of("42").unwrap());

    transport.reject_last("timeout", Some(504));
    let failed = action.meta_of("42").unwrap();
    assert!(!failed.loading);
    assert_eq!(failed.error_message.as_deref(), Some("timeout"));
    assert_eq!(failed.http_status, Some(504));

    // A key never invoked still yields the default, not an absence.
    assert_eq!(action.meta_of("43").unwrap(), Status::unset());
    assert!(!action.loadings().unwrap().get("43"));
}

#[test]
fn keyed_entries_progress_independently() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = keyed_action(&store, &transport);

    action.call("42");
    transport.begin_last();
    action.call("43");
    transport.begin_last();

    let loadings = action.loadings().unwrap();
    assert!(loadings.get("42"));
    assert!(loadings.get("43"));

    // Settling "43" leaves "42" pending.
    transport.resolve_last();
    let loadings = action.loadings().unwrap();
    assert!(loadings.get("42"));
    assert!(!loadings.get("43"));
}

// ============================================================================
// Loadings memoization
// ============================================================================

#[test]
fn loadings_view_is_referentially_stable() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = keyed_action(&store, &transport);

    // Stable even before the slice exists.
    let empty_a = action.loadings().unwrap();
    let empty_b = action.loadings().unwrap();
    assert!(Arc::ptr_eq(&empty_a, &empty_b));

    action.call("42");
    transport.begin_last();

    let first = action.loadings().unwrap();
    let second = action.loadings().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&empty_a, &first));

    transport.resolve_last();
    let third = action.loadings().unwrap();
    assert!(!Arc::ptr_eq(&second, &third));
    assert!(!third.get("42"));
}

#[test]
fn unmatched_event_does_not_invalidate_the_view() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = keyed_action(&store, &transport);

    action.call("42");
    transport.begin_last();
    let before = action.loadings().unwrap();

    let unrelated = LifecycleEvents::new("somethingElse");
    assert!(!store.dispatch(&unrelated.prepare()));

    let after = action.loadings().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

// ============================================================================
// Read-mode errors
// ============================================================================

#[test]
fn untracked_action_reads_fail_loudly() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = RequestAction::new(
        store,
        "fireAndForget",
        |id: &'static str| RequestDescriptor::new(json!({ "id": id })),
        transport.runner(),
    );

    assert_eq!(
        action.meta(),
        Err(ReadError::NotRegistered { prefix: "fireAndForget".to_owned() })
    );
    assert!(matches!(action.loading(), Err(ReadError::NotRegistered { .. })));
    assert!(matches!(action.loadings(), Err(ReadError::NotRegistered { .. })));
}

#[test]
fn require_registered_rejects_missing_slice() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = RequestAction::new(
        store.clone(),
        "fetchUser",
        |id: &'static str| RequestDescriptor::new(json!({ "userId": id })),
        transport.runner(),
    )
    .with_tracking(Tracking::Singleton)
    .require_registered();

    // Tracking is configured but nothing was folded yet; under strict
    // semantics that absence is a wiring error, not a default.
    assert_eq!(
        action.meta(),
        Err(ReadError::SliceMissing { slice: "fetchUser@meta".to_owned() })
    );

    action.call("alice");
    transport.begin_last();
    assert!(action.loading().unwrap());
}

#[test]
fn singleton_read_on_keyed_action_is_a_mismatch() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = keyed_action(&store, &transport);

    assert_eq!(
        action.meta(),
        Err(ReadError::TrackingMismatch {
            prefix: "fetchItem".to_owned(),
            expected: Role::Meta,
            actual: Role::Metas,
        })
    );
    assert!(matches!(
        singleton_action(&store, &transport).metas(),
        Err(ReadError::TrackingMismatch { .. })
    ));
}

// ============================================================================
// Prefix reassignment
// ============================================================================

#[test]
fn rename_retires_the_old_event_names() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = singleton_action(&store, &transport);

    let old_events = LifecycleEvents::new("fetchUser");
    action.set_type_prefix("account fetchUser");

    // Events bearing the old names no longer affect the slice.
    assert!(!store.dispatch(&old_events.prepare()));
    assert!(!action.loading().unwrap());

    // The recomputed names drive the lifecycle as before.
    action.call("alice");
    transport.begin_last();
    assert!(action.loading().unwrap());
    assert_eq!(action.get_prepare_type(), "account fetchUser prepare");

    let descriptor = transport.last().unwrap();
    assert_eq!(descriptor.types.unwrap().success(), "account fetchUser");
}

// ============================================================================
// Subscribed reads
// ============================================================================

#[tokio::test]
async fn subscribed_read_follows_the_lifecycle() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = singleton_action(&store, &transport);

    let mut watcher = action.watch();

    action.call("alice");
    transport.begin_last();
    assert!(watcher.next_loading().await.unwrap());

    transport.resolve_last();
    let status = watcher.next_meta().await.unwrap();
    assert!(!status.loading);
    assert!(status.error_message.is_none());
}

#[tokio::test]
async fn subscribed_keyed_read_projects_entries() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = keyed_action(&store, &transport);

    let mut watcher = action.watch();

    action.call("42");
    transport.begin_last();
    assert!(watcher.next_loadings().await.unwrap().get("42"));

    transport.reject_last("timeout", Some(504));
    let failed = watcher.next_meta_of("42").await.unwrap();
    assert_eq!(failed.error_message.as_deref(), Some("timeout"));
    assert_eq!(failed.http_status, Some(504));
}

#[tokio::test]
async fn subscriber_wakes_only_on_real_changes() {
    let store = MetaStore::new();
    let transport = RecordingTransport::new(store.clone());
    let action = singleton_action(&store, &transport);

    let mut watcher = action.watch();

    // An unmatched event must not wake the watcher.
    let unrelated = LifecycleEvents::new("somethingElse");
    store.dispatch(&unrelated.prepare());
    let woken = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        watcher.next_loading(),
    )
    .await;
    assert!(woken.is_err(), "unmatched event should not wake subscribers");

    action.call("alice");
    transport.begin_last();
    assert!(watcher.next_loading().await.unwrap());
}
