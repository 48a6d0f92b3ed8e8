//! Contract Test: Idempotency
//!
//! Reconciling unchanged desired state must never write to the device.
//!
//! Constraints verified:
//! - A second reconcile of the same desired state plans a no-op
//! - Semantically equal values (`3600s` vs `1h`) are not rewritten
//! - Fields the caller did not specify are not compared
//! - Correctly placed ordered items are not moved
//!
//! If this test fails, every run would churn device configuration.

mod common;

use common::*;
use ros_core::engine::EngineEvent;
use ros_core::identity::Identity;
use ros_core::model::Instance;
use ros_core::traits::Operation;
use tokio_test::assert_ok;

#[tokio::test]
async fn second_reconcile_is_noop() {
    let device = device();
    let (engine, mut events) = engine(&device);

    let first = assert_ok!(engine.reconcile(SCHEDULER, &scheduler("sched1")).await);
    assert!(first.applied);
    assert_eq!(device.count(Operation::Add).await, 1);

    let writes_after_create = device.write_count().await;

    let second = assert_ok!(engine.reconcile(SCHEDULER, &scheduler("sched1")).await);
    assert!(second.plan.is_noop(), "expected noop, got {}", second.plan);
    assert!(!second.applied);
    assert_eq!(
        device.write_count().await,
        writes_after_create,
        "second reconcile must not write"
    );

    let unchanged = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::Unchanged { .. }))
        .count();
    assert_eq!(unchanged, 1);
}

#[tokio::test]
async fn canonicalised_duration_is_not_rewritten() {
    let device = device();
    let (engine, _events) = engine(&device);

    engine
        .reconcile(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("create succeeds");

    // Device stored "1h" for our "3600s"
    assert_eq!(device.records(SCHEDULER_PATH).await[0]["interval"], "1h");

    let outcome = engine
        .reconcile(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("reconcile succeeds");
    assert!(outcome.plan.is_noop());
    assert_eq!(device.count(Operation::Set).await, 0);
}

#[tokio::test]
async fn unspecified_fields_are_not_compared() {
    let device = device();
    let (engine, _events) = engine(&device);

    engine
        .reconcile(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("create succeeds");

    // Someone else sets a comment; we never declared one
    let id = device.records(SCHEDULER_PATH).await[0][".id"].clone();
    assert!(device.poke(SCHEDULER_PATH, &id, "comment", "managed elsewhere").await);

    let outcome = engine
        .reconcile(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("reconcile succeeds");
    assert!(outcome.plan.is_noop());
}

#[tokio::test]
async fn update_with_current_values_issues_no_set() {
    let device = device();
    let (engine, _events) = engine(&device);

    engine
        .create(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("create succeeds");

    let partial = Instance::new().with("interval", "60m");
    let instance = engine
        .update(SCHEDULER, &Identity::Name("sched1".into()), &partial)
        .await
        .expect("update succeeds");

    assert_eq!(instance.get_text("interval").as_deref(), Some("1h"));
    assert_eq!(device.count(Operation::Set).await, 0);
}

#[tokio::test]
async fn placed_rule_is_not_moved_again() {
    let device = device();
    let (engine, _events) = engine(&device);

    let first = engine
        .create(FIREWALL, &Instance::new().with("chain", "input"))
        .await
        .expect("create succeeds");
    let first_id = first.identity.expect("identity assigned");

    let rule = Instance::new()
        .with("chain", "forward")
        .with("action", "drop")
        .with("place_before", first_id.value());
    let second = engine
        .reconcile(FIREWALL, &rule)
        .await
        .expect("create succeeds");
    let second_id = second
        .instance
        .and_then(|i| i.identity)
        .expect("identity assigned");

    let again = engine
        .reconcile(FIREWALL, &rule.with_identity(second_id))
        .await
        .expect("reconcile succeeds");
    assert!(again.plan.is_noop(), "expected noop, got {}", again.plan);
    assert_eq!(device.count(Operation::Move).await, 0);
}
