//! Contract Test: Convergence
//!
//! After a successful reconcile the device matches the desired state, and
//! an immediate re-read agrees.
//!
//! Constraints verified:
//! - Create returns the device-assigned identity and computed fields
//! - Updates send only the changed fields plus `.id`
//! - Out-of-band edits of managed fields are reverted
//! - Declared defaults are sent on create
//! - Dry runs plan without writing
//!
//! If this test fails, desired state is not being applied faithfully.

mod common;

use common::*;
use ros_core::identity::Identity;
use ros_core::model::{FilterSet, Instance, Value};
use ros_core::traits::Operation;
use std::collections::BTreeMap;
use tokio_test::assert_ok;

#[tokio::test]
async fn create_then_read_scheduler() {
    let device = device();
    let (engine, _events) = engine(&device);

    let created = assert_ok!(engine.create(SCHEDULER, &scheduler("sched1")).await);

    let identity = created.identity.clone().expect("identity assigned");
    assert!(!identity.is_empty());
    assert_eq!(created.get("run_count"), Some(&Value::from("0")));
    assert!(
        created
            .get_text("next_run")
            .is_some_and(|next_run| !next_run.is_empty())
    );

    let interval = created.get_text("interval").expect("interval echoed");
    assert!(
        engine
            .suppress_diff(SCHEDULER, "interval", &interval, "3600s")
            .unwrap(),
        "device echoed {} for 3600s",
        interval
    );

    let read = assert_ok!(engine.read(SCHEDULER, &identity, &FilterSet::new()).await);
    assert_eq!(read, created);
}

#[tokio::test]
async fn read_applies_filters() {
    let device = device();
    let (engine, _events) = engine(&device);

    engine
        .create(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("create succeeds");

    let identity = Identity::Name("sched1".into());

    let matching = FilterSet::new().with("on_event", "myscript");
    assert!(engine.read(SCHEDULER, &identity, &matching).await.is_ok());

    let other = FilterSet::new().with("on_event", "other");
    let err = engine.read(SCHEDULER, &identity, &other).await.unwrap_err();
    assert!(err.is_not_found());

    // Filter keys travel kebab-case
    let reads = device.requests().await;
    let last = reads.last().expect("read issued");
    assert!(
        last.filters
            .to_strings()
            .contains(&"on-event=other".to_string())
    );
}

#[tokio::test]
async fn update_sends_only_changed_fields() {
    let device = device();
    let (engine, _events) = engine(&device);

    engine
        .create(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("create succeeds");

    let desired = scheduler("sched1").with("interval", "2h");
    let outcome = assert_ok!(engine.reconcile(SCHEDULER, &desired).await);
    assert!(outcome.applied);
    assert_eq!(outcome.plan.to_string(), "system_scheduler sched1: update(interval)");

    let sets: Vec<_> = device
        .requests()
        .await
        .into_iter()
        .filter(|r| r.operation == Operation::Set)
        .collect();
    assert_eq!(sets.len(), 1);
    let keys: Vec<&str> = sets[0].params.keys().map(String::as_str).collect();
    assert_eq!(keys, vec![".id", "interval"]);

    let instance = outcome.instance.expect("re-read after update");
    assert_eq!(instance.get_text("interval").as_deref(), Some("2h"));

    let again = assert_ok!(engine.reconcile(SCHEDULER, &desired).await);
    assert!(again.plan.is_noop());
}

#[tokio::test]
async fn out_of_band_edit_is_reverted() {
    let device = device();
    let (engine, _events) = engine(&device);

    engine
        .reconcile(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("create succeeds");

    let id = device.records(SCHEDULER_PATH).await[0][".id"].clone();
    device.poke(SCHEDULER_PATH, &id, "on-event", "tampered").await;

    let outcome = engine
        .reconcile(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("reconcile succeeds");
    assert!(outcome.applied);
    assert_eq!(
        device.records(SCHEDULER_PATH).await[0]["on-event"],
        "myscript"
    );
}

#[tokio::test]
async fn create_sends_declared_defaults() {
    let device = device();
    let (engine, _events) = engine(&device);

    let vlan = Instance::new()
        .with("name", "vlan10")
        .with("interface", "ether1")
        .with("vlan_id", 10)
        .with("mtu", "auto");
    let created = assert_ok!(engine.create(VLAN, &vlan).await);

    let stored = &device.records("/interface/vlan").await[0];
    assert_eq!(stored["arp"], "enabled");
    assert_eq!(stored["arp-timeout"], "auto");
    assert_eq!(stored["disabled"], "no");
    assert_eq!(stored["use-service-tag"], "no");

    assert_eq!(created.identity, Some(Identity::Name("vlan10".into())));
    assert_eq!(created.get("running"), Some(&Value::Bool(true)));
    assert_eq!(created.get("l2mtu"), Some(&Value::Int(1594)));
}

#[tokio::test]
async fn dry_run_plans_without_writing() {
    let device = device();
    let (engine, _events) = dry_run_engine(&device);

    let outcome = engine
        .reconcile(SCHEDULER, &scheduler("sched1"))
        .await
        .expect("dry run succeeds");

    assert!(outcome.plan.creates());
    assert!(!outcome.applied);
    assert!(outcome.instance.is_none());
    assert_eq!(device.write_count().await, 0);
}

#[tokio::test]
async fn sub_second_interval_change_is_applied() {
    let device = device();
    let (engine, _events) = engine(&device);

    assert_ok!(
        engine
            .reconcile(SCHEDULER, &scheduler("sched1").with("interval", "1s"))
            .await
    );
    assert_eq!(device.records(SCHEDULER_PATH).await[0]["interval"], "1s");

    let faster = scheduler("sched1").with("interval", "1s500ms");
    let outcome = assert_ok!(engine.reconcile(SCHEDULER, &faster).await);
    assert!(outcome.applied, "expected update, got {}", outcome.plan);
    assert_eq!(device.records(SCHEDULER_PATH).await[0]["interval"], "1s500ms");

    let again = assert_ok!(engine.reconcile(SCHEDULER, &faster).await);
    assert!(again.plan.is_noop(), "expected noop, got {}", again.plan);
}

#[tokio::test]
async fn filter_field_constrains_lookup_and_is_not_sent() {
    let device = device();
    let (engine, _events) = engine(&device);

    let vlan_on = |parent: &str| {
        let mut constraints = BTreeMap::new();
        constraints.insert("interface".to_string(), parent.to_string());
        Instance::new()
            .with("name", "vlan10")
            .with("interface", "ether1")
            .with("vlan_id", 10)
            .with("filter", Value::Map(constraints))
    };

    let created = assert_ok!(engine.reconcile(VLAN, &vlan_on("ether1")).await);
    assert!(created.plan.creates());
    let stored = device.records("/interface/vlan").await;
    assert!(!stored[0].contains_key("filter"));

    let again = assert_ok!(engine.reconcile(VLAN, &vlan_on("ether1")).await);
    assert!(again.plan.is_noop(), "expected noop, got {}", again.plan);

    let lookup = device
        .requests()
        .await
        .into_iter()
        .filter(|r| r.operation == Operation::Read)
        .last()
        .expect("lookup read issued");
    assert_eq!(
        lookup.filters.to_strings(),
        vec!["interface=ether1", "name=vlan10"]
    );

    let (planner, _events) = dry_run_engine(&device);
    let elsewhere = assert_ok!(planner.reconcile(VLAN, &vlan_on("ether2")).await);
    assert!(elsewhere.plan.creates());
}
