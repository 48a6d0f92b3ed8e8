//! Contract Test: List Placement
//!
//! Ordered resource kinds (firewall rules) carry a `place_before` target.
//! Position is checked against the device list, not diffed as a field.
//!
//! Constraints verified:
//! - A misplaced item is repositioned with exactly one `move`
//! - Kinds without in-place reordering are removed and added again, keeping
//!   every field the caller did not restate
//! - Every planned action is exactly one device command
//! - `place_before` is never sent in a partial `set`

mod common;

use common::*;
use ros_core::identity::Identity;
use ros_core::model::Instance;
use ros_core::schema::{Field, PlacementStrategy, ResourceSchema, SchemaRegistry, props};
use ros_core::traits::Operation;
use ros_core::Error;
use tokio_test::{assert_err, assert_ok};

const QUEUE: &str = "queue_simple";
const QUEUE_PATH: &str = "/queue/simple";

/// Simple queues cannot be moved in place
fn queue_schemas() -> SchemaRegistry {
    SchemaRegistry::new().with(
        ResourceSchema::new(QUEUE, QUEUE_PATH)
            .ordered(props::PLACE_BEFORE, PlacementStrategy::Recreate)
            .field("name", props::name())
            .field("target", Field::string().required())
            .field("comment", props::comment())
            .field(props::PLACE_BEFORE, props::place_before()),
    )
}

async fn chains(device: &ros_core::MemoryTransport, path: &str, key: &str) -> Vec<String> {
    device
        .records(path)
        .await
        .into_iter()
        .map(|r| r[key].clone())
        .collect()
}

#[tokio::test]
async fn misplaced_rule_is_moved() {
    let device = device();
    let (engine, _events) = engine(&device);

    for chain in ["input", "forward"] {
        engine
            .create(FIREWALL, &Instance::new().with("chain", chain))
            .await
            .expect("create succeeds");
    }
    // input=*1, forward=*2
    assert_eq!(chains(&device, FIREWALL_PATH, "chain").await, vec!["input", "forward"]);

    let writes_before = device.write_count().await;
    let desired = Instance::new()
        .with_identity(Identity::Id("*2".into()))
        .with("chain", "forward")
        .with("place_before", "*1");

    let outcome = assert_ok!(engine.reconcile(FIREWALL, &desired).await);
    assert_eq!(outcome.plan.to_string(), "ip_firewall_filter .id=*2: move before *1");
    assert_eq!(
        device.write_count().await - writes_before,
        outcome.plan.command_count()
    );
    assert_eq!(chains(&device, FIREWALL_PATH, "chain").await, vec!["forward", "input"]);

    let again = assert_ok!(engine.reconcile(FIREWALL, &desired).await);
    assert!(again.plan.is_noop());
}

#[tokio::test]
async fn move_and_field_change_are_separate_commands() {
    let device = device();
    let (engine, _events) = engine(&device);

    for chain in ["input", "forward"] {
        engine
            .create(FIREWALL, &Instance::new().with("chain", chain))
            .await
            .expect("create succeeds");
    }

    let desired = Instance::new()
        .with_identity(Identity::Id("*2".into()))
        .with("chain", "forward")
        .with("action", "drop")
        .with("place_before", "*1");

    let outcome = assert_ok!(engine.reconcile(FIREWALL, &desired).await);
    assert_eq!(outcome.plan.command_count(), 2);

    let requests = device.requests().await;
    let set = requests
        .iter()
        .find(|r| r.operation == Operation::Set)
        .expect("set issued");
    assert_eq!(set.params["action"], "drop");
    assert!(!set.params.contains_key("place-before"));

    let moves: Vec<_> = requests
        .iter()
        .filter(|r| r.operation == Operation::Move)
        .collect();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].params["numbers"], "*2");
    assert_eq!(moves[0].params["destination"], "*1");
}

#[tokio::test]
async fn create_honours_place_before() {
    let device = device();
    let (engine, _events) = engine(&device);

    let first = engine
        .create(FIREWALL, &Instance::new().with("chain", "input"))
        .await
        .expect("create succeeds");
    let first_id = first.identity.expect("identity assigned");

    engine
        .create(
            FIREWALL,
            &Instance::new()
                .with("chain", "forward")
                .with("place_before", first_id.value()),
        )
        .await
        .expect("create succeeds");

    assert_eq!(chains(&device, FIREWALL_PATH, "chain").await, vec!["forward", "input"]);
    assert_eq!(device.count(Operation::Move).await, 0);
}

#[tokio::test]
async fn recreate_strategy_removes_and_adds() {
    const PATH: &str = "/queue/simple";

    let schemas = SchemaRegistry::new().with(
        ResourceSchema::new("queue_simple", PATH)
            .ordered(props::PLACE_BEFORE, PlacementStrategy::Recreate)
            .field("name", props::name())
            .field(props::PLACE_BEFORE, props::place_before()),
    );

    let device = device();
    let (engine, _events) = engine_for(&device, schemas);

    let a = device.seed(PATH, record(&[("name", "a")])).await;
    let b = device.seed(PATH, record(&[("name", "b")])).await;

    let desired = Instance::new()
        .with_identity(Identity::Id(b.clone()))
        .with("name", "b")
        .with("place_before", a.as_str());

    let outcome = assert_ok!(engine.reconcile("queue_simple", &desired).await);
    assert_eq!(device.count(Operation::Remove).await, 1);
    assert_eq!(device.count(Operation::Add).await, 1);
    assert_eq!(device.count(Operation::Move).await, 0);
    assert_eq!(chains(&device, PATH, "name").await, vec!["b", "a"]);

    let recreated = outcome.instance.expect("recreated");
    assert_ne!(recreated.identity, Some(Identity::Id(b)));
}

#[tokio::test]
async fn unknown_placement_target_is_rejected_before_writing() {
    let device = device();
    let (engine, _events) = engine(&device);

    engine
        .create(FIREWALL, &Instance::new().with("chain", "input"))
        .await
        .expect("create succeeds");
    let writes_before = device.write_count().await;

    let desired = Instance::new()
        .with_identity(Identity::Id("*1".into()))
        .with("chain", "input")
        .with("place_before", "*42");

    let err = engine.reconcile(FIREWALL, &desired).await.unwrap_err();
    assert!(matches!(err, ros_core::Error::Validation { .. }), "got {:?}", err);
    assert_eq!(device.write_count().await, writes_before);
}

#[tokio::test]
async fn partial_update_recreate_keeps_unspecified_fields() {
    let device = device();
    let (engine, _events) = engine_for(&device, queue_schemas());

    let a = device
        .seed(QUEUE_PATH, record(&[("name", "a"), ("target", "10.0.0.1")]))
        .await;
    let b = device
        .seed(
            QUEUE_PATH,
            record(&[("name", "b"), ("target", "10.0.0.2"), ("comment", "guest")]),
        )
        .await;

    let moved = assert_ok!(
        engine
            .update(
                QUEUE,
                &Identity::Id(b.clone()),
                &Instance::new().with("place_before", a.as_str()),
            )
            .await
    );
    assert_eq!(moved.get_text("name").as_deref(), Some("b"));
    assert_eq!(moved.get_text("target").as_deref(), Some("10.0.0.2"));
    assert_ne!(moved.identity, Some(Identity::Id(b)));

    let records = device.records(QUEUE_PATH).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["name"], "b");
    assert_eq!(records[0]["target"], "10.0.0.2");
    assert_eq!(records[0]["comment"], "guest");
    assert_eq!(records[1]["name"], "a");
}

#[tokio::test]
async fn recreate_missing_required_field_is_rejected_before_writing() {
    let device = device();
    let (engine, _events) = engine_for(&device, queue_schemas());

    let a = device
        .seed(QUEUE_PATH, record(&[("name", "a"), ("target", "10.0.0.1")]))
        .await;
    // Configured by hand without a target
    let b = device.seed(QUEUE_PATH, record(&[("name", "b")])).await;

    let err = assert_err!(
        engine
            .update(
                QUEUE,
                &Identity::Id(b.clone()),
                &Instance::new().with("place_before", a.as_str()),
            )
            .await
    );
    assert!(
        matches!(err, Error::Validation { ref field, .. } if field == "target"),
        "got {:?}",
        err
    );
    assert_eq!(device.write_count().await, 0);
    assert_eq!(chains(&device, QUEUE_PATH, "name").await, vec!["a", "b"]);
}
