//! Reconciliation planning
//!
//! Planning is pure: given a schema, the desired instance and what the
//! device reported, it decides which commands are needed. Each planned
//! [`Action`] is executed as exactly one device command.

use super::diff::{self, FieldChange};
use crate::codec;
use crate::error::Result;
use crate::identity::Identity;
use crate::model::{Instance, Record};
use crate::schema::{PlacementStrategy, ResourceSchema};
use std::fmt;

/// One planned device command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `add` with the full desired state (defaults applied)
    Create,
    /// Partial `set` of the changed fields only
    Update { changes: Vec<FieldChange> },
    /// In-place `move` before another item
    Move { destination: String },
    /// `remove`
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => f.write_str("create"),
            Action::Update { changes } => {
                let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
                write!(f, "update({})", fields.join(", "))
            }
            Action::Move { destination } => write!(f, "move before {}", destination),
            Action::Delete => f.write_str("delete"),
        }
    }
}

/// Ordered commands for one resource instance
///
/// An empty plan is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub resource: String,
    pub identity: Option<Identity>,
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(resource: impl Into<String>, identity: Option<Identity>) -> Self {
        Self {
            resource: resource.into(),
            identity,
            actions: Vec::new(),
        }
    }

    /// Plan creating the instance from scratch
    pub fn create(resource: impl Into<String>, identity: Option<Identity>) -> Self {
        Self::new(resource, identity).then(Action::Create)
    }

    /// Plan removing the instance
    pub fn delete(resource: impl Into<String>, identity: Identity) -> Self {
        Self::new(resource, Some(identity)).then(Action::Delete)
    }

    /// Builder-style action append
    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether executing the plan adds a new item
    pub fn creates(&self) -> bool {
        self.actions.contains(&Action::Create)
    }

    /// Whether the plan consists of writes to an existing item only
    pub fn modifies_existing(&self) -> bool {
        !self.is_noop() && !self.creates()
    }

    /// Number of device commands the plan issues
    pub fn command_count(&self) -> usize {
        self.actions.len()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if let Some(identity) = &self.identity {
            write!(f, " {}", identity)?;
        }
        if self.is_noop() {
            return f.write_str(": noop");
        }
        let actions: Vec<String> = self.actions.iter().map(|a| a.to_string()).collect();
        write!(f, ": {}", actions.join(", "))
    }
}

/// What the device reported for the addressed item
#[derive(Debug, Clone, Copy)]
pub struct Current<'a> {
    /// The item itself
    pub record: &'a Record,
    /// Every item under the resource path, in list order (for placement);
    /// unordered kinds may pass just the item
    pub list: &'a [Record],
}

/// Decide the commands bringing `current` to `desired`
///
/// - no current item: create
/// - changed fields: partial update
/// - wrong list position: move, or delete and create again when the kind
///   cannot be reordered in place (the new item carries every field, so no
///   separate update is planned)
/// - nothing differs: no-op
pub fn plan(
    schema: &ResourceSchema,
    desired: &Instance,
    identity: Option<Identity>,
    current: Option<Current<'_>>,
) -> Result<Plan> {
    let Some(current) = current else {
        return Ok(Plan::create(schema.name(), identity));
    };

    let observed = codec::decode(current.record, schema)?;
    let changes = diff::diff(schema, desired, &observed);
    let destination = diff::placement(schema, desired, current.record, current.list)?;

    let mut plan = Plan::new(schema.name(), identity);

    match (destination, schema.placement().map(|p| p.strategy)) {
        (Some(_), Some(PlacementStrategy::Recreate)) => {
            plan = plan.then(Action::Delete).then(Action::Create);
        }
        (Some(destination), _) => {
            if !changes.is_empty() {
                plan = plan.then(Action::Update { changes });
            }
            plan = plan.then(Action::Move { destination });
        }
        (None, _) => {
            if !changes.is_empty() {
                plan = plan.then(Action::Update { changes });
            }
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ID_KEY;
    use crate::schema::{Field, resources};

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plan_create_without_current() {
        let schema = resources::system_scheduler();
        let desired = Instance::new().with("name", "s1");

        let plan = plan(&schema, &desired, None, None).unwrap();
        assert_eq!(plan.actions, vec![Action::Create]);
        assert!(plan.creates());
    }

    #[test]
    fn test_plan_noop_and_update() {
        let schema = resources::system_scheduler();
        let current = record(&[(ID_KEY, "*1"), ("name", "s1"), ("interval", "1h")]);
        let list = std::slice::from_ref(&current);
        let identity = Some(Identity::Name("s1".into()));

        let desired = Instance::new().with("name", "s1").with("interval", "3600s");
        let noop = plan(
            &schema,
            &desired,
            identity.clone(),
            Some(Current { record: &current, list }),
        )
        .unwrap();
        assert!(noop.is_noop());
        assert_eq!(noop.to_string(), "system_scheduler s1: noop");

        let desired = desired.with("interval", "2h");
        let update = plan(&schema, &desired, identity, Some(Current { record: &current, list }))
            .unwrap();
        assert_eq!(update.to_string(), "system_scheduler s1: update(interval)");
        assert!(update.modifies_existing());
    }

    #[test]
    fn test_plan_move() {
        let schema = resources::ip_firewall_filter();
        let list = vec![
            record(&[(ID_KEY, "*1"), ("chain", "input")]),
            record(&[(ID_KEY, "*2"), ("chain", "forward")]),
            record(&[(ID_KEY, "*3"), ("chain", "output")]),
        ];

        let desired = Instance::new()
            .with("chain", "forward")
            .with("place_before", "*1");
        let plan = plan(
            &schema,
            &desired,
            Some(Identity::Id("*2".into())),
            Some(Current {
                record: &list[1],
                list: &list,
            }),
        )
        .unwrap();

        assert_eq!(
            plan.actions,
            vec![Action::Move {
                destination: "*1".to_string()
            }]
        );
        assert_eq!(plan.command_count(), 1);
    }

    #[test]
    fn test_plan_recreate_strategy() {
        let schema = ResourceSchema::new("queue", "/queue/simple")
            .ordered("place_before", PlacementStrategy::Recreate)
            .field("name", Field::string())
            .field("place_before", Field::string());
        let list = vec![
            record(&[(ID_KEY, "*1"), ("name", "a")]),
            record(&[(ID_KEY, "*2"), ("name", "b")]),
        ];

        let desired = Instance::new().with("name", "b2").with("place_before", "*1");
        let plan = plan(
            &schema,
            &desired,
            Some(Identity::Id("*2".into())),
            Some(Current {
                record: &list[1],
                list: &list,
            }),
        )
        .unwrap();

        assert_eq!(plan.actions, vec![Action::Delete, Action::Create]);
    }
}
