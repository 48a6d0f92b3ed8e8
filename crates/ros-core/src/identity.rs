//! Identity resolution
//!
//! Every resource kind has one authoritative way of being addressed:
//!
//! - [`IdKind::Id`]: the opaque `.id` the device assigns (`*1`, `*1A`),
//!   stable across renames
//! - [`IdKind::Key`]: a user-assigned natural key field, usually `name`
//!
//! Write operations (`set`, `remove`, `move`) always need the opaque id,
//! so natural-key identities are resolved against observed records first.
//! A failed resolution is [`Error::NotFound`]: the item was removed out of
//! band and must be created again.

use crate::codec::{self, ID_KEY};
use crate::error::{Error, Result};
use crate::model::{Filter, Record};
use crate::schema::ResourceSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How instances of a resource kind are addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdKind {
    /// Device-assigned `.id`
    Id,
    /// Natural key field (field name, not wire key)
    Key(String),
}

/// Addressing handle of one resource instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Identity {
    /// Opaque device id
    Id(String),
    /// Natural key value
    Name(String),
}

impl Identity {
    pub fn value(&self) -> &str {
        match self {
            Identity::Id(v) | Identity::Name(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Id(id) => write!(f, "{}={}", ID_KEY, id),
            Identity::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Wire filter selecting the record addressed by `identity`
pub fn to_filter(schema: &ResourceSchema, identity: &Identity) -> Result<Filter> {
    match identity {
        Identity::Id(id) => Ok(Filter::new(ID_KEY, id.clone())),
        Identity::Name(value) => match schema.id_kind() {
            IdKind::Key(field) => Ok(Filter::new(codec::wire_key(field), value.clone())),
            IdKind::Id => Err(Error::validation(
                schema.name(),
                ID_KEY,
                format!("{} is addressed by {} only, got natural key {:?}", schema.name(), ID_KEY, value),
            )),
        },
    }
}

/// Find the observed record addressed by `identity`
///
/// # Returns
///
/// - `Ok(&Record)`: The matching record
/// - `Err(Error::NotFound)`: If no record matches
pub fn locate<'a>(
    schema: &ResourceSchema,
    identity: &Identity,
    observed: &'a [Record],
) -> Result<&'a Record> {
    let filter = to_filter(schema, identity)?;
    observed
        .iter()
        .find(|record| filter.matches(record))
        .ok_or_else(|| Error::not_found(format!("{} {}", schema.name(), identity)))
}

/// Resolve `identity` to the opaque device id
///
/// Natural keys are looked up in `observed` and the `.id` found alongside
/// the key is returned; opaque ids are verified present.
pub fn resolve(
    schema: &ResourceSchema,
    identity: &Identity,
    observed: &[Record],
) -> Result<Identity> {
    let record = locate(schema, identity, observed)?;
    let id = record.get(ID_KEY).ok_or_else(|| {
        Error::decode(schema.name(), ID_KEY, "", "record carries no .id")
    })?;
    Ok(Identity::Id(id.clone()))
}

/// Authoritative identity of an observed record, per the schema's kind
pub fn authoritative(schema: &ResourceSchema, record: &Record) -> Result<Identity> {
    match schema.id_kind() {
        IdKind::Id => record
            .get(ID_KEY)
            .map(|id| Identity::Id(id.clone()))
            .ok_or_else(|| Error::decode(schema.name(), ID_KEY, "", "record carries no .id")),
        IdKind::Key(field) => record
            .get(&codec::wire_key(field))
            .map(|key| Identity::Name(key.clone()))
            .ok_or_else(|| {
                Error::decode(schema.name(), field, "", "record carries no natural key")
            }),
    }
}
