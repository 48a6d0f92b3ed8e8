//! Field and position diffing
//!
//! Only fields present in the desired instance are compared. Each pair is
//! compared in wire form under the field's diff-suppressor, so `1h` and
//! `3600s` are the same interval and no write is planned for them.

use crate::codec::{self, ID_KEY};
use crate::error::{Error, Result};
use crate::model::{Instance, Record, Value};
use crate::schema::{Field, ResourceSchema};
use std::fmt;

/// One field whose observed value differs from the desired one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    /// Value reported by the device, `None` if it reported nothing
    pub observed: Option<Value>,
    pub desired: Value,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.observed {
            Some(old) => write!(f, "{}: {} -> {}", self.field, old, self.desired),
            None => write!(f, "{}: (unset) -> {}", self.field, self.desired),
        }
    }
}

/// Compare desired fields against an observed instance
///
/// Computed fields, read filters and the placement field are never
/// compared. A field the
/// device does not report is taken to hold its declared default (or the
/// empty value), since RouterOS omits properties left at their default.
pub fn diff(schema: &ResourceSchema, desired: &Instance, observed: &Instance) -> Vec<FieldChange> {
    let placement_field = schema.placement().map(|p| p.field.as_str());

    desired
        .fields
        .iter()
        .filter(|(name, _)| Some(name.as_str()) != placement_field)
        .filter_map(|(name, value)| {
            let field = schema.get(name)?;
            if field.is_computed() || field.is_filter() {
                return None;
            }

            let current = observed.get(name);
            let same = match current {
                Some(current) => codec::values_equal(field, value, current),
                None => absent_matches(field, value),
            };

            (!same).then(|| FieldChange {
                field: name.clone(),
                observed: current.cloned(),
                desired: value.clone(),
            })
        })
        .collect()
}

fn absent_matches(field: &Field, desired: &Value) -> bool {
    if let Some(default) = &field.default
        && codec::values_equal(field, desired, default)
    {
        return true;
    }
    matches!(codec::encode_value(field, desired), Ok(raw) if raw.is_empty())
}

/// Wire parameters for a partial `set` carrying only `changes`
pub fn encode_changes(schema: &ResourceSchema, changes: &[FieldChange]) -> Result<Record> {
    let mut params = Record::new();
    for change in changes {
        let field = schema
            .get(&change.field)
            .ok_or_else(|| Error::validation(schema.name(), &change.field, "unknown field"))?;
        let raw = codec::encode_value(field, &change.desired)
            .map_err(|msg| Error::validation(schema.name(), &change.field, msg))?;
        params.insert(codec::wire_key(&change.field), raw);
    }
    Ok(params)
}

/// Check the list position of `current` against the desired placement
///
/// # Returns
///
/// - `Ok(None)`: The kind is unordered, no placement is desired, or the item
///   already sits immediately before its target
/// - `Ok(Some(id))`: The item must be moved before `id`
/// - `Err(Error::Validation)`: The target does not exist or is the item itself
pub fn placement(
    schema: &ResourceSchema,
    desired: &Instance,
    current: &Record,
    list: &[Record],
) -> Result<Option<String>> {
    let Some(placement) = schema.placement() else {
        return Ok(None);
    };
    let Some(target) = desired.get(&placement.field) else {
        return Ok(None);
    };
    let target = target.to_string();

    let own = current
        .get(ID_KEY)
        .ok_or_else(|| Error::decode(schema.name(), ID_KEY, "", "record carries no .id"))?;
    if *own == target {
        return Err(Error::validation(
            schema.name(),
            &placement.field,
            format!("item {} cannot be placed before itself", own),
        ));
    }

    let position_of = |id: &str| {
        list.iter()
            .position(|r| r.get(ID_KEY).is_some_and(|v| v == id))
    };

    let Some(target_pos) = position_of(target.as_str()) else {
        return Err(Error::validation(
            schema.name(),
            &placement.field,
            format!("no item with .id {} to place before", target),
        ));
    };

    match position_of(own.as_str()) {
        Some(pos) if pos + 1 == target_pos => Ok(None),
        _ => Ok(Some(target)),
    }
}
