//! Property codec
//!
//! Converts between typed [`Instance`]s and flat wire [`Record`]s.
//!
//! ## Conventions
//!
//! - Field names are snake_case, wire keys kebab-case (`on_event` ↔ `on-event`)
//! - The device-assigned identifier travels as `.id` and is not a field
//! - Encoding failures are validation errors (caller fault, raised before
//!   any remote call); decoding failures are decode errors (device format
//!   change or schema bug)

pub mod duration;

use crate::error::{Error, Result};
use crate::identity;
use crate::model::{Instance, Record, Value};
use crate::schema::{Encoding, Field, FieldType, ResourceSchema};
use std::collections::BTreeMap;
use tracing::trace;

/// Wire key of the device-assigned identifier
pub const ID_KEY: &str = ".id";

/// Field name → wire key
pub fn wire_key(field: &str) -> String {
    field.replace('_', "-")
}

/// Wire key → field name
pub fn field_key(wire: &str) -> String {
    wire.replace('-', "_")
}

/// Parse an integer in decimal or `0x` hexadecimal
pub fn parse_int(raw: &str) -> std::result::Result<i64, String> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .map_err(|_| format!("expected integer, got {:?}", raw))?;

    Ok(if negative { -parsed } else { parsed })
}

fn parse_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        other => Err(format!("expected boolean, got {:?}", other)),
    }
}

/// Encode a typed instance into a wire record
///
/// Every field must be declared by the schema and must not be computed.
/// Values are type-checked and validated before encoding.
pub fn encode(instance: &Instance, schema: &ResourceSchema) -> Result<Record> {
    let mut record = Record::new();

    for (name, value) in &instance.fields {
        let field = schema
            .get(name)
            .ok_or_else(|| Error::validation(schema.name(), name, "unknown field"))?;

        if field.is_filter() {
            continue;
        }

        if field.is_computed() {
            return Err(Error::validation(
                schema.name(),
                name,
                "computed field cannot be set in desired state",
            ));
        }

        if let Some(validator) = &field.validator {
            validator
                .validate(value)
                .map_err(|msg| Error::validation(schema.name(), name, msg))?;
        }

        let raw = encode_value(field, value)
            .map_err(|msg| Error::validation(schema.name(), name, msg))?;
        record.insert(wire_key(name), raw);
    }

    Ok(record)
}

/// Encode a single field value
pub fn encode_value(field: &Field, value: &Value) -> std::result::Result<String, String> {
    field.check_type(value)?;

    match (field.encoding, value) {
        (Encoding::Duration, Value::Int(seconds)) => chrono::TimeDelta::try_seconds(*seconds)
            .map(duration::format)
            .ok_or_else(|| format!("duration out of range: {}", seconds)),
        (Encoding::Duration, Value::String(s)) => {
            duration::parse(s)?;
            Ok(s.clone())
        }
        (Encoding::AutoOrInt, Value::String(s)) if s == "auto" => Ok(s.clone()),
        (Encoding::AutoOrInt, Value::String(s)) => {
            let n = parse_int(s).map_err(|_| format!("expected integer or 'auto', got {}", s))?;
            Ok(n.to_string())
        }
        (Encoding::AutoOrInt, Value::Int(n)) => Ok(n.to_string()),
        (Encoding::YesNo, Value::Bool(b)) => Ok(if *b { "yes" } else { "no" }.to_string()),
        (Encoding::Hex, Value::Int(n)) => Ok(format!("0x{:x}", n)),
        (Encoding::Delimited(sep), Value::List(items)) => Ok(items.join(sep.to_string().as_str())),
        (_, Value::String(s)) => Ok(s.clone()),
        (_, Value::Int(n)) => Ok(n.to_string()),
        (_, Value::Bool(b)) => Ok(b.to_string()),
        (_, Value::List(items)) => Ok(items.join(",")),
        (_, Value::Map(map)) => {
            for key in map.keys() {
                if key.contains('=') || key.contains(',') {
                    return Err(format!("map key {:?} cannot contain '=' or ','", key));
                }
            }
            let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            Ok(parts.join(","))
        }
    }
}

/// Decode a wire record into a typed instance
///
/// Wire keys the schema does not declare are skipped (the device reports
/// more than any schema models). The identity is filled from the record
/// according to the schema's identity kind when present.
pub fn decode(record: &Record, schema: &ResourceSchema) -> Result<Instance> {
    let mut instance = Instance::new();

    for (wire, raw) in record {
        if wire == ID_KEY {
            continue;
        }

        let name = field_key(wire);
        let Some(field) = schema.get(&name).filter(|f| !f.is_filter()) else {
            trace!("{}: ignoring undeclared wire key {}", schema.name(), wire);
            continue;
        };

        let value = decode_value(field, raw)
            .map_err(|msg| Error::decode(schema.name(), &name, raw, msg))?;

        if !field.is_computed()
            && let Some(validator) = &field.validator
        {
            validator
                .validate(&value)
                .map_err(|msg| Error::decode(schema.name(), &name, raw, msg))?;
        }

        instance.set(name, value);
    }

    instance.identity = identity::authoritative(schema, record).ok();
    Ok(instance)
}

/// Decode a single wire value
pub fn decode_value(field: &Field, raw: &str) -> std::result::Result<Value, String> {
    match (field.encoding, field.field_type) {
        (Encoding::Duration, _) => {
            duration::parse(raw)?;
            Ok(Value::String(raw.to_string()))
        }
        (Encoding::AutoOrInt, _) => {
            if raw == "auto" {
                return Ok(Value::String(raw.to_string()));
            }
            parse_int(raw)
                .map(Value::Int)
                .map_err(|_| format!("expected integer or 'auto', got {}", raw))
        }
        (Encoding::Hex, _) | (_, FieldType::Int) => parse_int(raw).map(Value::Int),
        (_, FieldType::Bool) => parse_bool(raw).map(Value::Bool),
        (_, FieldType::List) => {
            let sep = match field.encoding {
                Encoding::Delimited(sep) => sep,
                _ => ',',
            };
            Ok(Value::List(
                raw.split(sep)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ))
        }
        (_, FieldType::Map) => {
            let mut map = BTreeMap::new();
            for fragment in raw.split(',').filter(|s| !s.is_empty()) {
                let (k, v) = fragment
                    .split_once('=')
                    .ok_or_else(|| format!("expected k=v fragment, got {:?}", fragment))?;
                map.insert(k.to_string(), v.to_string());
            }
            Ok(Value::Map(map))
        }
        (_, FieldType::String) => Ok(Value::String(raw.to_string())),
    }
}

/// Compare two values of `field` under its diff-suppressor
///
/// Values are compared in wire form. Unencodable values never compare
/// equal.
pub fn values_equal(field: &Field, desired: &Value, observed: &Value) -> bool {
    if desired == observed {
        return true;
    }

    match (encode_value(field, desired), encode_value(field, observed)) {
        (Ok(new), Ok(old)) => {
            old == new || field.suppress.is_some_and(|s| s.suppress(&old, &new))
        }
        _ => false,
    }
}
