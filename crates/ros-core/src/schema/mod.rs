//! Resource schemas
//!
//! A [`ResourceSchema`] is the declarative description of one resource kind:
//! where it lives on the device, how instances are addressed, whether list
//! position matters, and an ordered map of [`Field`] declarations.
//!
//! Schemas are immutable once built. The [`SchemaRegistry`] holds them for
//! the lifetime of the process and is shared read-only.

pub mod props;
pub mod registry;
pub mod resources;

pub use registry::SchemaRegistry;

use crate::codec::duration;
use crate::error::{Error, Result};
use crate::identity::IdKind;
use crate::model::{FilterSet, Instance, Value};
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Bool,
    List,
    Map,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::List => "list",
            FieldType::Map => "map",
        }
    }
}

/// Who supplies a field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present in desired state
    Required,
    /// May be present in desired state
    Optional,
    /// Assigned by the device only; never part of desired state
    Computed,
    /// Map of extra read constraints used to locate the item; never sent
    /// to the device and never compared
    Filter,
}

/// Wire encoding rule for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Natural rendering of the semantic type (bool as "true"/"false",
    /// list comma-joined, map as comma-joined `k=v`)
    Plain,
    /// Compact time string (`1h30m`, `500ms`); integers are seconds
    Duration,
    /// Literal `auto` or an integer, passed through
    AutoOrInt,
    /// Boolean as "yes"/"no"
    YesNo,
    /// Integer rendered as `0x..`; accepts decimal or hex on input
    Hex,
    /// List joined by a custom delimiter
    Delimited(char),
}

/// Validation rule applied to a desired (and decoded) value
#[derive(Clone)]
pub enum Validator {
    /// Value must be one of the listed strings
    OneOf(&'static [&'static str]),
    /// Rendered value must match the pattern
    Pattern(Regex, &'static str),
    /// Integer within an inclusive range
    IntRange(i64, i64),
    /// Literal `auto` or an integer in `0..=65535`
    Mtu,
    /// Arbitrary rule
    Custom(fn(&Value) -> std::result::Result<(), String>),
}

impl Validator {
    /// Compile a pattern validator from a static expression
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regular expression. Patterns are
    /// compile-time literals, so this is a schema definition bug.
    pub fn pattern(pattern: &'static str, message: &'static str) -> Self {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid validator pattern {:?}: {}", pattern, e));
        Validator::Pattern(regex, message)
    }

    /// Check a value against this rule
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        match self {
            Validator::OneOf(allowed) => {
                let text = value.to_string();
                if allowed.contains(&text.as_str()) {
                    Ok(())
                } else {
                    Err(format!(
                        "expected one of [{}], got {}",
                        allowed.join(", "),
                        text
                    ))
                }
            }
            Validator::Pattern(regex, message) => {
                if regex.is_match(&value.to_string()) {
                    Ok(())
                } else {
                    Err((*message).to_string())
                }
            }
            Validator::IntRange(min, max) => {
                let n = match value {
                    Value::Int(n) => *n,
                    Value::String(s) => crate::codec::parse_int(s)
                        .map_err(|_| format!("expected integer, got {}", s))?,
                    other => return Err(format!("expected integer, got {}", other.kind())),
                };
                if (*min..=*max).contains(&n) {
                    Ok(())
                } else {
                    Err(format!(
                        "expected value in the range ({} - {}), got {}",
                        min, max, n
                    ))
                }
            }
            Validator::Mtu => validate_mtu(value),
            Validator::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::OneOf(allowed) => f.debug_tuple("OneOf").field(allowed).finish(),
            Validator::Pattern(regex, _) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Validator::IntRange(min, max) => f.debug_tuple("IntRange").field(min).field(max).finish(),
            Validator::Mtu => f.write_str("Mtu"),
            Validator::Custom(_) => f.write_str("Custom"),
        }
    }
}

fn validate_mtu(value: &Value) -> std::result::Result<(), String> {
    let n = match value {
        Value::String(s) if s == "auto" => return Ok(()),
        Value::String(s) => crate::codec::parse_int(s)
            .map_err(|_| format!("Expected MTU value to be integer or 'auto', got {}", s))?,
        Value::Int(n) => *n,
        other => {
            return Err(format!(
                "Expected MTU value to be integer or 'auto', got {}",
                other.kind()
            ));
        }
    };

    if !(0..=65535).contains(&n) {
        return Err(format!(
            "Expected MTU value to be in the range (0 - 65535), got {}",
            n
        ));
    }
    Ok(())
}

/// Rule declaring two textually different wire values semantically equal
#[derive(Clone, Copy)]
pub enum DiffSuppress {
    /// Never report a difference (internal/service fields)
    Always,
    /// Compare as durations, down to the millisecond
    Duration,
    /// Compare as integers, accepting decimal or `0x` hex
    Hex,
    /// Arbitrary rule over (old, new) wire values
    Custom(fn(&str, &str) -> bool),
}

impl DiffSuppress {
    /// Return true if `old` and `new` should be treated as equal
    pub fn suppress(&self, old: &str, new: &str) -> bool {
        if old == new {
            return true;
        }

        match self {
            DiffSuppress::Always => true,
            DiffSuppress::Duration => {
                if old.is_empty() || new.is_empty() {
                    return false;
                }
                match (duration::parse(old), duration::parse(new)) {
                    (Ok(o), Ok(n)) => o == n,
                    _ => {
                        tracing::debug!("Duration comparison on unparsable value: {:?} vs {:?}", old, new);
                        false
                    }
                }
            }
            DiffSuppress::Hex => {
                if old.is_empty() || new.is_empty() {
                    return false;
                }
                match (crate::codec::parse_int(old), crate::codec::parse_int(new)) {
                    (Ok(o), Ok(n)) => o == n,
                    _ => false,
                }
            }
            DiffSuppress::Custom(f) => f(old, new),
        }
    }
}

impl fmt::Debug for DiffSuppress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiffSuppress::Always => "Always",
            DiffSuppress::Duration => "Duration",
            DiffSuppress::Hex => "Hex",
            DiffSuppress::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

/// Declaration of a single field
#[derive(Debug, Clone)]
pub struct Field {
    pub field_type: FieldType,
    pub presence: Presence,
    pub default: Option<Value>,
    pub validator: Option<Validator>,
    pub suppress: Option<DiffSuppress>,
    pub encoding: Encoding,
    pub description: &'static str,
}

impl Field {
    fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            presence: Presence::Optional,
            default: None,
            validator: None,
            suppress: None,
            encoding: Encoding::Plain,
            description: "",
        }
    }

    pub fn string() -> Self {
        Self::of(FieldType::String)
    }

    pub fn int() -> Self {
        Self::of(FieldType::Int)
    }

    pub fn bool() -> Self {
        Self::of(FieldType::Bool)
    }

    pub fn list() -> Self {
        Self::of(FieldType::List)
    }

    pub fn map() -> Self {
        Self::of(FieldType::Map)
    }

    pub fn required(mut self) -> Self {
        self.presence = Presence::Required;
        self
    }

    pub fn computed(mut self) -> Self {
        self.presence = Presence::Computed;
        self
    }

    /// Mark a map field as read constraints rather than a property
    pub fn read_filter(mut self) -> Self {
        self.presence = Presence::Filter;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn suppress_diff(mut self, suppress: DiffSuppress) -> Self {
        self.suppress = Some(suppress);
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn is_computed(&self) -> bool {
        self.presence == Presence::Computed
    }

    pub fn is_filter(&self) -> bool {
        self.presence == Presence::Filter
    }

    /// Check that a value's variant fits this field
    pub fn check_type(&self, value: &Value) -> std::result::Result<(), String> {
        let ok = match (self.encoding, self.field_type, value) {
            (Encoding::AutoOrInt, _, Value::String(_) | Value::Int(_)) => true,
            (Encoding::Duration, _, Value::String(_) | Value::Int(_)) => true,
            (_, FieldType::String, Value::String(_)) => true,
            (_, FieldType::Int, Value::Int(_)) => true,
            (_, FieldType::Bool, Value::Bool(_)) => true,
            (_, FieldType::List, Value::List(_)) => true,
            (_, FieldType::Map, Value::Map(_)) => true,
            _ => false,
        };

        if ok {
            Ok(())
        } else {
            Err(format!(
                "expected {} value, got {}",
                self.field_type.as_str(),
                value.kind()
            ))
        }
    }
}

/// How a list position change is applied on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    /// Atomic in-place `move`
    Move,
    /// Remove the item and add it again at the new position
    Recreate,
}

/// Ordering declaration for list-positioned resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Field carrying the `.id` the item must sit before
    pub field: String,
    pub strategy: PlacementStrategy,
}

/// Declarative description of one resource kind
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    name: String,
    path: String,
    id_kind: IdKind,
    placement: Option<Placement>,
    fields: IndexMap<String, Field>,
}

impl ResourceSchema {
    /// Start a schema for `name`, stored on the device at `path`
    ///
    /// Instances are addressed by `.id` until [`ResourceSchema::keyed_by`]
    /// says otherwise.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            id_kind: IdKind::Id,
            placement: None,
            fields: IndexMap::new(),
        }
    }

    /// Address instances by a natural key field
    pub fn keyed_by(mut self, field: impl Into<String>) -> Self {
        self.id_kind = IdKind::Key(field.into());
        self
    }

    /// Declare a list-position field and how moves are applied
    pub fn ordered(mut self, field: impl Into<String>, strategy: PlacementStrategy) -> Self {
        self.placement = Some(Placement {
            field: field.into(),
            strategy,
        });
        self
    }

    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id_kind(&self) -> &IdKind {
        &self.id_kind
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Diff-suppression hook: are two wire values of `field` equal?
    pub fn suppress_diff(&self, field: &str, old: &str, new: &str) -> bool {
        if old == new {
            return true;
        }
        self.fields
            .get(field)
            .and_then(|f| f.suppress)
            .is_some_and(|s| s.suppress(old, new))
    }

    /// Check a desired instance before any remote call
    ///
    /// Rejects unknown fields, computed fields supplied by the caller,
    /// missing required fields, values of the wrong variant and values
    /// failing their validator.
    pub fn validate(&self, instance: &Instance) -> Result<()> {
        self.validate_fields(instance)?;

        for (name, field) in &self.fields {
            if field.presence == Presence::Required && !instance.contains(name) {
                return Err(Error::validation(&self.name, name, "required field is missing"));
            }
        }

        Ok(())
    }

    /// Like [`ResourceSchema::validate`] but for partial state: required
    /// fields may be absent
    pub fn validate_fields(&self, instance: &Instance) -> Result<()> {
        for (name, value) in &instance.fields {
            let field = self.fields.get(name).ok_or_else(|| {
                Error::validation(&self.name, name, "unknown field")
            })?;

            if field.is_computed() {
                return Err(Error::validation(
                    &self.name,
                    name,
                    "computed field cannot be set in desired state",
                ));
            }

            field
                .check_type(value)
                .map_err(|msg| Error::validation(&self.name, name, msg))?;

            if let Some(validator) = &field.validator {
                validator
                    .validate(value)
                    .map_err(|msg| Error::validation(&self.name, name, msg))?;
            }
        }

        Ok(())
    }

    /// Read constraints carried by `instance` in its filter fields
    ///
    /// Keys are used as given; several filter fields are concatenated in
    /// declaration order, each in sorted key order.
    pub fn read_filters(&self, instance: &Instance) -> FilterSet {
        let mut filters = FilterSet::new();
        for (name, field) in &self.fields {
            if !field.is_filter() {
                continue;
            }
            if let Some(Value::Map(map)) = instance.get(name) {
                for filter in FilterSet::from_map(map).iter() {
                    filters.push(filter.clone());
                }
            }
        }
        filters
    }

    /// Copy of `instance` with declared defaults filled for absent fields
    pub fn with_defaults(&self, instance: &Instance) -> Instance {
        let mut out = instance.clone();
        for (name, field) in &self.fields {
            if let Some(default) = &field.default
                && !out.contains(name)
            {
                out.set(name.clone(), default.clone());
            }
        }
        out
    }
}
