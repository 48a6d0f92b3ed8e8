//! Value types shared by the codec, resolver and engine
//!
//! - [`Value`]: tagged field value used by callers
//! - [`Instance`]: typed field map conforming to a resource schema
//! - [`Record`]: flat wire record as sent to / returned by the device
//! - [`FilterSet`]: ordered `field=value` constraints narrowing a read

use crate::identity::Identity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Flat wire record: wire key → wire string
pub type Record = BTreeMap<String, String>;

/// Tagged field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Value {
    /// Name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => write!(f, "{}", items.join(",")),
            Value::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::Map(map)
    }
}

/// Typed instance of a resource
///
/// Holds caller-facing field names (snake_case) and tagged values. The
/// identity is `None` for desired state that has not been created yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Addressing handle, set once the instance exists on the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,

    /// Field values
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Instance {
    /// Create an empty instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Builder-style identity setter
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field rendered as text, whatever its variant
    pub fn get_text(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(|v| v.to_string())
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// A single `field=value` read constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub value: String,
}

impl Filter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Check whether a record satisfies this constraint
    pub fn matches(&self, record: &Record) -> bool {
        record.get(&self.key).is_some_and(|v| *v == self.value)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Ordered set of read constraints, all of which must hold
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an unordered map, in sorted key order
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        Self {
            filters: map.iter().map(|(k, v)| Filter::new(k, v)).collect(),
        }
    }

    /// Builder-style constraint append
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Filter::new(key, value));
        self
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check whether a record satisfies every constraint
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Render as `key=value` strings
    pub fn to_strings(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.to_string()).collect()
    }

    /// Rewrite every key through `f` (field name → wire key)
    pub fn map_keys(&self, f: impl Fn(&str) -> String) -> Self {
        Self {
            filters: self
                .filters
                .iter()
                .map(|filter| Filter::new(f(&filter.key), filter.value.clone()))
                .collect(),
        }
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
