//! Schema registry
//!
//! Maps resource kind names to their [`ResourceSchema`]. The registry is
//! built once and never mutated afterwards, so it is shared by reference
//! (or `Arc`) without any locking.

use super::{resources, ResourceSchema};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::sync::LazyLock;

static BUILTIN: LazyLock<SchemaRegistry> =
    LazyLock::new(|| resources::builtin().into_iter().collect());

/// Immutable lookup table of resource schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, ResourceSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the built-in resource kinds, built on first use
    pub fn builtin() -> &'static SchemaRegistry {
        &BUILTIN
    }

    /// Builder-style registration
    ///
    /// A later schema with the same name replaces the earlier one.
    pub fn with(mut self, schema: ResourceSchema) -> Self {
        self.schemas.insert(schema.name().to_string(), schema);
        self
    }

    /// Look up a schema by kind name
    ///
    /// # Returns
    ///
    /// - `Ok(&ResourceSchema)`: The schema
    /// - `Err(Error::UnknownResource)`: If no such kind is registered
    pub fn define(&self, name: &str) -> Result<&ResourceSchema> {
        self.schemas
            .get(name)
            .ok_or_else(|| Error::UnknownResource(name.to_string()))
    }

    /// Schema introspection for the hosting framework (alias of `define`)
    pub fn fields(&self, name: &str) -> Result<&ResourceSchema> {
        self.define(name)
    }

    /// Look up a schema by device path
    pub fn by_path(&self, path: &str) -> Option<&ResourceSchema> {
        self.schemas.values().find(|s| s.path() == path)
    }

    pub fn has(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered kind names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }
}

impl FromIterator<ResourceSchema> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = ResourceSchema>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with)
    }
}
