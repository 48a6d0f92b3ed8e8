//! Desired-state manifests
//!
//! A manifest is a JSON document listing resource instances in the order
//! they should be reconciled:
//!
//! ```json
//! {
//!   "resources": [
//!     {
//!       "kind": "system_scheduler",
//!       "fields": { "name": "backup", "on_event": "backup-script", "interval": "1d" }
//!     },
//!     {
//!       "kind": "ip_firewall_filter",
//!       "identity": { "kind": "id", "value": "*A" },
//!       "fields": { "chain": "input", "action": "drop", "place_before": "*3" }
//!     },
//!     {
//!       "kind": "interface_vlan",
//!       "ensure": "absent",
//!       "fields": { "name": "vlan-old" }
//!     }
//!   ]
//! }
//! ```

use crate::error::{Error, Result};
use crate::identity::{IdKind, Identity};
use crate::model::{Instance, Value};
use crate::schema::SchemaRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Whether a manifest entry should exist on the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

/// One desired resource instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Resource kind name (e.g. `system_scheduler`)
    pub kind: String,

    /// Explicit identity, for kinds addressed by `.id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,

    #[serde(default)]
    pub ensure: Ensure,

    /// Desired field values
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl ManifestEntry {
    /// Desired state as a typed instance
    pub fn to_instance(&self) -> Instance {
        Instance {
            identity: self.identity.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Identity addressing this entry: explicit, or the natural key field
    pub fn identity(&self, schemas: &SchemaRegistry) -> Result<Option<Identity>> {
        if let Some(identity) = &self.identity {
            return Ok(Some(identity.clone()));
        }
        Ok(match schemas.define(&self.kind)?.id_kind() {
            IdKind::Key(field) => self.fields.get(field).map(|v| Identity::Name(v.to_string())),
            IdKind::Id => None,
        })
    }
}

/// Ordered list of desired resource instances
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub resources: Vec<ManifestEntry>,
}

impl Manifest {
    /// Load a manifest from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let manifest: Manifest = serde_json::from_str(&contents)?;
        debug!(
            "Loaded {} resources from {}",
            manifest.resources.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Check that every entry names a known kind and can be addressed
    ///
    /// Field values are not checked here; the engine validates them before
    /// any remote call.
    pub fn validate(&self, schemas: &SchemaRegistry) -> Result<()> {
        if self.resources.is_empty() {
            return Err(Error::config("Manifest contains no resources"));
        }

        for (index, entry) in self.resources.iter().enumerate() {
            let identity = entry.identity(schemas).map_err(|e| {
                Error::config(format!("resources[{}]: {}", index, e))
            })?;

            if entry.ensure == Ensure::Absent && identity.is_none() {
                return Err(Error::config(format!(
                    "resources[{}]: {} marked absent needs an identity",
                    index, entry.kind
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MANIFEST: &str = r#"{
        "resources": [
            {"kind": "system_scheduler", "fields": {"name": "backup", "interval": "1d"}},
            {"kind": "ip_firewall_filter", "identity": {"kind": "id", "value": "*A"},
             "fields": {"chain": "input", "action": "drop"}},
            {"kind": "interface_vlan", "ensure": "absent", "fields": {"name": "vlan-old"}}
        ]
    }"#;

    #[tokio::test]
    async fn test_manifest_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = Manifest::load(file.path()).await.unwrap();
        assert_eq!(manifest.resources.len(), 3);
        assert_eq!(manifest.resources[2].ensure, Ensure::Absent);
        assert!(manifest.validate(SchemaRegistry::builtin()).is_ok());

        let schemas = SchemaRegistry::builtin();
        assert_eq!(
            manifest.resources[0].identity(schemas).unwrap(),
            Some(Identity::Name("backup".into()))
        );
        assert_eq!(
            manifest.resources[1].identity(schemas).unwrap(),
            Some(Identity::Id("*A".into()))
        );
    }

    #[tokio::test]
    async fn test_manifest_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_manifest_validate_unknown_kind() {
        let manifest: Manifest = serde_json::from_str(
            r#"{"resources": [{"kind": "ip_route", "fields": {}}]}"#,
        )
        .unwrap();

        let err = manifest.validate(SchemaRegistry::builtin()).unwrap_err();
        assert!(err.to_string().contains("ip_route"));
    }

    #[test]
    fn test_manifest_absent_requires_identity() {
        let manifest: Manifest = serde_json::from_str(
            r#"{"resources": [{"kind": "ip_firewall_filter", "ensure": "absent"}]}"#,
        )
        .unwrap();

        assert!(matches!(
            manifest.validate(SchemaRegistry::builtin()),
            Err(Error::Config(_))
        ));
    }
}
