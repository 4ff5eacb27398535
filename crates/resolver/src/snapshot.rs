//! Offline inventory snapshots
//!
//! A snapshot is a JSON document describing locations, the web apps they host
//! and the resources inside them. It implements the probe traits so a run can
//! be planned without cloud access. Snapshots are read-only: every move fails.
//!
//! ```json
//! {
//!   "locations": [
//!     {
//!       "name": "rg-target-A",
//!       "web_apps": ["app-iqon-sticos-123"],
//!       "resources": [{ "name": "kv-iqonsticos123", "kind": "key_vault" }]
//!     }
//!   ],
//!   "inaccessible": ["rg-locked"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tenant_relocator_common::{
    DiscoveredResource, LocationProbe, MoveCapability, ProbeError, ProbeResult,
    RelocatorError, ResourceKind, ResourceProbe, Result,
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InventorySnapshot {
    #[serde(default)]
    pub locations: Vec<LocationSnapshot>,
    /// Locations that exist but whose listings fail
    #[serde(default)]
    pub inaccessible: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LocationSnapshot {
    pub name: String,
    #[serde(default)]
    pub web_apps: Vec<String>,
    #[serde(default)]
    pub resources: Vec<SnapshotResource>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotResource {
    /// Derived from location, kind and name when omitted
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub kind: ResourceKind,
}

impl InventorySnapshot {
    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RelocatorError::Config(format!("Failed to read inventory {:?}: {}", path, e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    fn location(&self, name: &str) -> ProbeResult<&LocationSnapshot> {
        if self.inaccessible.iter().any(|l| l.eq_ignore_ascii_case(name)) {
            return Err(ProbeError::Other(format!(
                "access to location {name} denied"
            )));
        }
        self.locations
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ProbeError::Other(format!("location {name} not found")))
    }
}

impl SnapshotResource {
    fn resource_id(&self, location: &str) -> String {
        self.id.clone().unwrap_or_else(|| {
            let arm_type = self.kind.arm_type().unwrap_or("Microsoft.Resources/generic");
            format!(
                "/subscriptions/snapshot/resourceGroups/{}/providers/{}/{}",
                location, arm_type, self.name
            )
        })
    }
}

impl ResourceProbe for InventorySnapshot {
    fn list_resources(
        &self,
        kind: ResourceKind,
        location: &str,
    ) -> ProbeResult<Vec<DiscoveredResource>> {
        let snapshot = self.location(location)?;
        Ok(snapshot
            .resources
            .iter()
            .filter(|r| kind == ResourceKind::Generic || r.kind == kind)
            .map(|r| DiscoveredResource::new(r.resource_id(&snapshot.name), &r.name, kind))
            .collect())
    }
}

impl LocationProbe for InventorySnapshot {
    fn list_locations(&self) -> ProbeResult<Vec<String>> {
        Ok(self
            .locations
            .iter()
            .map(|l| l.name.clone())
            .chain(self.inaccessible.iter().cloned())
            .collect())
    }

    fn location_exists(&self, name: &str) -> ProbeResult<bool> {
        Ok(self
            .locations
            .iter()
            .any(|l| l.name.eq_ignore_ascii_case(name)))
    }

    fn list_web_apps(&self, location: &str) -> ProbeResult<Vec<String>> {
        Ok(self.location(location)?.web_apps.clone())
    }
}

impl MoveCapability for InventorySnapshot {
    fn move_resource(&self, resource_id: &str, _source: &str, _target: &str) -> ProbeResult<()> {
        Err(ProbeError::Unsupported(format!(
            "moving {resource_id} within an inventory snapshot"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "locations": [
            {
                "name": "rg-source",
                "resources": [
                    { "name": "kv-iqonsticos1", "kind": "key_vault" },
                    { "id": "/custom/sb", "name": "sb-iqon-sticos-1", "kind": "service_bus" }
                ]
            },
            { "name": "rg-target", "web_apps": ["app-iqon-sticos-1"] }
        ],
        "inaccessible": ["rg-locked"]
    }"#;

    #[test]
    fn test_lists_resources_by_kind() {
        let snapshot = InventorySnapshot::from_json(SNAPSHOT).unwrap();
        let vaults = snapshot
            .list_resources(ResourceKind::KeyVault, "rg-source")
            .unwrap();
        assert_eq!(vaults.len(), 1);
        assert_eq!(
            vaults[0].id,
            "/subscriptions/snapshot/resourceGroups/rg-source/providers/Microsoft.KeyVault/vaults/kv-iqonsticos1"
        );

        let everything = snapshot
            .list_resources(ResourceKind::Generic, "rg-source")
            .unwrap();
        assert_eq!(everything.len(), 2);
        assert_eq!(everything[1].id, "/custom/sb");
    }

    #[test]
    fn test_inaccessible_location_fails() {
        let snapshot = InventorySnapshot::from_json(SNAPSHOT).unwrap();
        assert!(snapshot.list_web_apps("rg-locked").is_err());
        assert!(snapshot.list_web_apps("rg-missing").is_err());
        assert_eq!(
            snapshot.list_web_apps("RG-TARGET").unwrap(),
            vec!["app-iqon-sticos-1".to_string()]
        );
    }

    #[test]
    fn test_location_queries() {
        let snapshot = InventorySnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.list_locations().unwrap().len(), 3);
        assert!(snapshot.location_exists("rg-target").unwrap());
        assert!(!snapshot.location_exists("rg-locked").unwrap());
    }

    #[test]
    fn test_moves_are_refused() {
        let snapshot = InventorySnapshot::default();
        let err = snapshot
            .move_resource("/x", "rg-source", "rg-target")
            .unwrap_err();
        assert!(matches!(err, ProbeError::Unsupported(_)));
    }
}
