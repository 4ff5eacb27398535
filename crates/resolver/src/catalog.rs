//! In-memory catalog of discovered resources

use serde::Serialize;
use std::collections::BTreeMap;
use tenant_relocator_common::ResourceKind;

/// A discovered resource tagged with its tenant and, once resolved, its destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    id: String,
    name: String,
    kind: ResourceKind,
    tenant_id: Option<String>,
    source_location: String,
    target_location: Option<String>,
}

impl ResourceEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ResourceKind,
        tenant_id: Option<String>,
        source_location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            tenant_id,
            source_location: source_location.into(),
            target_location: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn source_location(&self) -> &str {
        &self.source_location
    }

    pub fn target_location(&self) -> Option<&str> {
        self.target_location.as_deref()
    }

    pub fn is_resolved(&self) -> bool {
        self.target_location.is_some()
    }

    /// Only the resolver assigns targets
    pub(crate) fn set_target(&mut self, location: &str) {
        self.target_location = Some(location.to_string());
    }
}

/// Append-only collection of discovered resources
///
/// Populated completely during discovery, then enriched and pruned by the
/// resolver. Not shared between threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceCatalog {
    entries: Vec<ResourceEntry>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; duplicates are not detected
    pub fn add(&mut self, entry: ResourceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose tenant id equals `tenant_id` exactly
    pub fn filter_by_tenant(&self, tenant_id: &str) -> Vec<&ResourceEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.tenant_id() == Some(tenant_id))
            .collect()
    }

    /// Partition tagged entries by tenant id; untagged entries are left out
    pub fn group_by_tenant(&self) -> BTreeMap<&str, Vec<&ResourceEntry>> {
        let mut groups: BTreeMap<&str, Vec<&ResourceEntry>> = BTreeMap::new();
        for entry in &self.entries {
            if let Some(tenant) = entry.tenant_id() {
                groups.entry(tenant).or_default().push(entry);
            }
        }
        groups
    }

    /// Distinct tenant ids, in sorted order
    pub fn tenant_ids(&self) -> Vec<String> {
        self.group_by_tenant()
            .into_keys()
            .map(String::from)
            .collect()
    }

    /// Remove the first entry equal to `entry`; returns whether one was found
    pub fn remove(&mut self, entry: &ResourceEntry) -> bool {
        match self.entries.iter().position(|e| e == entry) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every entry matching `predicate`, returning how many were removed
    pub fn remove_all<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&ResourceEntry) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|entry| !predicate(entry));
        before - self.entries.len()
    }

    /// Keep only the first `limit` entries, returning how many were dropped
    pub fn truncate(&mut self, limit: usize) -> usize {
        let dropped = self.entries.len().saturating_sub(limit);
        self.entries.truncate(limit);
        dropped
    }

    /// Assign `location` to every entry of `tenant_id`, returning the count
    pub(crate) fn assign_tenant_target(&mut self, tenant_id: &str, location: &str) -> usize {
        let mut assigned = 0;
        for entry in &mut self.entries {
            if entry.tenant_id() == Some(tenant_id) {
                entry.set_target(location);
                assigned += 1;
            }
        }
        assigned
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut ResourceEntry> {
        self.entries.iter_mut()
    }
}

impl<'a> IntoIterator for &'a ResourceCatalog {
    type Item = &'a ResourceEntry;
    type IntoIter = std::slice::Iter<'a, ResourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
