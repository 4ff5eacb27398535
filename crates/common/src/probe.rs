//! Capabilities the relocator needs from a cloud backend
//!
//! The resolver only talks to these traits; the Azure CLI backend and the
//! inventory snapshot implement them.

use crate::{DiscoveredResource, ProbeError, ResourceKind};

/// Result of a single probe call
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Lists resources of one kind inside a location
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait ResourceProbe {
    fn list_resources(
        &self,
        kind: ResourceKind,
        location: &str,
    ) -> ProbeResult<Vec<DiscoveredResource>>;
}

/// Read-only view of locations and the web apps they contain
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait LocationProbe {
    /// Every location visible to the current credential
    fn list_locations(&self) -> ProbeResult<Vec<String>>;

    fn location_exists(&self, name: &str) -> ProbeResult<bool>;

    /// Names of the web apps inside `location`
    fn list_web_apps(&self, location: &str) -> ProbeResult<Vec<String>>;
}

/// Moves one resource between locations
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait MoveCapability {
    fn move_resource(&self, resource_id: &str, source: &str, target: &str) -> ProbeResult<()>;
}

/// Ordered composition of listing probes
///
/// Each tier is tried in turn and the first successful listing wins. A typed
/// listing that needs service-level permissions usually comes first, with a
/// generic resource listing behind it.
pub struct FallbackProbe<'a> {
    tiers: Vec<(String, Box<dyn ResourceProbe + 'a>)>,
    verbose: bool,
}

impl<'a> FallbackProbe<'a> {
    pub fn new() -> Self {
        Self {
            tiers: Vec::new(),
            verbose: false,
        }
    }

    /// Append a tier; tiers are tried in insertion order
    pub fn tier(mut self, name: impl Into<String>, probe: impl ResourceProbe + 'a) -> Self {
        self.tiers.push((name.into(), Box::new(probe)));
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn tier_names(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|(name, _)| name.as_str())
    }

    fn log(&self, message: &str) {
        if self.verbose {
            eprintln!("{message}");
        }
    }
}

impl Default for FallbackProbe<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for FallbackProbe<'_> {
    fn list_resources(
        &self,
        kind: ResourceKind,
        location: &str,
    ) -> ProbeResult<Vec<DiscoveredResource>> {
        if self.tiers.is_empty() {
            return Err(ProbeError::Other("no listing tiers configured".to_string()));
        }

        let mut failures = Vec::new();
        for (name, probe) in &self.tiers {
            match probe.list_resources(kind, location) {
                Ok(resources) => {
                    if !failures.is_empty() {
                        self.log(&format!(
                            "Listed {kind} in {location} via {name} after {} failed tier(s)",
                            failures.len()
                        ));
                    }
                    return Ok(resources);
                }
                Err(e) => {
                    self.log(&format!("{name} listing of {kind} in {location} failed: {e}"));
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        Err(ProbeError::Other(format!(
            "all listing tiers failed for {kind} in {location} ({})",
            failures.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn vault(name: &str) -> DiscoveredResource {
        DiscoveredResource::new(format!("/vaults/{name}"), name, ResourceKind::KeyVault)
    }

    #[test]
    fn test_first_tier_wins() {
        let mut typed = MockResourceProbe::new();
        typed
            .expect_list_resources()
            .with(eq(ResourceKind::KeyVault), eq("rg-source"))
            .times(1)
            .returning(|_, _| Ok(vec![vault("kv-iqonsticos1")]));

        let mut generic = MockResourceProbe::new();
        generic.expect_list_resources().never();

        let probe = FallbackProbe::new()
            .tier("typed", typed)
            .tier("generic", generic);
        let resources = probe
            .list_resources(ResourceKind::KeyVault, "rg-source")
            .unwrap();
        assert_eq!(resources, vec![vault("kv-iqonsticos1")]);
    }

    #[test]
    fn test_falls_back_on_failure() {
        let mut typed = MockResourceProbe::new();
        typed
            .expect_list_resources()
            .times(1)
            .returning(|_, _| Err(ProbeError::Other("AuthorizationFailed".to_string())));

        let mut generic = MockResourceProbe::new();
        generic
            .expect_list_resources()
            .times(1)
            .returning(|_, _| Ok(vec![vault("kv-iqonsticos2")]));

        let probe = FallbackProbe::new()
            .tier("typed", typed)
            .tier("generic", generic);
        let resources = probe
            .list_resources(ResourceKind::KeyVault, "rg-source")
            .unwrap();
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn test_all_tiers_failing_reports_each() {
        let mut typed = MockResourceProbe::new();
        typed
            .expect_list_resources()
            .returning(|_, _| Err(ProbeError::Other("denied".to_string())));
        let mut generic = MockResourceProbe::new();
        generic
            .expect_list_resources()
            .returning(|_, _| Err(ProbeError::Other("timeout".to_string())));

        let probe = FallbackProbe::new()
            .tier("typed", typed)
            .tier("generic", generic);
        let err = probe
            .list_resources(ResourceKind::ServiceBus, "rg-source")
            .unwrap_err()
            .to_string();
        assert!(err.contains("typed: denied"));
        assert!(err.contains("generic: timeout"));
    }

    #[test]
    fn test_empty_probe_fails() {
        let probe = FallbackProbe::new();
        assert!(probe
            .list_resources(ResourceKind::KeyVault, "rg-source")
            .is_err());
    }
}
