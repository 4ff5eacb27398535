//! Assign a destination location to every catalog entry

use crate::{diagnostics::Diagnostic, locator::WebAppLocator, ResourceCatalog};
use regex::Regex;
use serde::Serialize;
use tenant_relocator_common::{LocationProbe, NamePattern, RelocatorError, Result};

/// Which entries a fixed override applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// Only entries with a tenant id are moved
    #[default]
    TaggedOnly,
    /// Every discovered entry is moved, tenant id or not
    AllEntries,
}

/// How targets were chosen during a resolution pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    FixedOverride { location: String },
    PerTenant { candidates: usize },
}

/// Summary of one resolution pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub strategy: ResolutionStrategy,
    /// Entries left in the catalog with a target
    pub resolved: usize,
    /// Entries removed because no target could be assigned
    pub pruned: usize,
    /// Tenants for which no web app was found
    pub tenants_missed: Vec<String>,
}

/// Resolves targets either from a fixed override or per tenant via [`WebAppLocator`]
///
/// Resolution never fails because of a single tenant; the only fatal error is
/// being unable to enumerate candidate locations at all.
pub struct TargetResolver<'a> {
    probe: &'a dyn LocationProbe,
    web_app_pattern: &'a NamePattern,
    candidate_filter: Option<Regex>,
    override_policy: OverridePolicy,
    stop_at_first_match: bool,
    verbose: bool,
}

impl<'a> TargetResolver<'a> {
    pub fn new(probe: &'a dyn LocationProbe, web_app_pattern: &'a NamePattern) -> Self {
        Self {
            probe,
            web_app_pattern,
            candidate_filter: None,
            override_policy: OverridePolicy::default(),
            stop_at_first_match: false,
            verbose: false,
        }
    }

    /// Restrict the locations searched for web apps
    pub fn candidate_filter(mut self, filter: Option<Regex>) -> Self {
        self.candidate_filter = filter;
        self
    }

    pub fn override_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }

    pub fn stop_at_first_match(mut self, stop: bool) -> Self {
        self.stop_at_first_match = stop;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve targets in place and prune every entry left without one
    pub fn resolve(
        &self,
        catalog: &mut ResourceCatalog,
        fixed_override: Option<&str>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Resolution> {
        if let Some(target) = fixed_override {
            match self.probe.location_exists(target) {
                Ok(true) => {
                    self.log(&format!("Using fixed target location {target}"));
                    let resolved = self.assign_override(catalog, target);
                    let pruned = Self::prune(catalog);
                    return Ok(Resolution {
                        strategy: ResolutionStrategy::FixedOverride {
                            location: target.to_string(),
                        },
                        resolved,
                        pruned,
                        tenants_missed: Vec::new(),
                    });
                }
                Ok(false) => diagnostics.push(Diagnostic::OverrideUnavailable {
                    location: target.to_string(),
                    reason: "location does not exist".to_string(),
                }),
                Err(e) => diagnostics.push(Diagnostic::OverrideUnavailable {
                    location: target.to_string(),
                    reason: e.to_string(),
                }),
            }
        }

        let candidates = self.candidate_locations()?;
        self.log(&format!(
            "Searching {} candidate location(s) for {} tenant(s)",
            candidates.len(),
            catalog.tenant_ids().len()
        ));

        let mut locator = WebAppLocator::new(self.probe, self.web_app_pattern)
            .stop_at_first_match(self.stop_at_first_match)
            .verbose(self.verbose);

        let mut tenants_missed = Vec::new();
        for tenant_id in catalog.tenant_ids() {
            match locator.locate(&tenant_id, &candidates, diagnostics) {
                Some(location) => {
                    let assigned = catalog.assign_tenant_target(&tenant_id, &location);
                    self.log(&format!(
                        "Tenant {tenant_id}: {assigned} resource(s) -> {location}"
                    ));
                }
                None => {
                    diagnostics.push(Diagnostic::ResolutionMiss {
                        tenant_id: tenant_id.clone(),
                        resources: catalog.filter_by_tenant(&tenant_id).len(),
                    });
                    tenants_missed.push(tenant_id);
                }
            }
        }

        let pruned = Self::prune(catalog);
        Ok(Resolution {
            strategy: ResolutionStrategy::PerTenant {
                candidates: candidates.len(),
            },
            resolved: catalog.len(),
            pruned,
            tenants_missed,
        })
    }

    fn assign_override(&self, catalog: &mut ResourceCatalog, target: &str) -> usize {
        let mut assigned = 0;
        for entry in catalog.entries_mut() {
            let eligible = match self.override_policy {
                OverridePolicy::TaggedOnly => entry.tenant_id().is_some(),
                OverridePolicy::AllEntries => true,
            };
            if eligible {
                entry.set_target(target);
                assigned += 1;
            }
        }
        assigned
    }

    fn candidate_locations(&self) -> Result<Vec<String>> {
        let locations = self
            .probe
            .list_locations()
            .map_err(RelocatorError::Enumeration)?;

        Ok(match &self.candidate_filter {
            Some(filter) => locations
                .into_iter()
                .filter(|location| filter.is_match(location))
                .collect(),
            None => locations,
        })
    }

    fn prune(catalog: &mut ResourceCatalog) -> usize {
        catalog.remove_all(|entry| !entry.is_resolved())
    }

    fn log(&self, message: &str) {
        if self.verbose {
            eprintln!("{message}");
        }
    }
}
