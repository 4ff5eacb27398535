//! Find the location that hosts a tenant's web app

use crate::{diagnostics::Diagnostic, matcher};
use std::collections::HashMap;
use tenant_relocator_common::{LocationProbe, NamePattern, ProbeResult};

/// Scans candidate locations for a web app whose name encodes a tenant id
///
/// The first location in candidate order that hosts the tenant wins. Unless
/// `stop_at_first_match` is set, the remaining candidates are still scanned so
/// that a tenant claimed by several locations is reported instead of resolved
/// silently. Listings are memoized per location for the locator's lifetime.
pub struct WebAppLocator<'a> {
    probe: &'a dyn LocationProbe,
    pattern: &'a NamePattern,
    stop_at_first_match: bool,
    listings: HashMap<String, ProbeResult<Vec<String>>>,
    verbose: bool,
}

impl<'a> WebAppLocator<'a> {
    pub fn new(probe: &'a dyn LocationProbe, pattern: &'a NamePattern) -> Self {
        Self {
            probe,
            pattern,
            stop_at_first_match: false,
            listings: HashMap::new(),
            verbose: false,
        }
    }

    /// Return on the first hit without checking the remaining candidates
    pub fn stop_at_first_match(mut self, stop: bool) -> Self {
        self.stop_at_first_match = stop;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Locate the location hosting `tenant_id`, if any
    pub fn locate(
        &mut self,
        tenant_id: &str,
        candidates: &[String],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<String> {
        let mut hits: Vec<&String> = Vec::new();

        for location in candidates {
            if hits.contains(&location) {
                continue;
            }
            if self.hosts_tenant(location, tenant_id, diagnostics) {
                self.log(&format!("Tenant {tenant_id}: web app found in {location}"));
                hits.push(location);
                if self.stop_at_first_match {
                    break;
                }
            }
        }

        let (chosen, others) = hits.split_first()?;
        if !others.is_empty() {
            diagnostics.push(Diagnostic::AmbiguousTenant {
                tenant_id: tenant_id.to_string(),
                chosen: chosen.to_string(),
                others: others.iter().map(|l| l.to_string()).collect(),
            });
        }
        Some(chosen.to_string())
    }

    /// Number of locations probed so far
    pub fn probed_locations(&self) -> usize {
        self.listings.len()
    }

    fn hosts_tenant(
        &mut self,
        location: &str,
        tenant_id: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        if !self.listings.contains_key(location) {
            self.log(&format!("Listing web apps in {location}"));
            let listing = self.probe.list_web_apps(location);
            if let Err(e) = &listing {
                diagnostics.push(Diagnostic::ProbeFailure {
                    location: location.to_string(),
                    message: e.to_string(),
                });
            }
            self.listings.insert(location.to_string(), listing);
        }

        let pattern = self.pattern;
        match self.listings.get(location) {
            Some(Ok(names)) => names.iter().any(|name| {
                matcher::extract_tenant_id(name, pattern).as_deref() == Some(tenant_id)
            }),
            _ => false,
        }
    }

    fn log(&self, message: &str) {
        if self.verbose {
            eprintln!("{message}");
        }
    }
}
