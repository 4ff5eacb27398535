//! Populate a catalog from the source location

use crate::{catalog::ResourceEntry, diagnostics::Diagnostic, matcher, ResourceCatalog};
use tenant_relocator_common::{
    PatternTable, RelocatorError, ResourceKind, ResourceProbe, Result,
};

/// List every requested kind in `location` and tag each resource with its tenant id
///
/// Untagged resources are kept (they matter for override moves) and reported as
/// `NotManaged`. A kind whose listing fails is reported and skipped; the run only
/// fails when no listing succeeded at all.
pub fn discover(
    probe: &dyn ResourceProbe,
    patterns: &PatternTable,
    kinds: &[ResourceKind],
    location: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<ResourceCatalog> {
    let mut catalog = ResourceCatalog::new();
    let mut attempted = 0;
    let mut failures = Vec::new();

    for &kind in kinds {
        let Some(pattern) = patterns.get(kind) else {
            diagnostics.push(Diagnostic::NoPattern { kind });
            continue;
        };

        attempted += 1;
        let resources = match probe.list_resources(kind, location) {
            Ok(resources) => resources,
            Err(e) => {
                diagnostics.push(Diagnostic::DiscoveryFailure {
                    kind,
                    location: location.to_string(),
                    message: e.to_string(),
                });
                failures.push(format!("{kind}: {e}"));
                continue;
            }
        };

        for resource in resources {
            let tenant_id = matcher::extract_tenant_id(&resource.name, pattern);
            if tenant_id.is_none() {
                diagnostics.push(Diagnostic::NotManaged {
                    name: resource.name.clone(),
                    kind,
                });
            }
            catalog.add(ResourceEntry::new(
                resource.id,
                resource.name,
                kind,
                tenant_id,
                location,
            ));
        }
    }

    if attempted == 0 {
        return Err(RelocatorError::Config(
            "None of the requested resource kinds has a name pattern".to_string(),
        ));
    }

    if failures.len() == attempted {
        return Err(RelocatorError::Discovery(format!(
            "every listing in {} failed ({})",
            location,
            failures.join("; ")
        )));
    }

    Ok(catalog)
}
