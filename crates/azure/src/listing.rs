//! Resource listing tiers
//!
//! The typed tier uses the service-specific command (`az keyvault list`, ...),
//! which needs read access on that service. The generic tier lists through
//! Resource Manager and works with plain Reader rights.

use crate::cli::AzCli;
use serde::Deserialize;
use tenant_relocator_common::{
    DiscoveredResource, ProbeError, ProbeResult, ResourceKind, ResourceProbe,
};

#[derive(Deserialize)]
struct ArmResource {
    id: String,
    name: String,
}

fn into_discovered(resources: Vec<ArmResource>, kind: ResourceKind) -> Vec<DiscoveredResource> {
    resources
        .into_iter()
        .map(|r| DiscoveredResource::new(r.id, r.name, kind))
        .collect()
}

/// Service-specific listing commands
pub struct TypedListing<'a> {
    cli: &'a AzCli,
}

impl<'a> TypedListing<'a> {
    pub fn new(cli: &'a AzCli) -> Self {
        Self { cli }
    }

    fn command(kind: ResourceKind) -> Option<&'static [&'static str]> {
        match kind {
            ResourceKind::KeyVault => Some(&["keyvault", "list"]),
            ResourceKind::ServiceBus => Some(&["servicebus", "namespace", "list"]),
            ResourceKind::AppServicePlan => Some(&["appservice", "plan", "list"]),
            ResourceKind::WebApp => Some(&["webapp", "list"]),
            ResourceKind::Generic => None,
        }
    }
}

impl ResourceProbe for TypedListing<'_> {
    fn list_resources(
        &self,
        kind: ResourceKind,
        location: &str,
    ) -> ProbeResult<Vec<DiscoveredResource>> {
        let command = Self::command(kind)
            .ok_or_else(|| ProbeError::Unsupported(format!("typed listing of {kind}")))?;

        let mut args = command.to_vec();
        args.extend(["--resource-group", location]);
        let resources: Vec<ArmResource> = self.cli.run_json(&args)?;
        Ok(into_discovered(resources, kind))
    }
}

/// `az resource list`, filtered by ARM type when the kind has one
pub struct GenericListing<'a> {
    cli: &'a AzCli,
}

impl<'a> GenericListing<'a> {
    pub fn new(cli: &'a AzCli) -> Self {
        Self { cli }
    }
}

impl ResourceProbe for GenericListing<'_> {
    fn list_resources(
        &self,
        kind: ResourceKind,
        location: &str,
    ) -> ProbeResult<Vec<DiscoveredResource>> {
        let mut args = vec!["resource", "list", "--resource-group", location];
        if let Some(arm_type) = kind.arm_type() {
            args.extend(["--resource-type", arm_type]);
        }
        let resources: Vec<ArmResource> = self.cli.run_json(&args)?;
        Ok(into_discovered(resources, kind))
    }
}
