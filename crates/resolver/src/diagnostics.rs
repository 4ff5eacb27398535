//! Non-fatal findings accumulated during a run

use serde::Serialize;
use std::fmt;
use tenant_relocator_common::ResourceKind;

/// Something the operator should know about that did not abort the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Listing one kind in the source location failed
    DiscoveryFailure {
        kind: ResourceKind,
        location: String,
        message: String,
    },
    /// Resource kind has no configured name pattern
    NoPattern { kind: ResourceKind },
    /// Resource name carries no tenant id
    NotManaged { name: String, kind: ResourceKind },
    /// Listing web apps in a candidate location failed; the location was skipped
    ProbeFailure { location: String, message: String },
    /// No candidate location holds a web app for this tenant
    ResolutionMiss { tenant_id: String, resources: usize },
    /// More than one location holds a web app for this tenant
    AmbiguousTenant {
        tenant_id: String,
        chosen: String,
        others: Vec<String>,
    },
    /// The fixed override location could not be used
    OverrideUnavailable { location: String, reason: String },
    /// Resource already lives in its resolved location
    AlreadyInPlace { name: String, location: String },
}

impl Diagnostic {
    /// Warnings deserve operator attention; the rest is informational
    pub fn is_warning(&self) -> bool {
        !matches!(
            self,
            Diagnostic::NotManaged { .. } | Diagnostic::AlreadyInPlace { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DiscoveryFailure {
                kind,
                location,
                message,
            } => write!(f, "Could not list {kind} in {location}: {message}"),
            Diagnostic::NoPattern { kind } => {
                write!(f, "No name pattern configured for {kind}; skipped")
            }
            Diagnostic::NotManaged { name, kind } => {
                write!(f, "{kind} '{name}' has no tenant id")
            }
            Diagnostic::ProbeFailure { location, message } => {
                write!(f, "Skipped location {location}: {message}")
            }
            Diagnostic::ResolutionMiss {
                tenant_id,
                resources,
            } => write!(
                f,
                "No web app found for tenant {tenant_id}; {resources} resource(s) left in place"
            ),
            Diagnostic::AmbiguousTenant {
                tenant_id,
                chosen,
                others,
            } => write!(
                f,
                "Tenant {tenant_id} has web apps in several locations; using {chosen}, also found in {}",
                others.join(", ")
            ),
            Diagnostic::OverrideUnavailable { location, reason } => write!(
                f,
                "Target location {location} unavailable ({reason}); resolving per tenant"
            ),
            Diagnostic::AlreadyInPlace { name, location } => {
                write!(f, "'{name}' already lives in {location}")
            }
        }
    }
}
