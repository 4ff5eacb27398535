//! Common types and utilities for tenant-relocator
//!
//! This crate contains the resource kinds, error types, probe traits and
//! pattern configuration shared by the resolver, the Azure backend and the CLI.

pub mod patterns;
pub mod probe;

pub use patterns::{NamePattern, PatternSpec, PatternTable, RelocatorConfig};
pub use probe::{FallbackProbe, LocationProbe, MoveCapability, ProbeResult, ResourceProbe};

#[cfg(any(test, feature = "mock"))]
pub use probe::{MockLocationProbe, MockMoveCapability, MockResourceProbe};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that abort a relocation run
#[derive(Error, Debug)]
pub enum RelocatorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid name pattern for {kind}: {source}")]
    Pattern {
        kind: ResourceKind,
        #[source]
        source: regex::Error,
    },

    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("Cannot enumerate candidate locations: {0}")]
    Enumeration(#[source] ProbeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for relocator operations
pub type Result<T> = std::result::Result<T, RelocatorError>;

/// Failure of a single probe or move call
///
/// These never abort a run on their own; callers turn them into diagnostics
/// or move outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("failed to launch `{command}`: {message}")]
    Launch { command: String, message: String },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from `{command}`: {message}")]
    Output { command: String, message: String },

    #[error("{0} is not supported by this probe")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

/// Kind of Azure resource handled by the relocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    KeyVault,
    ServiceBus,
    AppServicePlan,
    WebApp,
    /// Any resource listed without a type filter
    Generic,
}

impl ResourceKind {
    /// ARM resource type used for filtered listings, if the kind has one
    pub fn arm_type(&self) -> Option<&'static str> {
        match self {
            ResourceKind::KeyVault => Some("Microsoft.KeyVault/vaults"),
            ResourceKind::ServiceBus => Some("Microsoft.ServiceBus/namespaces"),
            ResourceKind::AppServicePlan => Some("Microsoft.Web/serverfarms"),
            ResourceKind::WebApp => Some("Microsoft.Web/sites"),
            ResourceKind::Generic => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::KeyVault => write!(f, "KeyVault"),
            ResourceKind::ServiceBus => write!(f, "ServiceBus"),
            ResourceKind::AppServicePlan => write!(f, "AppServicePlan"),
            ResourceKind::WebApp => write!(f, "WebApp"),
            ResourceKind::Generic => write!(f, "Generic"),
        }
    }
}

/// A resource as returned by a listing probe, before tenant tagging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    /// Provider-specific resource handle
    pub id: String,
    pub name: String,
    pub kind: ResourceKind,
}

impl DiscoveredResource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}
