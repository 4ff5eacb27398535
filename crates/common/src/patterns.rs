//! Name pattern configuration loaded from YAML
//!
//! Every resource kind maps to exactly one regex plus the capture group that
//! holds the tenant identifier. Adding a kind is a table entry, not a code path.

use crate::{RelocatorError, ResourceKind, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Current configuration format version
pub const CONFIG_VERSION: u32 = 1;

/// Root structure of a relocator configuration file
///
/// ```yaml
/// version: 1
/// patterns:
///   key_vault: { regex: 'kv-iqonsticos(\d+)$', group: 1 }
///   web_app: { regex: 'app-iqon-sticos-?(\d+)$', group: 1 }
/// candidate_locations: '^rg-iqon-sticos'
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelocatorConfig {
    /// Configuration format version
    pub version: u32,
    /// Tenant id pattern per resource kind
    pub patterns: BTreeMap<ResourceKind, PatternSpec>,
    /// Optional regex restricting which locations are searched for web apps
    #[serde(default)]
    pub candidate_locations: Option<String>,
}

/// Uncompiled pattern as written in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PatternSpec {
    pub regex: String,
    /// Capture group holding the tenant id
    #[serde(default = "default_group")]
    pub group: usize,
}

fn default_group() -> usize {
    1
}

impl PatternSpec {
    pub fn new(regex: impl Into<String>, group: usize) -> Self {
        Self {
            regex: regex.into(),
            group,
        }
    }
}

impl Default for RelocatorConfig {
    fn default() -> Self {
        let patterns = BTreeMap::from([
            (
                ResourceKind::KeyVault,
                PatternSpec::new(r"kv-iqonsticos(\d+)$", 1),
            ),
            (
                ResourceKind::ServiceBus,
                PatternSpec::new(r"sb-iqon-sticos-?(\d+)$", 1),
            ),
            (
                ResourceKind::AppServicePlan,
                PatternSpec::new(r"asp-iqon-sticos-?(\d+)$", 1),
            ),
            (
                ResourceKind::WebApp,
                PatternSpec::new(r"app-iqon-sticos-?(\d+)$", 1),
            ),
        ]);

        Self {
            version: CONFIG_VERSION,
            patterns,
            candidate_locations: None,
        }
    }
}

impl RelocatorConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RelocatorError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            RelocatorError::Yaml(inner) => RelocatorError::Config(format!(
                "Failed to parse config YAML from {:?}: {}",
                path, inner
            )),
            other => other,
        })
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: RelocatorConfig = serde_yaml::from_str(content)?;
        if config.version != CONFIG_VERSION {
            return Err(RelocatorError::Config(format!(
                "Unsupported config version {} (expected {})",
                config.version, CONFIG_VERSION
            )));
        }
        Ok(config)
    }

    /// Compile every pattern, failing on the first invalid one
    pub fn compile(&self) -> Result<PatternTable> {
        let mut patterns = BTreeMap::new();
        for (kind, spec) in &self.patterns {
            patterns.insert(*kind, NamePattern::compile(*kind, spec)?);
        }
        Ok(PatternTable { patterns })
    }

    /// Compile the candidate location filter, if configured
    pub fn candidate_filter(&self) -> Result<Option<Regex>> {
        self.candidate_locations
            .as_deref()
            .map(|raw| {
                RegexBuilder::new(raw)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        RelocatorError::Config(format!(
                            "Invalid candidate_locations regex '{}': {}",
                            raw, e
                        ))
                    })
            })
            .transpose()
    }
}

/// Compiled tenant id pattern for one resource kind
#[derive(Debug, Clone)]
pub struct NamePattern {
    regex: Regex,
    group: usize,
}

impl NamePattern {
    /// Compile a pattern case-insensitively and anchored to the end of the name
    pub fn compile(kind: ResourceKind, spec: &PatternSpec) -> Result<Self> {
        let source = format!("(?:{})$", spec.regex);

        let regex = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|source| RelocatorError::Pattern { kind, source })?;

        if spec.group >= regex.captures_len() {
            return Err(RelocatorError::Config(format!(
                "Pattern for {} has no capture group {} ('{}')",
                kind, spec.group, spec.regex
            )));
        }

        Ok(Self {
            regex,
            group: spec.group,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn group(&self) -> usize {
        self.group
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (group {})", self.regex.as_str(), self.group)
    }
}

/// Kind to pattern lookup table
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    patterns: BTreeMap<ResourceKind, NamePattern>,
}

impl PatternTable {
    pub fn get(&self, kind: ResourceKind) -> Option<&NamePattern> {
        self.patterns.get(&kind)
    }

    /// The web-app pattern is mandatory for per-tenant resolution
    pub fn web_app(&self) -> Result<&NamePattern> {
        self.get(ResourceKind::WebApp).ok_or_else(|| {
            RelocatorError::Config("No pattern configured for web_app".to_string())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &NamePattern)> {
        self.patterns.iter().map(|(kind, pattern)| (*kind, pattern))
    }
}
