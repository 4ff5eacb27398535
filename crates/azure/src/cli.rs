//! Thin wrapper around the Azure CLI

use serde::de::DeserializeOwned;
use std::process::Command;
use tenant_relocator_common::{
    FallbackProbe, LocationProbe, MoveCapability, ProbeError, ProbeResult,
};

use crate::listing::{GenericListing, TypedListing};

/// Runs `az` commands with JSON output
///
/// Authentication is whatever the CLI is logged in with (`az login`, a
/// service principal, or a managed identity).
#[derive(Debug, Clone)]
pub struct AzCli {
    program: String,
    subscription: Option<String>,
    verbose: bool,
}

/// The CLI ships as a batch wrapper on Windows
const DEFAULT_PROGRAM: &str = if cfg!(windows) { "az.cmd" } else { "az" };

#[derive(serde::Deserialize)]
struct Named {
    name: String,
}

impl AzCli {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            subscription: None,
            verbose: false,
        }
    }

    /// Use a different executable (a wrapper script, or a fake in tests)
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Target a subscription other than the CLI's default
    pub fn subscription(mut self, subscription: Option<String>) -> Self {
        self.subscription = subscription;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Listing probe trying the service-specific command first, then `az resource list`
    pub fn resource_probe(&self) -> FallbackProbe<'_> {
        FallbackProbe::new()
            .tier("typed", TypedListing::new(self))
            .tier("generic", GenericListing::new(self))
            .verbose(self.verbose)
    }

    /// Run a command and return its stdout
    pub fn run(&self, args: &[&str]) -> ProbeResult<String> {
        let mut command = Command::new(&self.program);
        command.args(args).args(["--output", "json"]);
        if let Some(subscription) = &self.subscription {
            command.args(["--subscription", subscription.as_str()]);
        }

        let description = self.describe(args);
        self.log(&format!("Running {description}"));

        let output = command.output().map_err(|e| ProbeError::Launch {
            command: description.clone(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                command: description,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a command and deserialize its JSON output
    pub fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> ProbeResult<T> {
        let stdout = self.run(args)?;
        parse_json(&self.describe(args), &stdout)
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    fn log(&self, message: &str) {
        if self.verbose {
            eprintln!("{message}");
        }
    }
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(command: &str, stdout: &str) -> ProbeResult<T> {
    serde_json::from_str(stdout.trim()).map_err(|e| ProbeError::Output {
        command: command.to_string(),
        message: e.to_string(),
    })
}

impl LocationProbe for AzCli {
    fn list_locations(&self) -> ProbeResult<Vec<String>> {
        let groups: Vec<Named> = self.run_json(&["group", "list"])?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }

    fn location_exists(&self, name: &str) -> ProbeResult<bool> {
        self.run_json(&["group", "exists", "--name", name])
    }

    fn list_web_apps(&self, location: &str) -> ProbeResult<Vec<String>> {
        let apps: Vec<Named> = self.run_json(&["webapp", "list", "--resource-group", location])?;
        Ok(apps.into_iter().map(|a| a.name).collect())
    }
}

impl MoveCapability for AzCli {
    fn move_resource(&self, resource_id: &str, source: &str, target: &str) -> ProbeResult<()> {
        self.log(&format!("Moving {resource_id} ({source} -> {target})"));
        self.run(&[
            "resource",
            "move",
            "--destination-group",
            target,
            "--ids",
            resource_id,
        ])
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_program_matches_platform() {
        let cli = AzCli::new();
        assert_eq!(
            cli.describe(&["group", "list"]),
            format!("{DEFAULT_PROGRAM} group list")
        );
        if cfg!(windows) {
            assert_eq!(DEFAULT_PROGRAM, "az.cmd");
        } else {
            assert_eq!(DEFAULT_PROGRAM, "az");
        }
    }

    #[test]
    fn test_missing_program_is_a_launch_error() {
        let cli = AzCli::new().program("/nonexistent/az-binary");
        let err = cli.list_locations().unwrap_err();
        assert!(matches!(err, ProbeError::Launch { .. }));
    }

    #[test]
    fn test_parse_json_reports_command() {
        let err = parse_json::<Vec<String>>("az group list", "not json").unwrap_err();
        match err {
            ProbeError::Output { command, .. } => assert_eq!(command, "az group list"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_bool_output() {
        assert!(parse_json::<bool>("az group exists", "true\n").unwrap());
        assert!(!parse_json::<bool>("az group exists", "false").unwrap());
    }

    #[test]
    fn test_fallback_tiers_are_ordered() {
        let cli = AzCli::new();
        let probe = cli.resource_probe();
        assert_eq!(probe.tier_names().collect::<Vec<_>>(), vec!["typed", "generic"]);
    }
}
