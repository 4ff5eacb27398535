//! Sequential move execution and reporting

use crate::{catalog::ResourceEntry, ResourceCatalog};
use chrono::{DateTime, Utc};
use serde::{ser::SerializeStruct, Serialize, Serializer};
use std::time::{Duration, Instant};
use tenant_relocator_common::{MoveCapability, ResourceKind};

/// A move the executor intends to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub resource_id: String,
    pub name: String,
    pub kind: ResourceKind,
    pub tenant_id: Option<String>,
    pub source: String,
    pub target: String,
}

/// Result of one attempted move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub resource_id: String,
    pub succeeded: bool,
    /// Present iff the move failed
    pub error_message: Option<String>,
}

impl MoveOutcome {
    pub fn success(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            succeeded: true,
            error_message: None,
        }
    }

    pub fn failure(resource_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            succeeded: false,
            error_message: Some(message.into()),
        }
    }
}

/// Aggregated result of an execution pass
///
/// Serialized with the attempted, succeeded and failed counts alongside the
/// planned moves and their outcomes.
#[derive(Debug, Clone)]
pub struct MoveReport {
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub planned: Vec<PlannedMove>,
    pub outcomes: Vec<MoveOutcome>,
}

impl Serialize for MoveReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let elapsed_ms = u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX);

        let mut report = serializer.serialize_struct("MoveReport", 8)?;
        report.serialize_field("dry_run", &self.dry_run)?;
        report.serialize_field("started_at", &self.started_at)?;
        report.serialize_field("elapsed_ms", &elapsed_ms)?;
        report.serialize_field("attempted", &self.attempted())?;
        report.serialize_field("succeeded", &self.succeeded())?;
        report.serialize_field("failed", &self.failed())?;
        report.serialize_field("planned", &self.planned)?;
        report.serialize_field("outcomes", &self.outcomes)?;
        report.end()
    }
}

impl MoveReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &MoveOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded)
    }

    /// A dry run or a run in which every move succeeded
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs moves one at a time in catalog order
///
/// A failed move is recorded and the loop continues; nothing is retried and
/// nothing already moved is rolled back.
pub struct MoveExecutor<'a> {
    mover: &'a dyn MoveCapability,
    verbose: bool,
}

impl<'a> MoveExecutor<'a> {
    pub fn new(mover: &'a dyn MoveCapability) -> Self {
        Self {
            mover,
            verbose: false,
        }
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute (or, with `dry_run`, only plan) a move for every resolved entry
    pub fn execute(&self, catalog: &ResourceCatalog, dry_run: bool) -> MoveReport {
        let started_at = Utc::now();
        let clock = Instant::now();

        let planned: Vec<PlannedMove> = catalog.iter().filter_map(Self::plan).collect();
        let mut outcomes = Vec::new();

        if dry_run {
            self.log(&format!("Dry run: {} move(s) planned", planned.len()));
        } else {
            for entry in catalog {
                outcomes.push(self.move_entry(entry));
            }
        }

        MoveReport {
            dry_run,
            started_at,
            elapsed: clock.elapsed(),
            planned,
            outcomes,
        }
    }

    fn move_entry(&self, entry: &ResourceEntry) -> MoveOutcome {
        let Some(target) = entry.target_location() else {
            return MoveOutcome::failure(entry.id(), "no target location resolved");
        };

        self.log(&format!(
            "Moving {} '{}' from {} to {}",
            entry.kind(),
            entry.name(),
            entry.source_location(),
            target
        ));

        match self
            .mover
            .move_resource(entry.id(), entry.source_location(), target)
        {
            Ok(()) => MoveOutcome::success(entry.id()),
            Err(e) => {
                self.log(&format!("Move of '{}' failed: {e}", entry.name()));
                MoveOutcome::failure(entry.id(), e.to_string())
            }
        }
    }

    fn plan(entry: &ResourceEntry) -> Option<PlannedMove> {
        Some(PlannedMove {
            resource_id: entry.id().to_string(),
            name: entry.name().to_string(),
            kind: entry.kind(),
            tenant_id: entry.tenant_id().map(String::from),
            source: entry.source_location().to_string(),
            target: entry.target_location()?.to_string(),
        })
    }

    fn log(&self, message: &str) {
        if self.verbose {
            eprintln!("{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use tenant_relocator_common::{MockMoveCapability, ProbeError};

    fn resolved_catalog(ids: &[&str]) -> ResourceCatalog {
        let mut catalog = ResourceCatalog::new();
        for id in ids {
            let mut entry = ResourceEntry::new(
                *id,
                format!("name-{id}"),
                ResourceKind::KeyVault,
                Some("1".to_string()),
                "rg-source",
            );
            entry.set_target("rg-target");
            catalog.add(entry);
        }
        catalog
    }

    #[test]
    fn test_dry_run_never_moves() {
        let mut mover = MockMoveCapability::new();
        mover.expect_move_resource().never();

        let catalog = resolved_catalog(&["a", "b"]);
        let report = MoveExecutor::new(&mover).execute(&catalog, true);

        assert!(report.dry_run);
        assert_eq!(report.planned.len(), 2);
        assert_eq!(report.attempted(), 0);
        assert!(report.is_success());
    }

    #[test]
    fn test_moves_once_per_entry_in_order() {
        let mut mover = MockMoveCapability::new();
        let mut seq = Sequence::new();
        for id in ["a", "b", "c"] {
            mover
                .expect_move_resource()
                .with(eq(id), eq("rg-source"), eq("rg-target"))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _, _| Ok(()));
        }

        let catalog = resolved_catalog(&["a", "b", "c"]);
        let report = MoveExecutor::new(&mover).execute(&catalog, false);

        assert!(!report.dry_run);
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 3);
    }

    #[test]
    fn test_partial_failure_continues() {
        let mut mover = MockMoveCapability::new();
        mover.expect_move_resource().times(3).returning(|id, _, _| {
            if id == "b" {
                Err(ProbeError::Other("MoveCannotProceed".to_string()))
            } else {
                Ok(())
            }
        });

        let catalog = resolved_catalog(&["a", "b", "c"]);
        let report = MoveExecutor::new(&mover).execute(&catalog, false);

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(
            report.outcomes,
            vec![
                MoveOutcome::success("a"),
                MoveOutcome::failure("b", "MoveCannotProceed"),
                MoveOutcome::success("c"),
            ]
        );
    }

    #[test]
    fn test_empty_catalog_is_success() {
        let mover = MockMoveCapability::new();
        let report = MoveExecutor::new(&mover).execute(&ResourceCatalog::new(), false);
        assert_eq!(report.attempted(), 0);
        assert!(report.is_success());
    }

    #[test]
    fn test_unresolved_entry_is_not_sent_to_mover() {
        let mut mover = MockMoveCapability::new();
        mover.expect_move_resource().never();

        let mut catalog = ResourceCatalog::new();
        catalog.add(ResourceEntry::new(
            "x",
            "x",
            ResourceKind::ServiceBus,
            None,
            "rg-source",
        ));
        let report = MoveExecutor::new(&mover).execute(&catalog, false);
        assert_eq!(report.failed(), 1);
        assert!(report.planned.is_empty());
    }

    #[test]
    fn test_report_serializes_elapsed_millis() {
        let mover = MockMoveCapability::new();
        let catalog = resolved_catalog(&["a"]);
        let report = MoveExecutor::new(&mover).execute(&catalog, true);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["elapsed_ms"].is_u64());
        assert_eq!(json["planned"][0]["target"], "rg-target");
        assert_eq!(json["dry_run"], true);
    }

    #[test]
    fn test_report_serializes_counts() {
        let mut mover = MockMoveCapability::new();
        mover.expect_move_resource().times(2).returning(|id, _, _| {
            if id == "b" {
                Err(ProbeError::Other("MoveCannotProceed".to_string()))
            } else {
                Ok(())
            }
        });

        let catalog = resolved_catalog(&["a", "b"]);
        let report = MoveExecutor::new(&mover).execute(&catalog, false);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["attempted"], 2);
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["outcomes"][1]["error_message"], "MoveCannotProceed");
    }

    #[test]
    fn test_huge_elapsed_saturates() {
        let report = MoveReport {
            dry_run: true,
            started_at: Utc::now(),
            elapsed: Duration::MAX,
            planned: Vec::new(),
            outcomes: Vec::new(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["elapsed_ms"], u64::MAX);
    }
}
