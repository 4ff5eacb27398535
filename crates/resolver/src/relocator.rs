//! Relocation pipeline: discover, resolve, prune, execute

use crate::{
    diagnostics::Diagnostic,
    discovery,
    executor::{MoveExecutor, MoveReport},
    resolver::{OverridePolicy, Resolution, TargetResolver},
    ResourceCatalog,
};
use regex::Regex;
use serde::Serialize;
use tenant_relocator_common::{
    LocationProbe, MoveCapability, PatternTable, RelocatorConfig, ResourceKind,
    ResourceProbe, Result,
};

/// Kinds moved when the request does not name any
pub const DEFAULT_KINDS: [ResourceKind; 3] = [
    ResourceKind::KeyVault,
    ResourceKind::ServiceBus,
    ResourceKind::AppServicePlan,
];

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationRequest {
    pub source_location: String,
    /// Destination that bypasses per-tenant lookup
    pub fixed_override: Option<String>,
    /// Only handle this tenant
    pub tenant_filter: Option<String>,
    /// Upper bound on moves, applied in catalog order after resolution
    pub max_items: Option<usize>,
    pub dry_run: bool,
    pub kinds: Vec<ResourceKind>,
    pub override_policy: OverridePolicy,
    pub stop_at_first_match: bool,
}

impl RelocationRequest {
    pub fn new(source_location: impl Into<String>) -> Self {
        Self {
            source_location: source_location.into(),
            fixed_override: None,
            tenant_filter: None,
            max_items: None,
            dry_run: false,
            kinds: DEFAULT_KINDS.to_vec(),
            override_policy: OverridePolicy::default(),
            stop_at_first_match: false,
        }
    }
}

/// Stage of a relocation run; runs only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Discovering,
    Resolving,
    DryRunReporting,
    Executing,
    Reported,
}

/// Resolved catalog, ready for execution
#[derive(Debug, Clone, Serialize)]
pub struct RelocationPlan {
    pub source_location: String,
    /// Entries found in the source location, tagged or not
    pub discovered: usize,
    /// Entries dropped by the tenant filter
    pub filtered_out: usize,
    pub resolution: Resolution,
    /// Entries dropped because they already live in their target
    pub in_place: usize,
    /// Entries dropped by the max-items limit
    pub truncated: usize,
    pub catalog: ResourceCatalog,
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub plan: RelocationPlan,
    pub moves: MoveReport,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.moves.is_success()
    }

    /// One-line summary of processed, succeeded and failed moves
    pub fn summary(&self) -> String {
        if self.moves.dry_run {
            format!(
                "Dry run: {} move(s) planned, 0 executed",
                self.moves.planned.len()
            )
        } else {
            format!(
                "Processed {}, succeeded {}, failed {} in {:.1}s",
                self.moves.attempted(),
                self.moves.succeeded(),
                self.moves.failed(),
                self.moves.elapsed.as_secs_f64()
            )
        }
    }
}

/// Relocation pipeline over injected probes
///
/// Discovery of every kind completes before resolution starts, and moves run
/// only on the pruned, fully resolved catalog.
pub struct Relocator<'a> {
    resources: &'a dyn ResourceProbe,
    locations: &'a dyn LocationProbe,
    mover: &'a dyn MoveCapability,
    patterns: PatternTable,
    candidate_filter: Option<Regex>,
    phase: RunPhase,
    verbose: bool,
}

impl<'a> Relocator<'a> {
    /// Create a relocator, compiling the configured patterns
    pub fn new(
        config: &RelocatorConfig,
        resources: &'a dyn ResourceProbe,
        locations: &'a dyn LocationProbe,
        mover: &'a dyn MoveCapability,
    ) -> Result<Self> {
        Ok(Self {
            resources,
            locations,
            mover,
            patterns: config.compile()?,
            candidate_filter: config.candidate_filter()?,
            phase: RunPhase::Idle,
            verbose: false,
        })
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Discover and resolve without moving anything
    pub fn plan(&mut self, request: &RelocationRequest) -> Result<RelocationPlan> {
        let mut diagnostics = Vec::new();

        self.phase = RunPhase::Discovering;
        self.log(&format!(
            "Discovering {} kind(s) in {}",
            request.kinds.len(),
            request.source_location
        ));
        let mut catalog = discovery::discover(
            self.resources,
            &self.patterns,
            &request.kinds,
            &request.source_location,
            &mut diagnostics,
        )?;
        let discovered = catalog.len();
        self.log(&format!("Discovered {discovered} resource(s)"));

        let filtered_out = match request.tenant_filter.as_deref() {
            Some(tenant) => catalog.remove_all(|e| e.tenant_id() != Some(tenant)),
            None => 0,
        };

        self.phase = RunPhase::Resolving;
        let web_app_pattern = self.patterns.web_app()?;
        let resolution = TargetResolver::new(self.locations, web_app_pattern)
            .candidate_filter(self.candidate_filter.clone())
            .override_policy(request.override_policy)
            .stop_at_first_match(request.stop_at_first_match)
            .verbose(self.verbose)
            .resolve(
                &mut catalog,
                request.fixed_override.as_deref(),
                &mut diagnostics,
            )?;

        let in_place = Self::prune_in_place(&mut catalog, &mut diagnostics);
        let truncated = request
            .max_items
            .map(|limit| catalog.truncate(limit))
            .unwrap_or(0);
        if truncated > 0 {
            self.log(&format!("Limit reached; {truncated} resource(s) deferred"));
        }

        Ok(RelocationPlan {
            source_location: request.source_location.clone(),
            discovered,
            filtered_out,
            resolution,
            in_place,
            truncated,
            catalog,
            diagnostics,
        })
    }

    /// Plan, then execute (or preview, for dry runs) every resolved move
    pub fn run(&mut self, request: &RelocationRequest) -> Result<RunReport> {
        let plan = self.plan(request)?;

        self.phase = if request.dry_run {
            RunPhase::DryRunReporting
        } else {
            RunPhase::Executing
        };
        let moves = MoveExecutor::new(self.mover)
            .verbose(self.verbose)
            .execute(&plan.catalog, request.dry_run);

        self.phase = RunPhase::Reported;
        Ok(RunReport { plan, moves })
    }

    fn prune_in_place(catalog: &mut ResourceCatalog, diagnostics: &mut Vec<Diagnostic>) -> usize {
        let is_in_place = |entry: &crate::ResourceEntry| {
            entry
                .target_location()
                .is_some_and(|target| target.eq_ignore_ascii_case(entry.source_location()))
        };

        diagnostics.extend(catalog.iter().filter(|&e| is_in_place(e)).map(|e| {
            Diagnostic::AlreadyInPlace {
                name: e.name().to_string(),
                location: e.source_location().to_string(),
            }
        }));
        catalog.remove_all(is_in_place)
    }

    fn log(&self, message: &str) {
        if self.verbose {
            eprintln!("{message}");
        }
    }
}
