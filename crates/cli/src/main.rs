//! Tenant Relocator CLI
//!
//! Command-line interface for moving orphaned tenant resources next to the
//! web app that serves their tenant.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use tenant_relocator_azure::AzCli;
use tenant_relocator_common::{
    LocationProbe, MoveCapability, RelocatorConfig, ResourceKind, ResourceProbe,
};
use tenant_relocator_resolver::{
    Diagnostic, InventorySnapshot, OverridePolicy, RelocationPlan, RelocationRequest, Relocator,
    RunReport, DEFAULT_KINDS,
};

#[derive(Parser)]
#[command(name = "tenant-relocator")]
#[command(version, about = "Move orphaned tenant resources to their tenant's resource group", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pattern configuration file (built-in patterns if not specified)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a target for every tenant resource and move it there
    #[command(after_help = "EXAMPLES:\n  \
        # Preview where each orphaned resource would go\n  \
        tenant-relocator move-resources --source-rg rg-iqon-sticos-legacy --dry-run\n\n  \
        # Move a single tenant's resources\n  \
        tenant-relocator move-resources --source-rg rg-iqon-sticos-legacy --tenant 123\n\n  \
        # Move everything tagged into one resource group, ten at a time\n  \
        tenant-relocator move-resources \\\n    \
        --source-rg rg-iqon-sticos-legacy \\\n    \
        --target-rg rg-iqon-sticos-2 \\\n    \
        --max-items 10")]
    MoveResources {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Maximum number of resources to move in this run
        #[arg(long)]
        max_items: Option<usize>,

        /// Report the planned moves without executing them
        #[arg(long)]
        dry_run: bool,
    },

    /// List tenant resources in a resource group and where they belong
    #[command(after_help = "EXAMPLES:\n  \
        # Group orphaned resources by tenant\n  \
        tenant-relocator find-orphans --source-rg rg-iqon-sticos-legacy\n\n  \
        # Plan offline against an exported inventory\n  \
        tenant-relocator find-orphans \\\n    \
        --source-rg rg-iqon-sticos-legacy \\\n    \
        --inventory ./inventory.json \\\n    \
        --json")]
    FindOrphans {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Show the effective name patterns
    ShowConfig,
}

/// Flags shared by every command that discovers and resolves
#[derive(Args, Debug)]
struct ScopeArgs {
    /// Resource group holding the orphaned resources
    #[arg(short, long = "source-rg")]
    source_rg: String,

    /// Move everything into this resource group instead of looking up each tenant
    #[arg(short, long = "target-rg")]
    target_rg: Option<String>,

    /// Only handle resources of this tenant id
    #[arg(long)]
    tenant: Option<String>,

    /// Comma-separated list of resource kinds
    #[arg(long, value_delimiter = ',', value_enum)]
    kinds: Option<Vec<KindArg>>,

    /// With --target-rg, also move resources whose name carries no tenant id
    #[arg(long, requires = "target_rg")]
    include_untagged: bool,

    /// Use the first resource group hosting the tenant's web app
    #[arg(long)]
    first_match: bool,

    /// Read resources and resource groups from an inventory snapshot
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// Azure subscription (CLI default if not specified)
    #[arg(long, conflicts_with = "inventory")]
    subscription: Option<String>,

    /// Azure CLI executable (az, or az.cmd on Windows, if not specified)
    #[arg(long, conflicts_with = "inventory")]
    az_program: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Key vaults
    KeyVault,
    /// Service Bus namespaces
    ServiceBus,
    /// App Service plans
    AppServicePlan,
    /// Any resource, matched by name only
    Generic,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::KeyVault => ResourceKind::KeyVault,
            KindArg::ServiceBus => ResourceKind::ServiceBus,
            KindArg::AppServicePlan => ResourceKind::AppServicePlan,
            KindArg::Generic => ResourceKind::Generic,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        println!("{} Verbose mode enabled", "→".cyan());
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::MoveResources {
            scope,
            max_items,
            dry_run,
        } => {
            let mut request = build_request(&scope);
            request.max_items = max_items;
            request.dry_run = dry_run;
            move_command(&config, &scope, &request, cli.verbose)?;
        }
        Commands::FindOrphans { scope } => {
            let request = build_request(&scope);
            find_orphans_command(&config, &scope, &request, cli.verbose)?;
        }
        Commands::ShowConfig => {
            show_config_command(&config)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RelocatorConfig> {
    match path {
        Some(path) => RelocatorConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(RelocatorConfig::default()),
    }
}

fn build_request(scope: &ScopeArgs) -> RelocationRequest {
    let mut request = RelocationRequest::new(scope.source_rg.clone());
    request.fixed_override = scope.target_rg.clone();
    request.tenant_filter = scope.tenant.clone();
    request.stop_at_first_match = scope.first_match;
    request.kinds = match &scope.kinds {
        Some(kinds) => {
            let mut selected: Vec<ResourceKind> = Vec::new();
            for kind in kinds.iter().copied().map(ResourceKind::from) {
                if !selected.contains(&kind) {
                    selected.push(kind);
                }
            }
            selected
        }
        None => DEFAULT_KINDS.to_vec(),
    };
    if scope.include_untagged {
        request.override_policy = OverridePolicy::AllEntries;
    }
    request
}

/// Run `f` against either the inventory snapshot or the Azure CLI
fn with_backend<T>(
    scope: &ScopeArgs,
    verbose: bool,
    f: impl FnOnce(&dyn ResourceProbe, &dyn LocationProbe, &dyn MoveCapability) -> Result<T>,
) -> Result<T> {
    match &scope.inventory {
        Some(path) => {
            if !scope.json {
                println!("{} Using inventory snapshot: {}", "→".cyan(), path.display());
            }
            let inventory = InventorySnapshot::load(path)
                .with_context(|| format!("Failed to load inventory: {}", path.display()))?;
            f(&inventory, &inventory, &inventory)
        }
        None => {
            let mut az = AzCli::new()
                .subscription(scope.subscription.clone())
                .verbose(verbose);
            if let Some(program) = &scope.az_program {
                az = az.program(program.as_str());
            }
            let resources = az.resource_probe();
            f(&resources, &az, &az)
        }
    }
}

fn move_command(
    config: &RelocatorConfig,
    scope: &ScopeArgs,
    request: &RelocationRequest,
    verbose: bool,
) -> Result<()> {
    if !scope.json {
        println!(
            "{} Relocating resources from: {}",
            "→".cyan(),
            request.source_location.yellow()
        );
        if verbose {
            print_request(request);
        }
    }

    let report = with_backend(scope, verbose, |resources, locations, mover| {
        let mut relocator = Relocator::new(config, resources, locations, mover)
            .context("Failed to compile name patterns")?
            .verbose(verbose);
        relocator
            .run(request)
            .context("Relocation aborted before any move")
    })?;

    if scope.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print_plan(&report.plan, verbose);
        print_moves(&report);
    }

    if !report.is_success() {
        anyhow::bail!("{} move(s) failed", report.moves.failed());
    }

    Ok(())
}

fn find_orphans_command(
    config: &RelocatorConfig,
    scope: &ScopeArgs,
    request: &RelocationRequest,
    verbose: bool,
) -> Result<()> {
    if !scope.json {
        println!(
            "{} Looking for tenant resources in: {}",
            "→".cyan(),
            request.source_location.yellow()
        );
        if verbose {
            print_request(request);
        }
    }

    let plan = with_backend(scope, verbose, |resources, locations, mover| {
        let mut relocator = Relocator::new(config, resources, locations, mover)
            .context("Failed to compile name patterns")?
            .verbose(verbose);
        relocator.plan(request).context("Failed to plan relocation")
    })?;

    if scope.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?
        );
        return Ok(());
    }

    print_plan(&plan, verbose);

    println!("\n{}", "Resources by tenant:".bold());
    for (tenant, entries) in plan.catalog.group_by_tenant() {
        let target = entries
            .first()
            .and_then(|e| e.target_location())
            .unwrap_or("?");
        println!("  {} {} → {}", "Tenant".bold(), tenant.yellow(), target.cyan());
        for entry in entries {
            println!("    • {} ({})", entry.name(), entry.kind());
        }
    }

    let untagged: Vec<_> = plan
        .catalog
        .iter()
        .filter(|e| e.tenant_id().is_none())
        .collect();
    if !untagged.is_empty() {
        println!("  {}", "(no tenant)".dimmed());
        for entry in untagged {
            println!(
                "    • {} ({}) → {}",
                entry.name(),
                entry.kind(),
                entry.target_location().unwrap_or("?")
            );
        }
    }

    println!(
        "\n{} {} resource(s) across {} tenant(s) would be moved",
        "✓".green(),
        plan.catalog.len(),
        plan.catalog.tenant_ids().len()
    );

    Ok(())
}

fn show_config_command(config: &RelocatorConfig) -> Result<()> {
    let patterns = config.compile().context("Invalid name pattern")?;

    println!("{}", "Name patterns:".bold());
    for (kind, pattern) in patterns.iter() {
        println!("  {:<16} {}", kind.to_string().cyan(), pattern);
    }

    println!("\n{}", "Candidate resource groups:".bold());
    match &config.candidate_locations {
        Some(filter) => println!("  matching {}", filter.yellow()),
        None => println!("  all"),
    }

    Ok(())
}

fn print_request(request: &RelocationRequest) {
    let kinds: Vec<String> = request.kinds.iter().map(|k| k.to_string()).collect();
    println!("  Kinds: {}", kinds.join(", "));
    if let Some(target) = &request.fixed_override {
        println!("  Target: {}", target);
    }
    if let Some(tenant) = &request.tenant_filter {
        println!("  Tenant: {}", tenant);
    }
    if let Some(limit) = request.max_items {
        println!("  Max items: {}", limit);
    }
}

fn print_plan(plan: &RelocationPlan, verbose: bool) {
    println!(
        "{} Discovered {} resource(s), {} ready to move",
        "✓".green(),
        plan.discovered,
        plan.catalog.len()
    );
    if plan.filtered_out > 0 {
        println!("  {} filtered out by tenant", plan.filtered_out);
    }
    if plan.resolution.pruned > 0 {
        println!("  {} without a target", plan.resolution.pruned);
    }
    if plan.in_place > 0 {
        println!("  {} already in place", plan.in_place);
    }
    if plan.truncated > 0 {
        println!("  {} deferred by --max-items", plan.truncated);
    }

    print_diagnostics(&plan.diagnostics, verbose);
}

fn print_diagnostics(diagnostics: &[Diagnostic], verbose: bool) {
    for diagnostic in diagnostics {
        if diagnostic.is_warning() {
            println!("{} {}", "⚠".yellow(), diagnostic);
        } else if verbose {
            println!("  {}", diagnostic.to_string().dimmed());
        }
    }
}

fn print_moves(report: &RunReport) {
    let moves = &report.moves;

    if !moves.planned.is_empty() {
        println!("\n{}", "Moves:".bold());
    }
    for outcome in &moves.outcomes {
        let marker = if outcome.succeeded {
            "✓".green()
        } else {
            "✗".red()
        };
        match moves
            .planned
            .iter()
            .find(|p| p.resource_id == outcome.resource_id)
        {
            Some(planned) => println!(
                "  {} {} ({}) → {}",
                marker,
                planned.name,
                planned.kind,
                planned.target.cyan()
            ),
            None => println!("  {} {}", marker, outcome.resource_id),
        }
        if let Some(message) = &outcome.error_message {
            println!("      {}", message.red());
        }
    }
    if moves.dry_run {
        for planned in &moves.planned {
            println!(
                "  {} {} ({}) → {}",
                "•".cyan(),
                planned.name,
                planned.kind,
                planned.target.cyan()
            );
        }
    }

    let summary = report.summary();
    if report.is_success() {
        println!("\n{}", summary.green().bold());
    } else {
        println!("\n{}", summary.red().bold());
    }
}
