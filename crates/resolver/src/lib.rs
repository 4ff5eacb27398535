//! Tenant correlation and target resolution for tenant-relocator
//!
//! Resources left in a source resource group are tagged with the tenant id
//! embedded in their names, grouped by tenant, and assigned the location that
//! hosts the tenant's web app (or a fixed override). Unresolvable entries are
//! pruned before any move runs.
//!
//! # Examples
//!
//! ```no_run
//! use tenant_relocator_common::RelocatorConfig;
//! use tenant_relocator_resolver::{InventorySnapshot, RelocationRequest, Relocator};
//! use std::path::Path;
//!
//! let inventory = InventorySnapshot::load(Path::new("inventory.json")).expect("load failed");
//! let config = RelocatorConfig::default();
//! let mut relocator = Relocator::new(&config, &inventory, &inventory, &inventory)
//!     .expect("invalid config");
//!
//! let mut request = RelocationRequest::new("rg-iqon-sticos-legacy");
//! request.dry_run = true;
//! let report = relocator.run(&request).expect("run failed");
//! println!("{}", report.summary());
//! ```

mod catalog;
mod diagnostics;
mod discovery;
mod executor;
mod locator;
pub mod matcher;
mod relocator;
mod resolver;
mod snapshot;

pub use catalog::{ResourceCatalog, ResourceEntry};
pub use diagnostics::Diagnostic;
pub use discovery::discover;
pub use executor::{MoveExecutor, MoveOutcome, MoveReport, PlannedMove};
pub use locator::WebAppLocator;
pub use matcher::extract_tenant_id;
pub use relocator::{
    RelocationPlan, RelocationRequest, Relocator, RunPhase, RunReport, DEFAULT_KINDS,
};
pub use resolver::{OverridePolicy, Resolution, ResolutionStrategy, TargetResolver};
pub use snapshot::{InventorySnapshot, LocationSnapshot, SnapshotResource};
