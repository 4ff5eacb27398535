//! Azure backend for tenant-relocator
//!
//! Implements the probe and move traits by shelling out to the Azure CLI.
//!
//! # Examples
//!
//! ```no_run
//! use tenant_relocator_azure::AzCli;
//! use tenant_relocator_common::LocationProbe;
//!
//! let az = AzCli::new().subscription(Some("my-subscription".to_string()));
//! for group in az.list_locations().expect("az group list failed") {
//!     println!("{group}");
//! }
//! ```

mod cli;
mod listing;

pub use cli::AzCli;
pub use listing::{GenericListing, TypedListing};
