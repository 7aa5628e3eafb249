//! # fleet-io: Fleet Planning Data I/O
//!
//! Reads the CSV input tables into a [`fleet_core::FleetDataset`] and writes
//! solved plans back out as CSV or JSON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleet_io::{load_dataset, TableFiles};
//! use std::path::Path;
//!
//! fn main() -> fleet_core::FleetResult<()> {
//!     let dataset = load_dataset(Path::new("Dataset"), &TableFiles::default())?;
//!     println!("Vehicle models: {}", dataset.vehicles().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`tables`] - one reader per input table, plus [`load_dataset`]
//! - [`diagnostics`] - row counts and non-fatal findings
//! - [`export`] - plan rows, CSV and JSON writers

pub mod diagnostics;
pub mod export;
pub mod tables;

pub use diagnostics::{LoadIssue, LoadReport, TableStats};
pub use export::{plan_rows, write_plan_csv, PlanAction, PlanExport, PlanRow};
pub use tables::{load_dataset, load_dataset_with_report, TableFiles};
