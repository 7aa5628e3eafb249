//! # fleet-core: Fleet Transition Planning Core Types
//!
//! Provides the normalized, read-only input tables that the fleet planner
//! consumes, plus the unified error type shared by every crate in the workspace.
//!
//! ## Data Model
//!
//! ```text
//! VehicleModel ──(fuel, consumption)──> FuelTable[(fuel, year)] ──> cost, emissions
//!      │
//!      └── size class + rated distance bucket ──> DemandSegment eligibility
//!
//! DemandSegment[(year, size, distance)]   CarbonLimit[year]   Budget[year] (optional)
//! ```
//!
//! All tables are loaded once (see `fleet-io`), validated against a
//! [`PlanningHorizon`], and never mutated afterwards.
//!
//! ## ID System
//!
//! Vehicle models and fuels are keyed by string identifiers taken directly from
//! the input tables. They are wrapped in newtypes so a fuel name can never be
//! passed where a vehicle id is expected:
//! - [`VehicleId`] e.g. `BEV_S1_2023`
//! - [`FuelType`] e.g. `Electricity`, `LNG`, `HVO`
//!
//! Size classes ([`SizeClass`]) and distance buckets ([`DistanceBucket`]) are
//! closed enumerations; unknown codes are rejected at parse time.
//!
//! ## Modules
//!
//! - [`codes`] - Size class and distance bucket enumerations
//! - [`dataset`] - The normalized input tables and their validation
//! - [`error`] - Unified error type
//! - [`horizon`] - The ordered set of planning years
//! - [`records`] - Vehicle, fuel, demand and limit records
//! - [`units`] - Unit-safe newtypes for money, distance and emissions

use serde::{Deserialize, Serialize};

pub mod codes;
pub mod dataset;
pub mod error;
pub mod horizon;
pub mod records;
pub mod units;

pub use codes::{DistanceBucket, SizeClass};
pub use dataset::{FleetDataset, FuelTable};
pub use error::{FleetError, FleetResult};
pub use horizon::PlanningHorizon;
pub use records::{BudgetLimit, CarbonLimit, DemandSegment, FuelYearEntry, VehicleModel};
pub use units::{Co2, Dollars, Kilometers};

/// Calendar year used throughout the planner.
pub type Year = u16;

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuelType(String);

impl VehicleId {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        VehicleId(value.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FuelType {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        FuelType(value.into())
    }
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
