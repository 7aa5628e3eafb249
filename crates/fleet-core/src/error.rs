//! Unified error types for the fleet planner
//!
//! [`FleetError`] represents every failure the planner reports as an error.
//! Data errors are caller-fixable input problems and always name the offending
//! entity and key. Solver outcomes such as infeasibility are NOT errors; they
//! travel as a normalized solve status instead.
//!
//! # Example
//!
//! ```ignore
//! use fleet_core::{FleetError, FleetResult};
//!
//! fn load_and_plan(dir: &str) -> FleetResult<()> {
//!     let dataset = load_dataset(dir)?;
//!     plan_fleet(&dataset)?;
//!     Ok(())
//! }
//! ```

use crate::{DistanceBucket, FuelType, SizeClass, VehicleId, Year};
use thiserror::Error;

/// Unified error type for all fleet planning operations.
#[derive(Error, Debug)]
pub enum FleetError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A table row could not be parsed (missing field, malformed number)
    #[error("Parse error in {table} at line {line}: {message}")]
    Parse {
        table: String,
        line: u64,
        message: String,
    },

    #[error("Unknown size class '{0}'")]
    UnknownSizeClass(String),

    #[error("Unknown distance bucket '{0}'")]
    UnknownDistanceBucket(String),

    /// A vehicle's consumption table names a fuel absent from the fuel table
    #[error("Vehicle {vehicle} references unknown fuel '{fuel}'")]
    UnknownFuel { vehicle: VehicleId, fuel: FuelType },

    /// A row references a vehicle model that was never declared
    #[error("{table} references unknown vehicle '{vehicle}'")]
    UnknownVehicle { table: String, vehicle: VehicleId },

    #[error("Duplicate {entity} key: {key}")]
    DuplicateKey { entity: String, key: String },

    /// The vehicle has no fuel with a fuel-year entry inside the horizon
    #[error("Vehicle {0} has no fuel usable in any planning year")]
    NoUsableFuel(VehicleId),

    #[error("No carbon limit defined for year {0}")]
    MissingCarbonLimit(Year),

    #[error("No demand defined for year {0}")]
    MissingDemand(Year),

    #[error("No budget defined for year {0}")]
    MissingBudget(Year),

    #[error("{entity} year {year} lies outside the planning horizon {start}-{end}")]
    OutsideHorizon {
        entity: String,
        year: Year,
        start: Year,
        end: Year,
    },

    #[error("Invalid planning horizon: {0}")]
    InvalidHorizon(String),

    /// Only raised when strict coverage checking is enabled
    #[error("Demand segment {year}/{size}/{distance} has no eligible vehicle model")]
    UncoveredSegment {
        year: Year,
        size: SizeClass,
        distance: DistanceBucket,
    },

    /// Data validation errors (negative costs, non-finite values)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A solved variable was neither zero nor integral within tolerance
    #[error("Solver contract violation: {variable} = {value} is not integral")]
    NonIntegral { variable: String, value: f64 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FleetError {
    /// True for caller-fixable input problems detected before solving.
    pub fn is_data_error(&self) -> bool {
        !matches!(
            self,
            FleetError::Io(_) | FleetError::NonIntegral { .. } | FleetError::Config(_)
        )
    }
}

/// Convenience type alias for Results using FleetError.
pub type FleetResult<T> = Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_key() {
        let err = FleetError::UnknownFuel {
            vehicle: VehicleId::new("LNG_S3_2025"),
            fuel: FuelType::new("Hydrogen"),
        };
        let msg = err.to_string();
        assert!(msg.contains("LNG_S3_2025"));
        assert!(msg.contains("Hydrogen"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FleetError = io_err.into();
        assert!(matches!(err, FleetError::Io(_)));
        assert!(!err.is_data_error());
    }

    #[test]
    fn test_data_error_classification() {
        assert!(FleetError::MissingCarbonLimit(2030).is_data_error());
        assert!(!FleetError::NonIntegral {
            variable: "purchase".into(),
            value: 0.5
        }
        .is_data_error());
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> FleetResult<()> {
            Err(FleetError::Validation("test".into()))
        }

        fn outer() -> FleetResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
