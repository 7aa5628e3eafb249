//! Normalized input records.
//!
//! These are the shapes the ingestion collaborator produces. They are plain
//! immutable data; lookups across tables live in [`crate::dataset`].

use crate::{Co2, DistanceBucket, Dollars, FuelType, Kilometers, SizeClass, VehicleId, Year};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A purchasable vehicle model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleModel {
    /// Unique identifier for this model
    pub id: VehicleId,
    /// Propulsion / category (e.g. "BEV", "LNG", "Diesel")
    pub vehicle_type: String,
    pub size: SizeClass,
    /// First year the model can be bought
    pub model_year: Year,
    pub purchase_cost: Dollars,
    /// Distance one unit covers per year of operation
    pub yearly_range: Kilometers,
    /// Distance bucket the model is rated for
    pub distance_bucket: DistanceBucket,
    /// Fuel units consumed per km, by fuel
    pub fuel_consumption: BTreeMap<FuelType, f64>,
}

impl VehicleModel {
    /// Create a vehicle model with no fuels attached yet.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        vehicle_type: impl Into<String>,
        size: SizeClass,
        model_year: Year,
        purchase_cost: Dollars,
        yearly_range: Kilometers,
        distance_bucket: DistanceBucket,
    ) -> Self {
        Self {
            id: VehicleId::new(id),
            vehicle_type: vehicle_type.into(),
            size,
            model_year,
            purchase_cost,
            yearly_range,
            distance_bucket,
            fuel_consumption: BTreeMap::new(),
        }
    }

    /// Attach a fuel with its consumption rate (fuel units per km).
    pub fn with_fuel(mut self, fuel: impl Into<String>, consumption_per_km: f64) -> Self {
        self.fuel_consumption
            .insert(FuelType::new(fuel), consumption_per_km);
        self
    }

    /// Number of fuels this model can run on.
    pub fn num_fuels(&self) -> usize {
        self.fuel_consumption.len()
    }

    /// Whether the model exists (can be bought) in `year`.
    pub fn available_in(&self, year: Year) -> bool {
        self.model_year <= year
    }
}

/// Price and emission factor of one fuel in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelYearEntry {
    pub fuel: FuelType,
    pub year: Year,
    /// CO2 emitted per fuel unit
    pub emissions_per_unit: Co2,
    /// Cost per fuel unit
    pub cost_per_unit: Dollars,
    /// Cost uncertainty (±%). Carried through, not modeled.
    pub cost_uncertainty_pct: f64,
}

impl FuelYearEntry {
    pub fn new(
        fuel: impl Into<String>,
        year: Year,
        emissions_per_unit: Co2,
        cost_per_unit: Dollars,
    ) -> Self {
        Self {
            fuel: FuelType::new(fuel),
            year,
            emissions_per_unit,
            cost_per_unit,
            cost_uncertainty_pct: 0.0,
        }
    }

    pub fn with_uncertainty(mut self, pct: f64) -> Self {
        self.cost_uncertainty_pct = pct;
        self
    }
}

/// Transport volume required in one (year, size, distance) segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSegment {
    pub year: Year,
    pub size: SizeClass,
    pub distance: DistanceBucket,
    pub volume: Kilometers,
}

impl DemandSegment {
    pub fn new(year: Year, size: SizeClass, distance: DistanceBucket, volume: Kilometers) -> Self {
        Self {
            year,
            size,
            distance,
            volume,
        }
    }
}

/// Economy-wide emission cap for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonLimit {
    pub year: Year,
    pub limit: Co2,
}

/// Net cash-flow cap for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimit {
    pub year: Year,
    pub budget: Dollars,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_builder() {
        let vehicle = VehicleModel::new(
            "LNG_S2_2025",
            "LNG",
            SizeClass::S2,
            2025,
            Dollars(150_000.0),
            Kilometers(100_000.0),
            DistanceBucket::D3,
        )
        .with_fuel("LNG", 0.25)
        .with_fuel("BioLNG", 0.25);

        assert_eq!(vehicle.num_fuels(), 2);
        assert!(!vehicle.available_in(2024));
        assert!(vehicle.available_in(2025));
        assert!(vehicle.available_in(2030));
    }
}
