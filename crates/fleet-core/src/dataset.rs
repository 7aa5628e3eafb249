//! The normalized input tables handed to the planner.
//!
//! [`FleetDataset`] is built once from the records produced by ingestion and
//! is immutable afterwards. Construction rejects duplicate keys and negative
//! quantities; [`FleetDataset::validate`] checks cross-table invariants against
//! a [`PlanningHorizon`].

use crate::{
    BudgetLimit, CarbonLimit, Co2, DemandSegment, DistanceBucket, Dollars, FleetError,
    FleetResult, FuelType, FuelYearEntry, PlanningHorizon, SizeClass, VehicleId, VehicleModel,
    Year,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Fuel price and emission factors keyed by `(fuel, year)`.
///
/// Absence of a key means the fuel cannot be used in that year.
#[derive(Debug, Clone, Default)]
pub struct FuelTable {
    entries: BTreeMap<(FuelType, Year), FuelYearEntry>,
}

impl FuelTable {
    pub fn from_entries(entries: impl IntoIterator<Item = FuelYearEntry>) -> FleetResult<Self> {
        let mut table = BTreeMap::new();
        for entry in entries {
            if !entry.cost_per_unit.is_non_negative() || !entry.emissions_per_unit.is_non_negative()
            {
                return Err(FleetError::Validation(format!(
                    "fuel {} in {} has a negative or non-finite cost/emission factor",
                    entry.fuel, entry.year
                )));
            }
            let key = (entry.fuel.clone(), entry.year);
            if table.contains_key(&key) {
                return Err(FleetError::DuplicateKey {
                    entity: "fuel".into(),
                    key: format!("{}/{}", entry.fuel, entry.year),
                });
            }
            table.insert(key, entry);
        }
        Ok(Self { entries: table })
    }

    pub fn get(&self, fuel: &FuelType, year: Year) -> Option<&FuelYearEntry> {
        self.entries.get(&(fuel.clone(), year))
    }

    /// Whether the fuel appears in any year.
    pub fn contains_fuel(&self, fuel: &FuelType) -> bool {
        self.entries.keys().any(|(f, _)| f == fuel)
    }

    pub fn fuels(&self) -> BTreeSet<&FuelType> {
        self.entries.keys().map(|(fuel, _)| fuel).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FuelYearEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All planner inputs, indexed for lookup.
#[derive(Debug, Clone)]
pub struct FleetDataset {
    vehicles: Vec<VehicleModel>,
    fuels: FuelTable,
    demand: Vec<DemandSegment>,
    carbon_limits: BTreeMap<Year, Co2>,
    budgets: Option<BTreeMap<Year, Dollars>>,
}

impl FleetDataset {
    /// Assemble a dataset, rejecting duplicate keys and negative quantities.
    ///
    /// `budgets = None` means no budget table was supplied; the budget
    /// constraint is then omitted entirely.
    pub fn new(
        vehicles: Vec<VehicleModel>,
        fuels: Vec<FuelYearEntry>,
        demand: Vec<DemandSegment>,
        carbon_limits: Vec<CarbonLimit>,
        budgets: Option<Vec<BudgetLimit>>,
    ) -> FleetResult<Self> {
        let mut seen: HashSet<&VehicleId> = HashSet::new();
        for vehicle in &vehicles {
            if !seen.insert(&vehicle.id) {
                return Err(FleetError::DuplicateKey {
                    entity: "vehicle".into(),
                    key: vehicle.id.to_string(),
                });
            }
            if !vehicle.purchase_cost.is_non_negative() || !vehicle.yearly_range.is_non_negative() {
                return Err(FleetError::Validation(format!(
                    "vehicle {} has a negative or non-finite cost/range",
                    vehicle.id
                )));
            }
            if let Some((fuel, _)) = vehicle
                .fuel_consumption
                .iter()
                .find(|(_, rate)| !(rate.is_finite() && **rate >= 0.0))
            {
                return Err(FleetError::Validation(format!(
                    "vehicle {} has an invalid consumption rate for {}",
                    vehicle.id, fuel
                )));
            }
        }

        let mut segments: HashSet<(Year, SizeClass, DistanceBucket)> = HashSet::new();
        for segment in &demand {
            if !segments.insert((segment.year, segment.size, segment.distance)) {
                return Err(FleetError::DuplicateKey {
                    entity: "demand".into(),
                    key: format!("{}/{}/{}", segment.year, segment.size, segment.distance),
                });
            }
            if !segment.volume.is_non_negative() {
                return Err(FleetError::Validation(format!(
                    "demand {}/{}/{} is negative",
                    segment.year, segment.size, segment.distance
                )));
            }
        }

        let mut limits = BTreeMap::new();
        for limit in carbon_limits {
            if limits.insert(limit.year, limit.limit).is_some() {
                return Err(FleetError::DuplicateKey {
                    entity: "carbon limit".into(),
                    key: limit.year.to_string(),
                });
            }
        }

        let budgets = match budgets {
            Some(rows) => {
                let mut map = BTreeMap::new();
                for row in rows {
                    if map.insert(row.year, row.budget).is_some() {
                        return Err(FleetError::DuplicateKey {
                            entity: "budget".into(),
                            key: row.year.to_string(),
                        });
                    }
                }
                Some(map)
            }
            None => None,
        };

        Ok(Self {
            vehicles,
            fuels: FuelTable::from_entries(fuels)?,
            demand,
            carbon_limits: limits,
            budgets,
        })
    }

    /// Check cross-table invariants for the given horizon.
    ///
    /// - every fuel a vehicle consumes exists in the fuel table
    /// - every vehicle has a fuel usable in at least one horizon year
    /// - every demand year lies inside the horizon
    /// - every horizon year has a carbon limit, demand, and (if supplied) a budget
    pub fn validate(&self, horizon: &PlanningHorizon) -> FleetResult<()> {
        for vehicle in &self.vehicles {
            for fuel in vehicle.fuel_consumption.keys() {
                if !self.fuels.contains_fuel(fuel) {
                    return Err(FleetError::UnknownFuel {
                        vehicle: vehicle.id.clone(),
                        fuel: fuel.clone(),
                    });
                }
            }
            let usable = vehicle.fuel_consumption.keys().any(|fuel| {
                horizon
                    .years()
                    .any(|year| self.fuels.get(fuel, year).is_some())
            });
            if !usable {
                return Err(FleetError::NoUsableFuel(vehicle.id.clone()));
            }
        }

        for segment in &self.demand {
            if !horizon.contains(segment.year) {
                return Err(horizon.outside("demand", segment.year));
            }
        }

        for year in horizon.years() {
            if !self.carbon_limits.contains_key(&year) {
                return Err(FleetError::MissingCarbonLimit(year));
            }
            if !self.demand.iter().any(|segment| segment.year == year) {
                return Err(FleetError::MissingDemand(year));
            }
            if let Some(budgets) = &self.budgets {
                if !budgets.contains_key(&year) {
                    return Err(FleetError::MissingBudget(year));
                }
            }
        }

        Ok(())
    }

    pub fn vehicles(&self) -> &[VehicleModel] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<&VehicleModel> {
        self.vehicles.iter().find(|v| &v.id == id)
    }

    pub fn fuels(&self) -> &FuelTable {
        &self.fuels
    }

    pub fn demand(&self) -> &[DemandSegment] {
        &self.demand
    }

    pub fn demand_in(&self, year: Year) -> impl Iterator<Item = &DemandSegment> {
        self.demand.iter().filter(move |segment| segment.year == year)
    }

    pub fn carbon_limit(&self, year: Year) -> Option<Co2> {
        self.carbon_limits.get(&year).copied()
    }

    pub fn budget(&self, year: Year) -> Option<Dollars> {
        self.budgets.as_ref().and_then(|b| b.get(&year).copied())
    }

    /// Whether a budget table was supplied at all.
    pub fn has_budget(&self) -> bool {
        self.budgets.is_some()
    }
}
