//! Schedule precomputation
//!
//! Derives, once per vehicle model, the age-indexed ownership costs and the
//! per-(fuel, year) operating cost and emissions that the model builder turns
//! into objective and constraint coefficients.
//!
//! ```text
//! insurance[age]   = purchase_cost × INSURANCE_RATES[age]     0.05 → 0.14
//! maintenance[age] = purchase_cost × MAINTENANCE_RATES[age]   0.01 → 0.19
//! resale[age]      = purchase_cost × RESALE_RATES[age]        0.90 → 0.30 (floor from age 6)
//!
//! fuel_cost[f, y]  = yearly_range × consumption[f] × cost_per_unit[f, y]
//! emissions[f, y]  = yearly_range × consumption[f] × emissions_per_unit[f, y]
//! ```

use fleet_core::{
    Co2, Dollars, FuelTable, FuelType, PlanningHorizon, VehicleId, VehicleModel, Year,
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Maximum number of years a unit may stay in the active fleet.
pub const SERVICE_LIFE_YEARS: usize = 10;

pub const INSURANCE_RATES: [f64; SERVICE_LIFE_YEARS] =
    [0.05, 0.06, 0.07, 0.08, 0.09, 0.10, 0.11, 0.12, 0.13, 0.14];
pub const MAINTENANCE_RATES: [f64; SERVICE_LIFE_YEARS] =
    [0.01, 0.03, 0.05, 0.07, 0.09, 0.11, 0.13, 0.15, 0.17, 0.19];
pub const RESALE_RATES: [f64; SERVICE_LIFE_YEARS] =
    [0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.3, 0.3, 0.3];

/// Ownership costs of one vehicle model by age (0-based).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeCostSchedule {
    insurance: [Dollars; SERVICE_LIFE_YEARS],
    maintenance: [Dollars; SERVICE_LIFE_YEARS],
    resale: [Dollars; SERVICE_LIFE_YEARS],
}

impl AgeCostSchedule {
    pub fn for_purchase_cost(cost: Dollars) -> Self {
        Self {
            insurance: INSURANCE_RATES.map(|rate| cost * rate),
            maintenance: MAINTENANCE_RATES.map(|rate| cost * rate),
            resale: RESALE_RATES.map(|rate| cost * rate),
        }
    }

    /// `None` past the service-life cap.
    pub fn insurance(&self, age: usize) -> Option<Dollars> {
        self.insurance.get(age).copied()
    }

    pub fn maintenance(&self, age: usize) -> Option<Dollars> {
        self.maintenance.get(age).copied()
    }

    pub fn resale(&self, age: usize) -> Option<Dollars> {
        self.resale.get(age).copied()
    }

    /// Insurance plus maintenance at `age`.
    pub fn upkeep(&self, age: usize) -> Option<Dollars> {
        Some(self.insurance(age)? + self.maintenance(age)?)
    }
}

/// Yearly fuel cost and emissions of one unit running on one fuel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelYearCost {
    pub fuel_cost: Dollars,
    pub emissions: Co2,
}

/// Everything the model builder needs to know about one vehicle model.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleSchedule {
    pub vehicle: VehicleId,
    pub model_year: Year,
    pub age_costs: AgeCostSchedule,
    fuel_years: BTreeMap<(FuelType, Year), FuelYearCost>,
}

impl VehicleSchedule {
    /// Precompute the schedule of `vehicle` over the horizon.
    ///
    /// `(fuel, year)` pairs without a fuel-table entry are omitted; that fuel
    /// simply cannot be used by this vehicle in that year.
    pub fn compute(vehicle: &VehicleModel, fuels: &FuelTable, horizon: &PlanningHorizon) -> Self {
        let mut fuel_years = BTreeMap::new();
        for (fuel, consumption) in &vehicle.fuel_consumption {
            let units_per_year = vehicle.yearly_range.value() * consumption;
            for year in horizon.years() {
                if let Some(entry) = fuels.get(fuel, year) {
                    fuel_years.insert(
                        (fuel.clone(), year),
                        FuelYearCost {
                            fuel_cost: entry.cost_per_unit * units_per_year,
                            emissions: entry.emissions_per_unit * units_per_year,
                        },
                    );
                }
            }
        }

        Self {
            vehicle: vehicle.id.clone(),
            model_year: vehicle.model_year,
            age_costs: AgeCostSchedule::for_purchase_cost(vehicle.purchase_cost),
            fuel_years,
        }
    }

    pub fn fuel_year(&self, fuel: &FuelType, year: Year) -> Option<&FuelYearCost> {
        self.fuel_years.get(&(fuel.clone(), year))
    }

    pub fn fuel_years(&self) -> impl Iterator<Item = (&FuelType, Year, &FuelYearCost)> {
        self.fuel_years
            .iter()
            .map(|((fuel, year), cost)| (fuel, *year, cost))
    }

    fn in_year(&self, year: Year) -> impl Iterator<Item = &FuelYearCost> {
        self.fuel_years
            .iter()
            .filter(move |((_, y), _)| *y == year)
            .map(|(_, cost)| cost)
    }

    /// Fuel cost of one unit operating in `year`, summed over every usable fuel.
    pub fn yearly_fuel_cost(&self, year: Year) -> Dollars {
        self.in_year(year).map(|c| c.fuel_cost).sum()
    }

    /// Emissions of one unit operating in `year`, summed exactly like the fuel cost.
    pub fn yearly_emissions(&self, year: Year) -> Co2 {
        self.in_year(year).map(|c| c.emissions).sum()
    }

    /// A unit can operate in `year` iff one of its fuels has an entry for it.
    pub fn is_operable(&self, year: Year) -> bool {
        self.in_year(year).next().is_some()
    }

    /// Years in which the model can be bought.
    pub fn purchase_years(&self, horizon: &PlanningHorizon) -> Vec<Year> {
        horizon
            .years_from(self.model_year)
            .filter(|year| self.is_operable(*year))
            .collect()
    }

    /// Years in which a unit bought in `vintage` may be active.
    ///
    /// The run starts at the vintage and ends at the first of: the service-life
    /// cap, the horizon end, or the year before the first inoperable year.
    pub fn active_years(&self, vintage: Year, horizon: &PlanningHorizon) -> Vec<Year> {
        if !horizon.contains(vintage) {
            return Vec::new();
        }
        horizon
            .years_from(vintage)
            .take(SERVICE_LIFE_YEARS)
            .take_while(|year| self.is_operable(*year))
            .collect()
    }
}

/// Immutable schedules keyed by vehicle id.
#[derive(Debug, Clone, Default)]
pub struct ScheduleTable {
    schedules: BTreeMap<VehicleId, VehicleSchedule>,
}

impl ScheduleTable {
    pub fn get(&self, vehicle: &VehicleId) -> Option<&VehicleSchedule> {
        self.schedules.get(vehicle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VehicleSchedule> {
        self.schedules.values()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

/// Precompute schedules for every vehicle model.
///
/// Each schedule is a pure function of its vehicle and the fuel table, so the
/// work is split per vehicle when `parallel` is set and the `parallel` feature
/// is enabled.
pub fn precompute_schedules(
    vehicles: &[VehicleModel],
    fuels: &FuelTable,
    horizon: &PlanningHorizon,
    parallel: bool,
) -> ScheduleTable {
    let compute = |vehicle: &VehicleModel| {
        (
            vehicle.id.clone(),
            VehicleSchedule::compute(vehicle, fuels, horizon),
        )
    };

    #[cfg(feature = "parallel")]
    let schedules = if parallel {
        vehicles.par_iter().map(compute).collect()
    } else {
        vehicles.iter().map(compute).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let schedules = {
        let _ = parallel;
        vehicles.iter().map(compute).collect()
    };

    tracing::debug!(vehicles = vehicles.len(), "precomputed vehicle schedules");
    ScheduleTable { schedules }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{DistanceBucket, FuelYearEntry, Kilometers, SizeClass};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    fn vehicle(cost: f64, range: f64) -> VehicleModel {
        VehicleModel::new(
            "Diesel_S1_2023",
            "Diesel",
            SizeClass::S1,
            2023,
            Dollars(cost),
            Kilometers(range),
            DistanceBucket::D1,
        )
        .with_fuel("B20", 0.3)
    }

    fn fuels(years: &[Year]) -> FuelTable {
        FuelTable::from_entries(
            years
                .iter()
                .map(|y| FuelYearEntry::new("B20", *y, Co2(2.0), Dollars(1.0))),
        )
        .unwrap()
    }

    #[test]
    fn test_rate_tables_are_monotone() {
        for age in 0..SERVICE_LIFE_YEARS - 1 {
            assert!(INSURANCE_RATES[age] <= INSURANCE_RATES[age + 1]);
            assert!(MAINTENANCE_RATES[age] <= MAINTENANCE_RATES[age + 1]);
            assert!(RESALE_RATES[age] >= RESALE_RATES[age + 1]);
        }
        assert!(RESALE_RATES[6..].iter().all(|r| *r == 0.3));
    }

    #[test]
    fn test_age_costs_scale_purchase_cost() {
        let cost = Dollars(123_456.0);
        let schedule = AgeCostSchedule::for_purchase_cost(cost);
        for age in 0..SERVICE_LIFE_YEARS {
            assert_eq!(schedule.insurance(age).unwrap(), cost * INSURANCE_RATES[age]);
            assert_eq!(schedule.maintenance(age).unwrap(), cost * MAINTENANCE_RATES[age]);
            assert_eq!(schedule.resale(age).unwrap(), cost * RESALE_RATES[age]);
        }
        assert!(schedule.insurance(SERVICE_LIFE_YEARS).is_none());
        assert!(schedule.resale(SERVICE_LIFE_YEARS).is_none());
    }

    #[test]
    fn test_fuel_cost_and_emissions() {
        let horizon = PlanningHorizon::single(2023);
        let schedule = VehicleSchedule::compute(&vehicle(100_000.0, 50_000.0), &fuels(&[2023]), &horizon);
        let entry = schedule.fuel_year(&FuelType::new("B20"), 2023).unwrap();
        assert_close(entry.fuel_cost.value(), 15_000.0);
        assert_close(entry.emissions.value(), 30_000.0);
        assert_close(schedule.yearly_fuel_cost(2023).value(), 15_000.0);
        assert_close(schedule.age_costs.upkeep(0).unwrap().value(), 6_000.0);
    }

    #[test]
    fn test_multi_fuel_costs_are_summed() {
        let horizon = PlanningHorizon::single(2023);
        let lng = VehicleModel::new(
            "LNG_S1_2023",
            "LNG",
            SizeClass::S1,
            2023,
            Dollars(100_000.0),
            Kilometers(50_000.0),
            DistanceBucket::D1,
        )
        .with_fuel("LNG", 0.2)
        .with_fuel("BioLNG", 0.1);
        let fuels = FuelTable::from_entries([
            FuelYearEntry::new("LNG", 2023, Co2(2.0), Dollars(1.5)),
            FuelYearEntry::new("BioLNG", 2023, Co2(1.0), Dollars(1.0)),
        ])
        .unwrap();
        let schedule = VehicleSchedule::compute(&lng, &fuels, &horizon);

        // 10 000 units of LNG and 5 000 units of BioLNG a year
        let fossil = schedule.fuel_year(&FuelType::new("LNG"), 2023).unwrap();
        assert_close(fossil.fuel_cost.value(), 15_000.0);
        assert_close(fossil.emissions.value(), 20_000.0);
        let bio = schedule.fuel_year(&FuelType::new("BioLNG"), 2023).unwrap();
        assert_close(bio.fuel_cost.value(), 5_000.0);
        assert_close(bio.emissions.value(), 5_000.0);

        assert_close(schedule.yearly_fuel_cost(2023).value(), 20_000.0);
        assert_close(schedule.yearly_emissions(2023).value(), 25_000.0);
    }

    #[test]
    fn test_missing_fuel_year_is_omitted() {
        let horizon = PlanningHorizon::new(2023, 2025).unwrap();
        let schedule =
            VehicleSchedule::compute(&vehicle(100_000.0, 50_000.0), &fuels(&[2023, 2025]), &horizon);
        assert!(schedule.fuel_year(&FuelType::new("B20"), 2024).is_none());
        assert!(!schedule.is_operable(2024));
        assert_eq!(schedule.fuel_years().count(), 2);
        assert_eq!(schedule.purchase_years(&horizon), vec![2023, 2025]);
        // Units bought in 2023 must leave before the inoperable year.
        assert_eq!(schedule.active_years(2023, &horizon), vec![2023]);
    }

    #[test]
    fn test_zero_range_yields_zero_costs() {
        let horizon = PlanningHorizon::single(2023);
        let schedule = VehicleSchedule::compute(&vehicle(100_000.0, 0.0), &fuels(&[2023]), &horizon);
        assert_eq!(schedule.yearly_fuel_cost(2023), Dollars(0.0));
        assert_eq!(schedule.yearly_emissions(2023), Co2(0.0));
        assert!(schedule.is_operable(2023));
    }

    #[test]
    fn test_active_years_capped_by_service_life() {
        let horizon = PlanningHorizon::new(2023, 2038).unwrap();
        let years: Vec<Year> = horizon.years().collect();
        let schedule = VehicleSchedule::compute(&vehicle(1.0, 1.0), &fuels(&years), &horizon);
        let active = schedule.active_years(2023, &horizon);
        assert_eq!(active.len(), SERVICE_LIFE_YEARS);
        assert_eq!(active.last(), Some(&2032));
        assert_eq!(schedule.active_years(2036, &horizon), vec![2036, 2037, 2038]);
    }

    #[test]
    fn test_purchase_years_respect_model_year() {
        let horizon = PlanningHorizon::new(2023, 2026).unwrap();
        let mut late = vehicle(1.0, 1.0);
        late.model_year = 2025;
        let schedule = VehicleSchedule::compute(&late, &fuels(&[2023, 2024, 2025, 2026]), &horizon);
        assert_eq!(schedule.purchase_years(&horizon), vec![2025, 2026]);
    }

    #[test]
    fn test_precompute_table() {
        let horizon = PlanningHorizon::single(2023);
        let vehicles = vec![vehicle(1.0, 1.0)];
        let table = precompute_schedules(&vehicles, &fuels(&[2023]), &horizon, true);
        assert_eq!(table.len(), 1);
        assert!(table.get(&VehicleId::new("Diesel_S1_2023")).is_some());
    }
}
