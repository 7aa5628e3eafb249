//! Fleet plan solution data structures
//!
//! Turns raw solver values into a per-year plan of purchases, active units and
//! sales. Values are rounded to integers within a tolerance; anything further
//! from an integer is reported, never silently rounded.

use super::model::{MilpModel, VarKey};
use fleet_core::{FleetError, FleetResult, PlanningHorizon, VehicleId, Year};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Absolute distance from an integer accepted as integral.
pub const DEFAULT_INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Normalized solver outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolveStatus {
    /// Proven optimal, or within the configured MIP gap
    Optimal,
    /// Stopped at the time limit with a plan that satisfies every row
    Feasible,
    Infeasible,
    Unbounded,
    NotSolved,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::NotSolved => "not-solved",
        }
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Units of one model bought in a year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseLine {
    pub vehicle: VehicleId,
    pub quantity: u64,
}

/// Units of one (model, vintage) operating in a year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveLine {
    pub vehicle: VehicleId,
    pub vintage: Year,
    pub quantity: u64,
}

/// Units of one (model, vintage) sold at the end of a year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleLine {
    pub vehicle: VehicleId,
    pub vintage: Year,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearPlan {
    pub year: Year,
    pub purchases: Vec<PurchaseLine>,
    pub active: Vec<ActiveLine>,
    pub sales: Vec<SaleLine>,
}

impl YearPlan {
    pub fn new(year: Year) -> Self {
        Self {
            year,
            purchases: Vec::new(),
            active: Vec::new(),
            sales: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty() && self.active.is_empty() && self.sales.is_empty()
    }

    pub fn units_purchased(&self) -> u64 {
        self.purchases.iter().map(|line| line.quantity).sum()
    }

    pub fn units_active(&self) -> u64 {
        self.active.iter().map(|line| line.quantity).sum()
    }

    pub fn units_sold(&self) -> u64 {
        self.sales.iter().map(|line| line.quantity).sum()
    }

    fn sort(&mut self) {
        self.purchases.sort_by(|a, b| a.vehicle.cmp(&b.vehicle));
        self.active
            .sort_by(|a, b| (&a.vehicle, a.vintage).cmp(&(&b.vehicle, b.vintage)));
        self.sales
            .sort_by(|a, b| (&a.vehicle, a.vintage).cmp(&(&b.vehicle, b.vintage)));
    }
}

/// Plan for every year of the horizon (years without activity are present but empty)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetPlan {
    years: BTreeMap<Year, YearPlan>,
}

impl FleetPlan {
    pub fn empty(horizon: &PlanningHorizon) -> Self {
        Self {
            years: horizon.years().map(|y| (y, YearPlan::new(y))).collect(),
        }
    }

    pub fn year(&self, year: Year) -> Option<&YearPlan> {
        self.years.get(&year)
    }

    pub fn years(&self) -> impl Iterator<Item = &YearPlan> {
        self.years.values()
    }

    pub fn num_years(&self) -> usize {
        self.years.len()
    }

    /// True when no unit is ever bought, operated or sold.
    pub fn is_empty(&self) -> bool {
        self.years.values().all(YearPlan::is_empty)
    }

    pub fn total_purchased(&self) -> u64 {
        self.years.values().map(YearPlan::units_purchased).sum()
    }

    pub fn total_sold(&self) -> u64 {
        self.years.values().map(YearPlan::units_sold).sum()
    }

    pub fn peak_active(&self) -> u64 {
        self.years
            .values()
            .map(YearPlan::units_active)
            .max()
            .unwrap_or(0)
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Fleet Plan Summary\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Years: {}\n", self.num_years()));
        s.push_str(&format!("Units Purchased: {}\n", self.total_purchased()));
        s.push_str(&format!("Units Sold: {}\n", self.total_sold()));
        s.push_str(&format!("Peak Active Fleet: {}\n", self.peak_active()));

        for plan in self.years.values().filter(|p| !p.is_empty()) {
            s.push_str(&format!(
                "\n{}: buy {}, use {}, sell {}\n",
                plan.year,
                plan.units_purchased(),
                plan.units_active(),
                plan.units_sold()
            ));
            for line in &plan.purchases {
                s.push_str(&format!("  [BUY]  {} x{}\n", line.vehicle, line.quantity));
            }
            for line in &plan.sales {
                s.push_str(&format!(
                    "  [SELL] {} ({}) x{}\n",
                    line.vehicle, line.vintage, line.quantity
                ));
            }
        }

        s
    }
}

/// Result of planning a fleet
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub status: SolveStatus,
    /// Objective value of the rounded plan, when there is one
    pub objective: Option<f64>,
    pub plan: Option<FleetPlan>,
    /// Solver or presolve diagnostic
    pub message: Option<String>,
    #[serde(skip)]
    pub solve_time: Duration,
}

impl PlanOutcome {
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Whether the outcome carries a plan (optimal or time-limited).
    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Status: {}\n", self.status));
        if let Some(objective) = self.objective {
            s.push_str(&format!("Total Cost: ${:.2}\n", objective));
        }
        if let Some(message) = &self.message {
            s.push_str(&format!("Message: {}\n", message));
        }
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));
        if let Some(plan) = &self.plan {
            s.push('\n');
            s.push_str(&plan.summary());
        }
        s
    }
}

/// Round `value` to a non-negative integer if it is within `tolerance` of one.
pub fn round_integral(value: f64, tolerance: f64) -> Option<u64> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if (value - rounded).abs() > tolerance || rounded < 0.0 {
        return None;
    }
    Some(rounded as u64)
}

/// Interpret solver `values` (indexed like the model's variables) as a plan.
///
/// Zero quantities are omitted. Sales are derived per vintage: units active in
/// a year but not in the next are sold at the end of that year, and every unit
/// of a run forced to end before the horizon does is sold in its last year.
pub fn interpret_solution(
    model: &MilpModel,
    values: &[f64],
    tolerance: f64,
) -> FleetResult<FleetPlan> {
    if values.len() != model.num_vars() {
        return Err(FleetError::Validation(format!(
            "solution has {} values for {} variables",
            values.len(),
            model.num_vars()
        )));
    }

    let quantities = model
        .variables()
        .map(|(id, key)| {
            let value = values[id.index()];
            round_integral(value, tolerance).ok_or_else(|| FleetError::NonIntegral {
                variable: key.to_string(),
                value,
            })
        })
        .collect::<FleetResult<Vec<u64>>>()?;

    let horizon = model.horizon();
    let mut plan = FleetPlan::empty(horizon);

    for (id, key) in model.variables() {
        let quantity = quantities[id.index()];
        if quantity == 0 {
            continue;
        }
        let Some(year_plan) = plan.years.get_mut(&key.year()) else {
            continue;
        };
        match key {
            VarKey::Purchase { vehicle, .. } => year_plan.purchases.push(PurchaseLine {
                vehicle: vehicle.clone(),
                quantity,
            }),
            VarKey::Active {
                vehicle, vintage, ..
            } => year_plan.active.push(ActiveLine {
                vehicle: vehicle.clone(),
                vintage: *vintage,
                quantity,
            }),
        }
    }

    for ((vehicle, vintage), chain) in model.vintage_chains() {
        for (k, &(year, var)) in chain.iter().enumerate() {
            let retained = match chain.get(k + 1) {
                Some(&(_, next)) => quantities[next.index()],
                None if horizon.is_last(year) => continue,
                None => 0,
            };
            let sold = quantities[var.index()].saturating_sub(retained);
            if sold == 0 {
                continue;
            }
            if let Some(year_plan) = plan.years.get_mut(&year) {
                year_plan.sales.push(SaleLine {
                    vehicle: vehicle.clone(),
                    vintage: *vintage,
                    quantity: sold,
                });
            }
        }
    }

    plan.years.values_mut().for_each(YearPlan::sort);
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::super::model::build_model;
    use super::super::problem::FleetProblemBuilder;
    use super::*;
    use fleet_core::{DemandSegment, DistanceBucket, Dollars, Kilometers, SizeClass, VehicleModel};

    fn model(start: Year, end: Year) -> MilpModel {
        let horizon = PlanningHorizon::new(start, end).unwrap();
        let mut builder = FleetProblemBuilder::new(horizon)
            .vehicle(
                VehicleModel::new(
                    "BEV_S1_2023",
                    "BEV",
                    SizeClass::S1,
                    2023,
                    Dollars(100_000.0),
                    Kilometers(50_000.0),
                    DistanceBucket::D1,
                )
                .with_fuel("Electricity", 0.3),
            )
            .constant_fuel("Electricity", 2.0, 1.0)
            .constant_carbon_limit(1e9);
        for year in horizon.years() {
            builder = builder.demand(DemandSegment::new(
                year,
                SizeClass::S1,
                DistanceBucket::D1,
                Kilometers(1.0),
            ));
        }
        build_model(&builder.build().unwrap(), false).unwrap()
    }

    fn set(model: &MilpModel, values: &mut [f64], key: VarKey, value: f64) {
        values[model.var_id(&key).unwrap().index()] = value;
    }

    fn active(vintage: Year, year: Year) -> VarKey {
        VarKey::Active {
            vehicle: VehicleId::new("BEV_S1_2023"),
            vintage,
            year,
        }
    }

    #[test]
    fn test_round_integral() {
        assert_eq!(round_integral(2.0000001, 1e-6), Some(2));
        assert_eq!(round_integral(-1e-9, 1e-6), Some(0));
        assert_eq!(round_integral(0.5, 1e-6), None);
        assert_eq!(round_integral(-1.0, 1e-6), None);
        assert_eq!(round_integral(f64::NAN, 1e-6), None);
    }

    #[test]
    fn test_all_zero_solution_gives_empty_years() {
        let model = model(2023, 2025);
        let plan = interpret_solution(&model, &vec![0.0; model.num_vars()], 1e-6).unwrap();
        assert_eq!(plan.num_years(), 3);
        assert!(plan.is_empty());
        assert!(plan.year(2024).unwrap().is_empty());
    }

    #[test]
    fn test_non_integral_value_is_an_error() {
        let model = model(2023, 2023);
        let mut values = vec![0.0; model.num_vars()];
        set(&model, &mut values, active(2023, 2023), 0.4);
        let err = interpret_solution(&model, &values, 1e-6).unwrap_err();
        match err {
            FleetError::NonIntegral { variable, value } => {
                assert!(variable.starts_with("active[BEV_S1_2023@2023"));
                assert_eq!(value, 0.4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let model = model(2023, 2023);
        assert!(interpret_solution(&model, &[], 1e-6).is_err());
    }

    #[test]
    fn test_purchases_active_and_sales() {
        let model = model(2023, 2025);
        let mut values = vec![0.0; model.num_vars()];
        let purchase = VarKey::Purchase {
            vehicle: VehicleId::new("BEV_S1_2023"),
            year: 2023,
        };
        set(&model, &mut values, purchase, 3.0);
        set(&model, &mut values, active(2023, 2023), 3.0 + 1e-8);
        set(&model, &mut values, active(2023, 2024), 2.0);
        set(&model, &mut values, active(2023, 2025), 2.0);

        let plan = interpret_solution(&model, &values, 1e-6).unwrap();
        let first = plan.year(2023).unwrap();
        assert_eq!(first.purchases.len(), 1);
        assert_eq!(first.purchases[0].quantity, 3);
        assert_eq!(first.units_active(), 3);
        // one unit leaves after 2023
        assert_eq!(first.units_sold(), 1);
        assert_eq!(plan.year(2024).unwrap().units_sold(), 0);
        // units still running in the final year are held
        assert_eq!(plan.year(2025).unwrap().units_sold(), 0);
        assert_eq!(plan.year(2025).unwrap().units_active(), 2);
        assert_eq!(plan.total_purchased(), 3);
        assert_eq!(plan.peak_active(), 3);

        let summary = plan.summary();
        assert!(summary.contains("Units Purchased: 3"));
        assert!(summary.contains("[SELL] BEV_S1_2023 (2023) x1"));
    }

    #[test]
    fn test_service_life_cap_forces_sale() {
        // 2023 units reach age 9 in 2032; the horizon runs on to 2035
        let model = model(2023, 2035);
        let mut values = vec![0.0; model.num_vars()];
        let purchase = VarKey::Purchase {
            vehicle: VehicleId::new("BEV_S1_2023"),
            year: 2023,
        };
        set(&model, &mut values, purchase, 2.0);
        for year in 2023..=2032 {
            set(&model, &mut values, active(2023, year), 2.0);
        }
        assert!(model.var_id(&active(2023, 2033)).is_none());

        let plan = interpret_solution(&model, &values, 1e-6).unwrap();
        for year in 2023..2032 {
            assert_eq!(plan.year(year).unwrap().units_sold(), 0, "year {year}");
        }
        let last = plan.year(2032).unwrap();
        assert_eq!(last.units_active(), 2);
        assert_eq!(
            last.sales,
            vec![SaleLine {
                vehicle: VehicleId::new("BEV_S1_2023"),
                vintage: 2023,
                quantity: 2,
            }]
        );
        assert!(plan.year(2033).unwrap().is_empty());
        assert_eq!(plan.total_sold(), 2);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(SolveStatus::NotSolved.to_string(), "not-solved");
        assert_eq!(SolveStatus::Feasible.as_str(), "feasible");
        assert_eq!(
            serde_json::to_string(&SolveStatus::Infeasible).unwrap(),
            "\"infeasible\""
        );
    }
}
