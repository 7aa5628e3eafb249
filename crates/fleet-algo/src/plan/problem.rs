//! Fleet planning problem data structures
//!
//! A [`FleetProblem`] bundles the validated input tables, the planning horizon
//! and the precomputed schedules. It is built once and read by the model
//! builder; nothing in it changes afterwards.

use super::coverage::uncovered_segments;
use super::schedule::{precompute_schedules, ScheduleTable};
use fleet_core::{
    BudgetLimit, CarbonLimit, Co2, DemandSegment, Dollars, FleetDataset, FleetResult,
    FuelYearEntry, PlanningHorizon, VehicleModel, Year,
};
use tracing::info;

/// Validated inputs plus derived schedules
#[derive(Debug)]
pub struct FleetProblem {
    dataset: FleetDataset,
    horizon: PlanningHorizon,
    schedules: ScheduleTable,
}

impl FleetProblem {
    /// Validate `dataset` against `horizon` and precompute schedules.
    pub fn new(dataset: FleetDataset, horizon: PlanningHorizon) -> FleetResult<Self> {
        Self::with_precompute(dataset, horizon, cfg!(feature = "parallel"))
    }

    /// Like [`FleetProblem::new`], choosing whether precompute runs in parallel.
    pub fn with_precompute(
        dataset: FleetDataset,
        horizon: PlanningHorizon,
        parallel: bool,
    ) -> FleetResult<Self> {
        dataset.validate(&horizon)?;
        let schedules =
            precompute_schedules(dataset.vehicles(), dataset.fuels(), &horizon, parallel);

        info!(
            vehicles = dataset.vehicles().len(),
            fuel_entries = dataset.fuels().len(),
            segments = dataset.demand().len(),
            start = horizon.start(),
            end = horizon.end(),
            "fleet problem prepared"
        );

        Ok(Self {
            dataset,
            horizon,
            schedules,
        })
    }

    pub fn dataset(&self) -> &FleetDataset {
        &self.dataset
    }

    pub fn horizon(&self) -> &PlanningHorizon {
        &self.horizon
    }

    pub fn schedules(&self) -> &ScheduleTable {
        &self.schedules
    }

    pub fn num_vehicles(&self) -> usize {
        self.dataset.vehicles().len()
    }

    pub fn num_segments(&self) -> usize {
        self.dataset.demand().len()
    }

    /// Demand segments no existing, eligible vehicle model can serve.
    pub fn uncovered_segments(&self) -> Vec<&DemandSegment> {
        uncovered_segments(
            self.dataset.vehicles(),
            self.dataset.demand(),
            &self.schedules,
            &self.horizon,
        )
    }
}

/// Builder for constructing fleet problems in code (tests, scenarios)
pub struct FleetProblemBuilder {
    horizon: PlanningHorizon,
    vehicles: Vec<VehicleModel>,
    fuels: Vec<FuelYearEntry>,
    demand: Vec<DemandSegment>,
    carbon_limits: Vec<CarbonLimit>,
    budgets: Option<Vec<BudgetLimit>>,
    parallel: bool,
}

impl FleetProblemBuilder {
    pub fn new(horizon: PlanningHorizon) -> Self {
        Self {
            horizon,
            vehicles: Vec::new(),
            fuels: Vec::new(),
            demand: Vec::new(),
            carbon_limits: Vec::new(),
            budgets: None,
            parallel: false,
        }
    }

    pub fn vehicle(mut self, vehicle: VehicleModel) -> Self {
        self.vehicles.push(vehicle);
        self
    }

    pub fn fuel(mut self, entry: FuelYearEntry) -> Self {
        self.fuels.push(entry);
        self
    }

    /// Same fuel price and emission factor in every horizon year
    pub fn constant_fuel(mut self, fuel: &str, emissions_per_unit: f64, cost_per_unit: f64) -> Self {
        let horizon = self.horizon;
        for year in horizon.years() {
            self.fuels.push(FuelYearEntry::new(
                fuel,
                year,
                Co2(emissions_per_unit),
                Dollars(cost_per_unit),
            ));
        }
        self
    }

    pub fn demand(mut self, segment: DemandSegment) -> Self {
        self.demand.push(segment);
        self
    }

    pub fn carbon_limit(mut self, year: Year, limit: f64) -> Self {
        self.carbon_limits.push(CarbonLimit {
            year,
            limit: Co2(limit),
        });
        self
    }

    /// Same carbon limit in every horizon year
    pub fn constant_carbon_limit(mut self, limit: f64) -> Self {
        let horizon = self.horizon;
        for year in horizon.years() {
            self = self.carbon_limit(year, limit);
        }
        self
    }

    pub fn budget(mut self, year: Year, budget: f64) -> Self {
        self.budgets.get_or_insert_with(Vec::new).push(BudgetLimit {
            year,
            budget: Dollars(budget),
        });
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(self) -> FleetResult<FleetProblem> {
        let dataset = FleetDataset::new(
            self.vehicles,
            self.fuels,
            self.demand,
            self.carbon_limits,
            self.budgets,
        )?;
        FleetProblem::with_precompute(dataset, self.horizon, self.parallel)
    }
}
