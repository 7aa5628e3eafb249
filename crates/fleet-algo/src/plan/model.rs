//! Model builder
//!
//! Translates a [`FleetProblem`] into a solver-neutral mixed-integer program:
//! integer variables keyed by [`VarKey`], a linear objective, and labelled
//! linear rows. The solver adapter in [`super::solver`] maps this onto a
//! concrete MILP backend; nothing here depends on backend variable ordering.

use super::coverage::vehicle_serves;
use super::problem::FleetProblem;
use fleet_core::{
    DistanceBucket, FleetError, FleetResult, PlanningHorizon, SizeClass, VehicleId, Year,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Identity of a decision variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VarKey {
    /// Units of `vehicle` bought in `year`
    Purchase { vehicle: VehicleId, year: Year },
    /// Units of `vehicle` bought in `vintage` and operating in `year`
    Active {
        vehicle: VehicleId,
        vintage: Year,
        year: Year,
    },
}

impl VarKey {
    pub fn vehicle(&self) -> &VehicleId {
        match self {
            VarKey::Purchase { vehicle, .. } | VarKey::Active { vehicle, .. } => vehicle,
        }
    }

    /// Calendar year the variable acts in.
    pub fn year(&self) -> Year {
        match self {
            VarKey::Purchase { year, .. } | VarKey::Active { year, .. } => *year,
        }
    }
}

impl std::fmt::Display for VarKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarKey::Purchase { vehicle, year } => write!(f, "purchase[{}@{}]", vehicle, year),
            VarKey::Active {
                vehicle,
                vintage,
                year,
            } => write!(f, "active[{}@{}/{}]", vehicle, vintage, year),
        }
    }
}

/// Dense index of a variable inside one [`MilpModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a row enforces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowKind {
    /// Capacity of eligible active units ≥ required volume
    Demand {
        year: Year,
        size: SizeClass,
        distance: DistanceBucket,
    },
    /// Count of eligible active units ≥ ⌈volume / largest eligible range⌉
    DemandUnits {
        year: Year,
        size: SizeClass,
        distance: DistanceBucket,
    },
    /// Emissions of the active fleet ≤ carbon limit
    Carbon { year: Year },
    /// Net cash flow ≤ budget
    Budget { year: Year },
    /// Active[v, y', y] ≤ Purchase[v, y']
    PurchaseLink {
        vehicle: VehicleId,
        vintage: Year,
        year: Year,
    },
    /// Active[v, y', y] ≤ Active[v, y', y - 1]
    Retention {
        vehicle: VehicleId,
        vintage: Year,
        year: Year,
    },
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowKind::Demand {
                year,
                size,
                distance,
            } => write!(f, "demand[{}/{}/{}]", year, size, distance),
            RowKind::DemandUnits {
                year,
                size,
                distance,
            } => write!(f, "demand_units[{}/{}/{}]", year, size, distance),
            RowKind::Carbon { year } => write!(f, "carbon[{}]", year),
            RowKind::Budget { year } => write!(f, "budget[{}]", year),
            RowKind::PurchaseLink {
                vehicle,
                vintage,
                year,
            } => write!(f, "purchase_link[{}@{}/{}]", vehicle, vintage, year),
            RowKind::Retention {
                vehicle,
                vintage,
                year,
            } => write!(f, "retention[{}@{}/{}]", vehicle, vintage, year),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    /// lhs ≤ rhs
    Le,
    /// lhs ≥ rhs
    Ge,
}

impl Sense {
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Sense::Le => lhs <= rhs + tolerance,
            Sense::Ge => lhs >= rhs - tolerance,
        }
    }
}

/// One linear constraint `Σ coef·var (sense) rhs`.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub kind: RowKind,
    pub terms: Vec<(VarId, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl Row {
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.sense.holds(self.activity(values), self.rhs, tolerance)
    }

    /// Row with no variables; its feasibility is fixed by `rhs` alone.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Units of one (vehicle, vintage) in each year they may be active.
pub type VintageChain = Vec<(Year, VarId)>;

/// Solver-neutral fleet MILP. All variables are non-negative integers.
#[derive(Debug, Clone)]
pub struct MilpModel {
    horizon: PlanningHorizon,
    vars: Vec<VarKey>,
    index: HashMap<VarKey, VarId>,
    objective: Vec<f64>,
    rows: Vec<Row>,
    chains: BTreeMap<(VehicleId, Year), VintageChain>,
}

impl MilpModel {
    pub fn horizon(&self) -> &PlanningHorizon {
        &self.horizon
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn variables(&self) -> impl Iterator<Item = (VarId, &VarKey)> {
        self.vars.iter().enumerate().map(|(i, key)| (VarId(i), key))
    }

    pub fn var(&self, id: VarId) -> &VarKey {
        &self.vars[id.0]
    }

    pub fn var_id(&self, key: &VarKey) -> Option<VarId> {
        self.index.get(key).copied()
    }

    /// Non-zero objective coefficients.
    pub fn objective(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.objective
            .iter()
            .enumerate()
            .filter(|(_, coef)| **coef != 0.0)
            .map(|(i, coef)| (VarId(i), *coef))
    }

    pub fn objective_coefficient(&self, id: VarId) -> f64 {
        self.objective[id.0]
    }

    /// Objective evaluated at `values` (indexed by [`VarId`]).
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, kind: &RowKind) -> Option<&Row> {
        self.rows.iter().find(|row| &row.kind == kind)
    }

    pub fn violated_rows(&self, values: &[f64], tolerance: f64) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|row| !row.is_satisfied(values, tolerance))
            .collect()
    }

    /// Active variables per (vehicle, vintage), ordered by year.
    pub fn vintage_chains(&self) -> &BTreeMap<(VehicleId, Year), VintageChain> {
        &self.chains
    }
}

#[derive(Debug, Default)]
struct LinearExpr {
    terms: BTreeMap<VarId, f64>,
}

impl LinearExpr {
    fn add(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            *self.terms.entry(var).or_insert(0.0) += coef;
        }
    }

    fn into_terms(self) -> Vec<(VarId, f64)> {
        self.terms
            .into_iter()
            .filter(|(_, coef)| *coef != 0.0)
            .collect()
    }
}

struct ModelBuilder {
    horizon: PlanningHorizon,
    vars: Vec<VarKey>,
    index: HashMap<VarKey, VarId>,
    objective: Vec<f64>,
    rows: Vec<Row>,
}

impl ModelBuilder {
    fn new(horizon: PlanningHorizon) -> Self {
        Self {
            horizon,
            vars: Vec::new(),
            index: HashMap::new(),
            objective: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn add_var(&mut self, key: VarKey) -> VarId {
        let id = VarId(self.vars.len());
        self.index.insert(key.clone(), id);
        self.vars.push(key);
        self.objective.push(0.0);
        id
    }

    fn add_cost(&mut self, var: VarId, coef: f64) {
        self.objective[var.0] += coef;
    }

    fn push_row(&mut self, kind: RowKind, terms: Vec<(VarId, f64)>, sense: Sense, rhs: f64) {
        self.rows.push(Row {
            kind,
            terms,
            sense,
            rhs,
        });
    }

    fn finish(self, chains: BTreeMap<(VehicleId, Year), VintageChain>) -> MilpModel {
        MilpModel {
            horizon: self.horizon,
            vars: self.vars,
            index: self.index,
            objective: self.objective,
            rows: self.rows,
            chains,
        }
    }
}

/// Rounded unit count implied by a demand row.
///
/// Every term is an active count weighted by a positive range, so at least
/// `⌈volume / max range⌉` eligible units must run. The row is redundant for
/// integer points but closes most of the gap of the LP relaxation.
fn demand_unit_terms(terms: &[(VarId, f64)], volume: f64) -> Option<(Vec<(VarId, f64)>, f64)> {
    let max_range = terms.iter().map(|(_, range)| *range).fold(0.0, f64::max);
    if volume <= 0.0 || max_range <= 0.0 {
        return None;
    }
    // Slack keeps an exact quotient like 100000 / 50000 from rounding up
    let min_units = (volume / max_range - 1e-9).ceil();
    let unit_terms = terms.iter().map(|(var, _)| (*var, 1.0)).collect();
    Some((unit_terms, min_units))
}

/// Build the fleet MILP.
///
/// Demand segments that no vehicle can serve still get a (constant) row, so
/// the solver reports the problem infeasible. With `strict_coverage` the
/// first such segment is returned as [`FleetError::UncoveredSegment`] instead.
pub fn build_model(problem: &FleetProblem, strict_coverage: bool) -> FleetResult<MilpModel> {
    let dataset = problem.dataset();
    let horizon = *problem.horizon();

    let uncovered = problem.uncovered_segments();
    for segment in &uncovered {
        warn!(
            year = segment.year,
            size = %segment.size,
            distance = %segment.distance,
            "demand segment has no eligible vehicle model"
        );
    }
    if strict_coverage {
        if let Some(segment) = uncovered.first() {
            return Err(FleetError::UncoveredSegment {
                year: segment.year,
                size: segment.size,
                distance: segment.distance,
            });
        }
    }

    let mut demand_rows: BTreeMap<(Year, SizeClass, DistanceBucket), (f64, LinearExpr)> = dataset
        .demand()
        .iter()
        .filter(|segment| horizon.contains(segment.year))
        .map(|segment| {
            (
                (segment.year, segment.size, segment.distance),
                (segment.volume.value(), LinearExpr::default()),
            )
        })
        .collect();
    let mut carbon_rows: BTreeMap<Year, LinearExpr> = horizon
        .years()
        .map(|year| (year, LinearExpr::default()))
        .collect();
    let mut cash_flow: BTreeMap<Year, LinearExpr> = horizon
        .years()
        .map(|year| (year, LinearExpr::default()))
        .collect();

    let mut builder = ModelBuilder::new(horizon);
    let mut chains = BTreeMap::new();

    for vehicle in dataset.vehicles() {
        let schedule = problem.schedules().get(&vehicle.id).ok_or_else(|| {
            FleetError::Validation(format!("no precomputed schedule for vehicle {}", vehicle.id))
        })?;
        let purchase_cost = vehicle.purchase_cost.value();
        let range = vehicle.yearly_range.value();

        for vintage in schedule.purchase_years(&horizon) {
            let purchase = builder.add_var(VarKey::Purchase {
                vehicle: vehicle.id.clone(),
                year: vintage,
            });
            builder.add_cost(purchase, purchase_cost);
            cash_flow
                .entry(vintage)
                .or_default()
                .add(purchase, purchase_cost);

            let mut chain: VintageChain = Vec::new();
            for year in schedule.active_years(vintage, &horizon) {
                let age = usize::from(year - vintage);
                let upkeep = schedule
                    .age_costs
                    .upkeep(age)
                    .ok_or_else(|| {
                        FleetError::Validation(format!(
                            "vehicle {} has no cost schedule at age {}",
                            vehicle.id, age
                        ))
                    })?
                    .value();
                let operating = upkeep + schedule.yearly_fuel_cost(year).value();

                let active = builder.add_var(VarKey::Active {
                    vehicle: vehicle.id.clone(),
                    vintage,
                    year,
                });
                builder.add_cost(active, operating);
                cash_flow.entry(year).or_default().add(active, operating);
                carbon_rows
                    .entry(year)
                    .or_default()
                    .add(active, schedule.yearly_emissions(year).value());

                for segment in dataset
                    .demand_in(year)
                    .filter(|segment| vehicle_serves(vehicle, segment))
                {
                    if let Some((_, expr)) =
                        demand_rows.get_mut(&(segment.year, segment.size, segment.distance))
                    {
                        expr.add(active, range);
                    }
                }

                builder.push_row(
                    RowKind::PurchaseLink {
                        vehicle: vehicle.id.clone(),
                        vintage,
                        year,
                    },
                    vec![(active, 1.0), (purchase, -1.0)],
                    Sense::Le,
                    0.0,
                );
                if let Some(&(_, previous)) = chain.last() {
                    builder.push_row(
                        RowKind::Retention {
                            vehicle: vehicle.id.clone(),
                            vintage,
                            year,
                        },
                        vec![(active, 1.0), (previous, -1.0)],
                        Sense::Le,
                        0.0,
                    );
                }
                chain.push((year, active));
            }

            // Resale is realized in a unit's last active year: units active in
            // year k but not in k + 1, or every unit at the end of a forced run.
            // Units still active in the final horizon year are held.
            for (k, &(year, active)) in chain.iter().enumerate() {
                let age = usize::from(year - vintage);
                let resale = schedule
                    .age_costs
                    .resale(age)
                    .map(|r| r.value())
                    .unwrap_or(0.0);
                let mut realized = vec![(active, resale)];
                match chain.get(k + 1) {
                    Some(&(_, next)) => realized.push((next, -resale)),
                    None if horizon.is_last(year) => continue,
                    None => {}
                }
                for (var, amount) in realized {
                    builder.add_cost(var, -amount);
                    cash_flow.entry(year).or_default().add(var, -amount);
                }
            }

            chains.insert((vehicle.id.clone(), vintage), chain);
        }
    }

    for ((year, size, distance), (volume, expr)) in demand_rows {
        let terms = expr.into_terms();
        let units = demand_unit_terms(&terms, volume);
        builder.push_row(
            RowKind::Demand {
                year,
                size,
                distance,
            },
            terms,
            Sense::Ge,
            volume,
        );
        if let Some((unit_terms, min_units)) = units {
            builder.push_row(
                RowKind::DemandUnits {
                    year,
                    size,
                    distance,
                },
                unit_terms,
                Sense::Ge,
                min_units,
            );
        }
    }

    for (year, expr) in carbon_rows {
        let limit = dataset
            .carbon_limit(year)
            .ok_or(FleetError::MissingCarbonLimit(year))?;
        builder.push_row(RowKind::Carbon { year }, expr.into_terms(), Sense::Le, limit.value());
    }

    if dataset.has_budget() {
        for (year, expr) in cash_flow {
            let budget = dataset
                .budget(year)
                .ok_or(FleetError::MissingBudget(year))?;
            builder.push_row(RowKind::Budget { year }, expr.into_terms(), Sense::Le, budget.value());
        }
    }

    let model = builder.finish(chains);
    info!(
        variables = model.num_vars(),
        rows = model.num_rows(),
        "fleet model built"
    );
    Ok(model)
}
