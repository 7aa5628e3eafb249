//! Multi-year fleet transition planning
//!
//! Decides which vehicle models to buy, keep in service and sell in every year
//! of a planning horizon so that yearly demand is met at minimum total cost
//! without exceeding yearly carbon limits (and, optionally, yearly budgets).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FLEET TRANSITION PLANNING                                               │
//! │  ─────────────────────────                                               │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Vehicle models (size, distance rating, cost, range, fuels)         │
//! │    • Fuel prices and emission factors per year                          │
//! │    • Demand in km per (year, size, distance bucket)                     │
//! │    • Carbon limit per year, optional budget per year                    │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Units bought per model and year          (integer)                 │
//! │    • Units of each vintage active per year    (integer)                 │
//! │                                                                          │
//! │  Minimize:                                                               │
//! │    Purchase + insurance + maintenance + fuel - resale                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## MILP Formulation
//!
//! With `P[v,y]` units of model `v` bought in `y` and `A[v,y',y]` units of
//! vintage `y'` active in `y` (age `a = y - y'`, `0 ≤ a < 10`):
//!
//! ```text
//! minimize    Σ c_v·P[v,y] + Σ (ins_v[a] + mnt_v[a] + fuel_v[y])·A[v,y',y]
//!             - Σ res_v[a]·(A[v,y',y] - A[v,y',y+1])        units retired after y
//!
//! subject to:
//!   Σ_{v eligible} range_v·A[v,y',y] ≥ demand[y,s,d]        Demand coverage
//!   Σ_{v eligible} A[v,y',y] ≥ ⌈demand[y,s,d] / max range⌉   Unit cover
//!   Σ emis_v[y]·A[v,y',y] ≤ carbon[y]                        Carbon cap
//!   net cash flow in y ≤ budget[y]                          Budget (if given)
//!   A[v,y',y] ≤ P[v,y']                                     Purchase link
//!   A[v,y',y+1] ≤ A[v,y',y]                                 Units only leave
//!   P, A ∈ ℤ≥0
//! ```
//!
//! A vehicle rated for bucket `D1` serves every bucket, `D2` serves `D2..D4`,
//! `D3` serves `D3, D4` and `D4` serves only `D4`; sizes must match exactly.
//! Units still active in the last horizon year are held, so no resale is
//! credited for them.

mod coverage;
mod model;
mod problem;
mod schedule;
mod solution;
mod solver;

pub use coverage::{is_eligible, served_buckets, uncovered_segments, vehicle_serves};
pub use model::{build_model, MilpModel, Row, RowKind, Sense, VarId, VarKey, VintageChain};
pub use problem::{FleetProblem, FleetProblemBuilder};
pub use schedule::{
    precompute_schedules, AgeCostSchedule, FuelYearCost, ScheduleTable, VehicleSchedule,
    INSURANCE_RATES, MAINTENANCE_RATES, RESALE_RATES, SERVICE_LIFE_YEARS,
};
pub use solution::{
    interpret_solution, round_integral, ActiveLine, FleetPlan, PlanOutcome, PurchaseLine,
    SaleLine, SolveStatus, YearPlan, DEFAULT_INTEGRALITY_TOLERANCE,
};
pub use solver::{
    plan_fleet, solve_model, MilpSolverKind, PlannerConfig, RawSolution, DEFAULT_MAX_TIME_SECONDS,
    DEFAULT_MIP_GAP,
};
