//! # fleet-algo: Fleet Transition Planning
//!
//! Builds and solves the mixed-integer program behind a multi-year commercial
//! fleet plan.
//!
//! ## Pipeline
//!
//! | Stage | Entry point | Output |
//! |-------|-------------|--------|
//! | Schedule precompute | [`precompute_schedules`] | age costs, fuel cost and emissions per vehicle |
//! | Coverage | [`vehicle_serves`] | which vehicles may serve a demand segment |
//! | Model building | [`build_model`] | solver-neutral [`MilpModel`] |
//! | Solving | [`solve_model`] | [`RawSolution`] with a normalized [`SolveStatus`] |
//! | Interpretation | [`interpret_solution`] | per-year [`FleetPlan`] |
//!
//! [`plan_fleet`] runs the last three stages on a [`FleetProblem`].
//!
//! ## Example
//!
//! ```ignore
//! use fleet_algo::{plan_fleet, FleetProblem, PlannerConfig};
//! use fleet_core::PlanningHorizon;
//!
//! let problem = FleetProblem::new(dataset, PlanningHorizon::default())?;
//! let outcome = plan_fleet(&problem, &PlannerConfig::default())?;
//! if let Some(plan) = &outcome.plan {
//!     println!("{}", plan.summary());
//! }
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): precompute vehicle schedules with rayon
//! - `solver-highs`: HiGHS backend next to the built-in microlp solver

pub mod plan;

pub use plan::*;
