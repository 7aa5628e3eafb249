//! Fleet MILP solver
//!
//! Maps a [`MilpModel`] onto a good_lp backend and normalizes what comes back.

use super::model::{build_model, MilpModel, Row, Sense};
use super::problem::FleetProblem;
use super::solution::{
    interpret_solution, PlanOutcome, SolveStatus, DEFAULT_INTEGRALITY_TOLERANCE,
};
use fleet_core::{FleetError, FleetResult};
#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs;
use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Constraint, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable, WithMipGap, WithTimeLimit,
};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Integer-capable MILP backends
///
/// HiGHS is the default whenever it is compiled in; microlp is always
/// available and suits small instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilpSolverKind {
    /// Pure-Rust branch and bound
    Microlp,
    #[cfg(feature = "solver-highs")]
    Highs,
}

impl Default for MilpSolverKind {
    fn default() -> Self {
        #[cfg(feature = "solver-highs")]
        {
            MilpSolverKind::Highs
        }
        #[cfg(not(feature = "solver-highs"))]
        {
            MilpSolverKind::Microlp
        }
    }
}

const AVAILABLE_MILP_SOLVERS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

impl MilpSolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_MILP_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MilpSolverKind::Microlp => "microlp",
            #[cfg(feature = "solver-highs")]
            MilpSolverKind::Highs => "highs",
        }
    }
}

impl std::fmt::Display for MilpSolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unknown_solver_error(label: &str) -> FleetError {
    FleetError::Config(format!(
        "unknown milp solver '{}'; supported values: {}",
        label,
        MilpSolverKind::available().join(", ")
    ))
}

impl FromStr for MilpSolverKind {
    type Err = FleetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" => Ok(MilpSolverKind::Microlp),
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(MilpSolverKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            _ => Err(unknown_solver_error(&normalized)),
        }
    }
}

/// Default wall-clock budget of one solve (seconds)
pub const DEFAULT_MAX_TIME_SECONDS: f64 = 300.0;

/// Default relative MIP gap at which a plan counts as optimal
pub const DEFAULT_MIP_GAP: f64 = 1e-4;

/// Fleet planner configuration
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// MILP backend
    pub solver: MilpSolverKind,
    /// Accepted distance of a solution value from the nearest integer
    pub integrality_tolerance: f64,
    /// Fail before solving when a demand segment has no eligible vehicle
    pub strict_coverage: bool,
    /// Maximum solve time (seconds)
    pub max_time_seconds: f64,
    /// MIP optimality gap tolerance
    pub mip_gap: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            solver: MilpSolverKind::default(),
            integrality_tolerance: DEFAULT_INTEGRALITY_TOLERANCE,
            strict_coverage: false,
            max_time_seconds: DEFAULT_MAX_TIME_SECONDS,
            mip_gap: DEFAULT_MIP_GAP,
        }
    }
}

/// Backend output before interpretation
#[derive(Debug, Clone)]
pub struct RawSolution {
    pub status: SolveStatus,
    /// One value per model variable; empty when no plan was found
    pub values: Vec<f64>,
    pub message: Option<String>,
    pub solve_time: Duration,
}

impl RawSolution {
    fn without_values(status: SolveStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            status,
            values: Vec::new(),
            message: Some(message.into()),
            solve_time: start.elapsed(),
        }
    }
}

fn row_constraint(row: &Row, handles: &[Variable]) -> Constraint {
    let mut lhs = Expression::from(0.0);
    for (var, coef) in &row.terms {
        lhs += *coef * handles[var.index()];
    }
    let rhs = row.rhs;
    match row.sense {
        Sense::Le => constraint!(lhs <= rhs),
        Sense::Ge => constraint!(lhs >= rhs),
    }
}

fn run<M>(
    problem: M,
    constraints: Vec<Constraint>,
    handles: &[Variable],
    config: &PlannerConfig,
) -> Result<(SolutionStatus, Vec<f64>), ResolutionError>
where
    M: SolverModel<Error = ResolutionError> + WithTimeLimit + WithMipGap,
{
    let mut problem = problem
        .with_time_limit(config.max_time_seconds)
        .with_mip_gap(config.mip_gap as f32)
        .map_err(|e| ResolutionError::Str(e.to_string()))?;
    for c in constraints {
        problem = problem.with(c);
    }
    let solution = problem.solve()?;
    let values = handles.iter().map(|v| solution.value(*v)).collect();
    Ok((solution.status(), values))
}

/// Solve `model` with the backend and limits of `config`.
///
/// Rows without variables are checked up front: a violated one makes the
/// model infeasible without calling the backend.
pub fn solve_model(model: &MilpModel, config: &PlannerConfig) -> RawSolution {
    let start = Instant::now();
    let kind = config.solver;
    let tolerance = config.integrality_tolerance;

    if let Some(row) = model
        .rows()
        .iter()
        .find(|row| row.is_constant() && !row.is_satisfied(&[], tolerance))
    {
        return RawSolution::without_values(
            SolveStatus::Infeasible,
            format!("{} cannot be satisfied by any fleet", row.kind),
            start,
        );
    }

    if model.num_vars() == 0 {
        return RawSolution {
            status: SolveStatus::Optimal,
            values: Vec::new(),
            message: None,
            solve_time: start.elapsed(),
        };
    }

    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = (0..model.num_vars())
        .map(|_| vars.add(variable().integer().min(0.0)))
        .collect();

    let mut objective = Expression::from(0.0);
    for (var, coef) in model.objective() {
        objective += coef * handles[var.index()];
    }

    let constraints: Vec<Constraint> = model
        .rows()
        .iter()
        .filter(|row| !row.is_constant())
        .map(|row| row_constraint(row, &handles))
        .collect();

    debug!(
        solver = kind.as_str(),
        variables = handles.len(),
        constraints = constraints.len(),
        max_time_seconds = config.max_time_seconds,
        mip_gap = config.mip_gap,
        "handing fleet model to backend"
    );

    let unsolved = vars.minimise(objective);
    let result = match kind {
        MilpSolverKind::Microlp => run(unsolved.using(microlp), constraints, &handles, config),
        #[cfg(feature = "solver-highs")]
        MilpSolverKind::Highs => run(unsolved.using(highs), constraints, &handles, config),
    };

    match result {
        Ok((SolutionStatus::Optimal, values)) => RawSolution {
            status: SolveStatus::Optimal,
            values,
            message: None,
            solve_time: start.elapsed(),
        },
        Ok((SolutionStatus::GapLimit, values)) => RawSolution {
            status: SolveStatus::Optimal,
            values,
            message: Some(format!("within a relative MIP gap of {}", config.mip_gap)),
            solve_time: start.elapsed(),
        },
        Ok((SolutionStatus::TimeLimit, values)) => RawSolution {
            status: SolveStatus::Feasible,
            values,
            message: Some(format!(
                "time limit of {}s reached; plan is feasible but not proven optimal",
                config.max_time_seconds
            )),
            solve_time: start.elapsed(),
        },
        Err(ResolutionError::Infeasible) => RawSolution::without_values(
            SolveStatus::Infeasible,
            "backend proved the model infeasible",
            start,
        ),
        Err(ResolutionError::Unbounded) => RawSolution::without_values(
            SolveStatus::Unbounded,
            "backend reported an unbounded objective",
            start,
        ),
        Err(other) => RawSolution::without_values(SolveStatus::NotSolved, other.to_string(), start),
    }
}

/// Build, solve and interpret the fleet plan for `problem`.
///
/// Data problems surface as errors before solving. A solve stopped by the time
/// limit keeps its plan under [`SolveStatus::Feasible`]; any other status than
/// optimal is returned as an outcome without a plan.
pub fn plan_fleet(problem: &FleetProblem, config: &PlannerConfig) -> FleetResult<PlanOutcome> {
    let model = build_model(problem, config.strict_coverage)?;
    let raw = solve_model(&model, config);

    info!(
        solver = config.solver.as_str(),
        status = %raw.status,
        elapsed_ms = raw.solve_time.as_millis() as u64,
        "fleet model solved"
    );

    if !matches!(raw.status, SolveStatus::Optimal | SolveStatus::Feasible) {
        if let Some(message) = &raw.message {
            warn!(status = %raw.status, "{}", message);
        }
        return Ok(PlanOutcome {
            status: raw.status,
            objective: None,
            plan: None,
            message: raw.message,
            solve_time: raw.solve_time,
        });
    }

    let plan = interpret_solution(&model, &raw.values, config.integrality_tolerance)?;
    let rounded: Vec<f64> = raw.values.iter().map(|v| v.round()).collect();
    let objective = model.objective_value(&rounded);

    info!(
        objective,
        purchased = plan.total_purchased(),
        sold = plan.total_sold(),
        "fleet plan ready"
    );

    if raw.status == SolveStatus::Feasible {
        if let Some(message) = &raw.message {
            warn!(status = %raw.status, "{}", message);
        }
    }

    Ok(PlanOutcome {
        status: raw.status,
        objective: Some(objective),
        plan: Some(plan),
        message: raw.message,
        solve_time: raw.solve_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_kind_parsing() {
        assert_eq!("microlp".parse::<MilpSolverKind>().unwrap(), MilpSolverKind::Microlp);
        assert_eq!(" MicroLP ".parse::<MilpSolverKind>().unwrap(), MilpSolverKind::Microlp);
        let err = "gurobi".parse::<MilpSolverKind>().unwrap_err();
        assert!(matches!(err, FleetError::Config(_)));
        assert!(err.to_string().contains("microlp"));
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn test_highs_requires_feature() {
        assert!("highs".parse::<MilpSolverKind>().is_err());
        assert_eq!(MilpSolverKind::available(), &["microlp"]);
    }

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.solver, MilpSolverKind::default());
        assert_eq!(config.integrality_tolerance, 1e-6);
        assert!(!config.strict_coverage);
        assert_eq!(config.max_time_seconds, 300.0);
        assert_eq!(config.mip_gap, 1e-4);
    }

    #[cfg(feature = "solver-highs")]
    #[test]
    fn test_highs_is_default_when_compiled() {
        assert_eq!(MilpSolverKind::default(), MilpSolverKind::Highs);
        assert_eq!(MilpSolverKind::available(), &["microlp", "highs"]);
    }

    #[cfg(not(feature = "solver-highs"))]
    #[test]
    fn test_microlp_is_default_without_highs() {
        assert_eq!(MilpSolverKind::default(), MilpSolverKind::Microlp);
    }
}
