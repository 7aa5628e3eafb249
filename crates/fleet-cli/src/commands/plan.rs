//! Fleet planning CLI commands

use anyhow::{anyhow, Context, Result};
use fleet_algo::{plan_fleet, FleetProblem, PlanOutcome, SERVICE_LIFE_YEARS};
use fleet_cli::cli::{PlanCommands, PlanFormat};
use fleet_cli::config::FleetConfig;
use fleet_core::{FleetDataset, VehicleId, Year};
use fleet_io::{load_dataset, load_dataset_with_report, plan_rows, PlanExport};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabwriter::TabWriter;
use tracing::info;

/// Exit code for a solve that ended without a proven optimal plan
const EXIT_NOT_OPTIMAL: u8 = 2;

pub fn handle(command: &PlanCommands, config: &FleetConfig) -> Result<ExitCode> {
    match command {
        PlanCommands::Solve {
            data,
            start,
            end,
            solver,
            time_limit,
            out,
            format,
            strict_coverage,
        } => handle_solve(
            config,
            data.as_deref(),
            (*start, *end),
            (solver.as_deref(), *time_limit),
            out.as_deref(),
            *format,
            *strict_coverage,
        ),
        PlanCommands::Validate { data, start, end } => {
            handle_validate(config, data.as_deref(), (*start, *end))
        }
        PlanCommands::Schedule {
            vehicle,
            data,
            start,
            end,
        } => handle_schedule(config, vehicle, data.as_deref(), (*start, *end)),
    }
}

fn load(config: &FleetConfig, data: Option<&Path>) -> Result<(PathBuf, FleetDataset)> {
    let dir = config.data_dir(data);
    let dataset = load_dataset(&dir, &config.data.files)
        .with_context(|| format!("loading dataset from {}", dir.display()))?;
    Ok((dir, dataset))
}

fn handle_solve(
    config: &FleetConfig,
    data: Option<&Path>,
    (start, end): (Option<Year>, Option<Year>),
    (solver, time_limit): (Option<&str>, Option<f64>),
    out: Option<&Path>,
    format: PlanFormat,
    strict_coverage: bool,
) -> Result<ExitCode> {
    let horizon = config.horizon(start, end)?;
    let planner = config.planner(solver, strict_coverage, time_limit)?;
    let (dir, dataset) = load(config, data)?;

    let problem = FleetProblem::with_precompute(dataset, horizon, config.planning.parallel_precompute)
        .context("preparing fleet problem")?;
    info!(
        "Planning {} vehicle models over {}-{} from {}",
        problem.num_vehicles(),
        horizon.start(),
        horizon.end(),
        dir.display()
    );

    let outcome = plan_fleet(&problem, &planner).context("planning fleet")?;

    match (out, format) {
        (Some(path), PlanFormat::Csv) => outcome.to_csv(path).context("writing plan CSV")?,
        (Some(path), PlanFormat::Json) => outcome.to_json(path).context("writing plan JSON")?,
        (None, PlanFormat::Json) => {
            let json = serde_json::to_string_pretty(&outcome.to_json_value()?)
                .context("serializing plan")?;
            println!("{}", json);
        }
        (None, PlanFormat::Csv) => {}
    }

    if !(out.is_none() && format == PlanFormat::Json) {
        print_outcome(&outcome)?;
        if let Some(path) = out {
            println!("\nResults written to {}", path.display());
        }
    }

    Ok(if outcome.is_optimal() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_NOT_OPTIMAL)
    })
}

fn print_outcome(outcome: &PlanOutcome) -> Result<()> {
    println!("Fleet Plan:");
    println!("  Status: {}", outcome.status);
    if let Some(objective) = outcome.objective {
        println!("  Total cost: ${:.2}", objective);
    }
    if let Some(message) = &outcome.message {
        println!("  Message: {}", message);
    }
    println!("  Solve time: {} ms", outcome.solve_time.as_millis());

    let Some(plan) = &outcome.plan else {
        return Ok(());
    };
    println!(
        "  Units bought: {}, sold: {}, peak fleet: {}\n",
        plan.total_purchased(),
        plan.total_sold(),
        plan.peak_active()
    );

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "YEAR\tID\tVINTAGE\tTYPE\tNUM")?;
    for row in plan_rows(plan) {
        writeln!(
            writer,
            "{}\t{}\t{}\t{:?}\t{}",
            row.year, row.vehicle, row.vintage, row.action, row.quantity
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_validate(
    config: &FleetConfig,
    data: Option<&Path>,
    (start, end): (Option<Year>, Option<Year>),
) -> Result<ExitCode> {
    let horizon = config.horizon(start, end)?;
    let dir = config.data_dir(data);
    let (dataset, report) = load_dataset_with_report(&dir, &config.data.files)
        .with_context(|| format!("loading dataset from {}", dir.display()))?;
    let problem = FleetProblem::with_precompute(dataset, horizon, config.planning.parallel_precompute)
        .context("validating dataset")?;

    println!(
        "Dataset in {} is valid for {}-{}",
        dir.display(),
        horizon.start(),
        horizon.end()
    );

    let stats = &report.stats;
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "TABLE\tROWS")?;
    writeln!(writer, "vehicles\t{}", stats.vehicles)?;
    writeln!(writer, "vehicles_fuels\t{}", stats.vehicle_fuels)?;
    writeln!(writer, "fuels\t{}", stats.fuel_entries)?;
    writeln!(writer, "demand\t{}", stats.demand_segments)?;
    writeln!(writer, "carbon_emissions\t{}", stats.carbon_limits)?;
    match stats.budgets {
        Some(rows) => writeln!(writer, "budget\t{}", rows)?,
        None => writeln!(writer, "budget\t(none)")?,
    }
    writer.flush()?;

    for warning in &report.warnings {
        match &warning.entity {
            Some(entity) => println!("  Warning [{}] {}: {}", warning.table, entity, warning.message),
            None => println!("  Warning [{}] {}", warning.table, warning.message),
        }
    }

    let uncovered = problem.uncovered_segments();
    if uncovered.is_empty() {
        println!("All demand segments have an eligible vehicle model");
    } else {
        println!("Uncovered demand segments ({}):", uncovered.len());
        for segment in uncovered {
            println!(
                "  {} {} {} ({})",
                segment.year, segment.size, segment.distance, segment.volume
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn handle_schedule(
    config: &FleetConfig,
    vehicle: &str,
    data: Option<&Path>,
    (start, end): (Option<Year>, Option<Year>),
) -> Result<ExitCode> {
    let horizon = config.horizon(start, end)?;
    let (_, dataset) = load(config, data)?;
    let problem = FleetProblem::with_precompute(dataset, horizon, config.planning.parallel_precompute)
        .context("preparing fleet problem")?;

    let id = VehicleId::new(vehicle);
    let schedule = problem
        .schedules()
        .get(&id)
        .ok_or_else(|| anyhow!("unknown vehicle '{}'", vehicle))?;

    println!("Vehicle {} (model year {})", schedule.vehicle, schedule.model_year);

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "AGE\tINSURANCE\tMAINTENANCE\tRESALE")?;
    for age in 0..SERVICE_LIFE_YEARS {
        let costs = &schedule.age_costs;
        if let (Some(ins), Some(mnt), Some(res)) =
            (costs.insurance(age), costs.maintenance(age), costs.resale(age))
        {
            writeln!(
                writer,
                "{}\t{:.2}\t{:.2}\t{:.2}",
                age,
                ins.value(),
                mnt.value(),
                res.value()
            )?;
        }
    }
    writer.flush()?;

    println!();
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "FUEL\tYEAR\tFUEL COST\tEMISSIONS")?;
    for (fuel, year, cost) in schedule.fuel_years() {
        writeln!(
            writer,
            "{}\t{}\t{:.2}\t{:.2}",
            fuel,
            year,
            cost.fuel_cost.value(),
            cost.emissions.value()
        )?;
    }
    writer.flush()?;

    let years: Vec<String> = schedule
        .purchase_years(&horizon)
        .iter()
        .map(Year::to_string)
        .collect();
    println!("\nPurchasable in: {}", years.join(", "));

    Ok(ExitCode::SUCCESS)
}
