//! Fleet plan export (CSV, JSON)

use fleet_algo::{FleetPlan, PlanOutcome};
use fleet_core::{FleetResult, VehicleId, Year};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const PLAN_CSV_HEADER: [&str; 5] = ["Year", "ID", "Vintage", "Type", "Num_Vehicles"];

/// What a plan row records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanAction {
    Buy,
    Use,
    Sell,
}

/// One line of the exported plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRow {
    #[serde(rename = "Year")]
    pub year: Year,
    #[serde(rename = "ID")]
    pub vehicle: VehicleId,
    #[serde(rename = "Vintage")]
    pub vintage: Year,
    #[serde(rename = "Type")]
    pub action: PlanAction,
    #[serde(rename = "Num_Vehicles")]
    pub quantity: u64,
}

/// Flatten a plan into Buy, Use and Sell rows, year by year.
pub fn plan_rows(plan: &FleetPlan) -> Vec<PlanRow> {
    let mut rows = Vec::new();
    for year in plan.years() {
        rows.extend(year.purchases.iter().map(|line| PlanRow {
            year: year.year,
            vehicle: line.vehicle.clone(),
            vintage: year.year,
            action: PlanAction::Buy,
            quantity: line.quantity,
        }));
        rows.extend(year.active.iter().map(|line| PlanRow {
            year: year.year,
            vehicle: line.vehicle.clone(),
            vintage: line.vintage,
            action: PlanAction::Use,
            quantity: line.quantity,
        }));
        rows.extend(year.sales.iter().map(|line| PlanRow {
            year: year.year,
            vehicle: line.vehicle.clone(),
            vintage: line.vintage,
            action: PlanAction::Sell,
            quantity: line.quantity,
        }));
    }
    rows
}

/// Write `plan` as CSV. The header is written even for an empty plan.
pub fn write_plan_csv<W: Write>(plan: &FleetPlan, writer: W) -> FleetResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(PLAN_CSV_HEADER)
        .map_err(std::io::Error::from)?;
    for row in plan_rows(plan) {
        wtr.serialize(row).map_err(std::io::Error::from)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export for planner outcomes
pub trait PlanExport {
    /// Export the plan rows to a CSV file
    fn to_csv(&self, path: &Path) -> FleetResult<()>;

    /// Export status, objective and plan to a JSON file
    fn to_json(&self, path: &Path) -> FleetResult<()>;

    /// Convert to JSON value (for stdout)
    fn to_json_value(&self) -> FleetResult<serde_json::Value>;
}

impl PlanExport for PlanOutcome {
    fn to_csv(&self, path: &Path) -> FleetResult<()> {
        let file = BufWriter::new(File::create(path)?);
        match &self.plan {
            Some(plan) => write_plan_csv(plan, file),
            None => {
                let mut wtr = csv::Writer::from_writer(file);
                wtr.write_record(PLAN_CSV_HEADER)
                    .map_err(std::io::Error::from)?;
                wtr.flush()?;
                Ok(())
            }
        }
    }

    fn to_json(&self, path: &Path) -> FleetResult<()> {
        let mut file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut file, &self.to_json_value()?)
            .map_err(std::io::Error::from)?;
        file.flush()?;
        Ok(())
    }

    fn to_json_value(&self) -> FleetResult<serde_json::Value> {
        let plan = self.plan.as_ref().map(plan_rows);
        Ok(serde_json::json!({
            "status": self.status,
            "objective": self.objective,
            "message": self.message,
            "solve_time_ms": self.solve_time.as_millis() as u64,
            "plan": plan,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_algo::{FleetProblemBuilder, PlannerConfig, SolveStatus};
    use fleet_core::{
        DemandSegment, DistanceBucket, Dollars, Kilometers, PlanningHorizon, SizeClass,
        VehicleModel,
    };
    use std::time::Duration;

    fn outcome() -> PlanOutcome {
        let problem = FleetProblemBuilder::new(PlanningHorizon::single(2023))
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
            .constant_carbon_limit(1e6)
            .demand(DemandSegment::new(
                2023,
                SizeClass::S1,
                DistanceBucket::D1,
                Kilometers(40_000.0),
            ))
            .build()
            .unwrap();
        fleet_algo::plan_fleet(&problem, &PlannerConfig::default()).unwrap()
    }

    #[test]
    fn test_plan_rows() {
        let outcome = outcome();
        let rows = plan_rows(outcome.plan.as_ref().unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].action, PlanAction::Buy);
        assert_eq!(rows[1].action, PlanAction::Use);
        assert!(rows.iter().all(|r| r.quantity == 1 && r.vintage == 2023));
    }

    #[test]
    fn test_write_plan_csv() {
        let outcome = outcome();
        let mut buf = Vec::new();
        write_plan_csv(outcome.plan.as_ref().unwrap(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Year,ID,Vintage,Type,Num_Vehicles"));
        assert_eq!(lines.next(), Some("2023,BEV_S1_2023,2023,Buy,1"));
        assert_eq!(lines.next(), Some("2023,BEV_S1_2023,2023,Use,1"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_infeasible_outcome_exports() {
        let outcome = PlanOutcome {
            status: SolveStatus::Infeasible,
            objective: None,
            plan: None,
            message: Some("demand[2023/S1/D1] cannot be satisfied by any fleet".into()),
            solve_time: Duration::ZERO,
        };
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("plan.csv");
        outcome.to_csv(&csv_path).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text.trim(), "Year,ID,Vintage,Type,Num_Vehicles");

        let value = outcome.to_json_value().unwrap();
        assert_eq!(value["status"], "infeasible");
        assert!(value["plan"].is_null());
    }

    #[test]
    fn test_json_export() {
        let outcome = outcome();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        outcome.to_json(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["status"], "optimal");
        assert_eq!(value["plan"][0]["Type"], "Buy");
        assert_eq!(value["plan"][0]["ID"], "BEV_S1_2023");
    }
}
