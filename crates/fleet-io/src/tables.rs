//! CSV readers for the fleet input tables
//!
//! | Table | Columns |
//! |-------|---------|
//! | vehicles | `ID, Vehicle, Size, Year, Cost ($), Yearly range (km), Distance` |
//! | vehicles_fuels | `ID, Fuel, Consumption (unit_fuel/km)` |
//! | fuels | `Fuel, Year, Emissions (CO2/unit_fuel), Cost ($/unit_fuel), Cost Uncertainty (±%)` |
//! | demand | `Year, Size, Distance, Demand (km)` |
//! | carbon_emissions | `Year, Carbon emission CO2/kg` |
//! | budget (optional) | `Year, Budget ($)` |
//!
//! Headers and fields are trimmed. Missing fields and malformed numbers fail
//! with [`FleetError::Parse`] naming the table and line.

use crate::diagnostics::LoadReport;
use csv::{ReaderBuilder, StringRecord, Trim};
use fleet_core::{
    BudgetLimit, CarbonLimit, Co2, DemandSegment, DistanceBucket, Dollars, FleetDataset,
    FleetError, FleetResult, FuelType, FuelYearEntry, Kilometers, SizeClass, VehicleId,
    VehicleModel, Year,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// File names of the input tables inside a data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFiles {
    pub vehicles: String,
    pub vehicle_fuels: String,
    pub fuels: String,
    pub demand: String,
    pub carbon_limits: String,
    /// Loaded only if the file exists
    pub budget: String,
}

impl Default for TableFiles {
    fn default() -> Self {
        Self {
            vehicles: "vehicles.csv".to_string(),
            vehicle_fuels: "vehicles_fuels.csv".to_string(),
            fuels: "fuels.csv".to_string(),
            demand: "demand.csv".to_string(),
            carbon_limits: "carbon_emissions.csv".to_string(),
            budget: "budget.csv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VehicleRecord {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Vehicle")]
    vehicle_type: String,
    #[serde(rename = "Size")]
    size: String,
    #[serde(rename = "Year")]
    year: Year,
    #[serde(rename = "Cost ($)")]
    cost: f64,
    #[serde(rename = "Yearly range (km)")]
    yearly_range: f64,
    #[serde(rename = "Distance")]
    distance: String,
}

#[derive(Debug, Deserialize)]
struct VehicleFuelRecord {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Fuel")]
    fuel: String,
    #[serde(rename = "Consumption (unit_fuel/km)")]
    consumption: f64,
}

#[derive(Debug, Deserialize)]
struct FuelRecord {
    #[serde(rename = "Fuel")]
    fuel: String,
    #[serde(rename = "Year")]
    year: Year,
    #[serde(rename = "Emissions (CO2/unit_fuel)")]
    emissions: f64,
    #[serde(rename = "Cost ($/unit_fuel)")]
    cost: f64,
    #[serde(rename = "Cost Uncertainty (±%)", default)]
    cost_uncertainty: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DemandRecord {
    #[serde(rename = "Year")]
    year: Year,
    #[serde(rename = "Size")]
    size: String,
    #[serde(rename = "Distance")]
    distance: String,
    #[serde(rename = "Demand (km)")]
    demand: f64,
}

#[derive(Debug, Deserialize)]
struct CarbonRecord {
    #[serde(rename = "Year")]
    year: Year,
    #[serde(rename = "Carbon emission CO2/kg")]
    limit: f64,
}

#[derive(Debug, Deserialize)]
struct BudgetRecord {
    #[serde(rename = "Year")]
    year: Year,
    #[serde(rename = "Budget ($)")]
    budget: f64,
}

/// One row of the vehicle/fuel consumption table.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFuel {
    pub vehicle: VehicleId,
    pub fuel: FuelType,
    pub consumption: f64,
    /// Source line, for diagnostics
    pub line: u64,
}

fn csv_error(table: &str, err: csv::Error) -> FleetError {
    if err.is_io_error() {
        return FleetError::Io(err.into());
    }
    FleetError::Parse {
        table: table.to_string(),
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}

/// Read every row of `path` as `T`, keeping the line each came from.
fn read_table<T: DeserializeOwned>(path: &Path, table: &str) -> FleetResult<Vec<(u64, T)>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(table, e))?;
    let headers: StringRecord = rdr.headers().map_err(|e| csv_error(table, e))?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(table, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: T = record
            .deserialize(Some(&headers))
            .map_err(|e| FleetError::Parse {
                table: table.to_string(),
                line,
                message: e.to_string(),
            })?;
        rows.push((line, row));
    }
    debug!(table, rows = rows.len(), path = %path.display(), "read table");
    Ok(rows)
}

fn parse_number(table: &str, line: u64, column: &str, value: f64) -> FleetResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FleetError::Parse {
            table: table.to_string(),
            line,
            message: format!("{} is not a finite number", column),
        })
    }
}

/// Read the vehicle table. Fuels are attached separately by [`attach_fuels`].
pub fn read_vehicles(path: &Path) -> FleetResult<Vec<VehicleModel>> {
    const TABLE: &str = "vehicles";
    read_table::<VehicleRecord>(path, TABLE)?
        .into_iter()
        .map(|(line, r)| {
            Ok(VehicleModel::new(
                r.id,
                r.vehicle_type,
                r.size.parse::<SizeClass>()?,
                r.year,
                Dollars(parse_number(TABLE, line, "Cost ($)", r.cost)?),
                Kilometers(parse_number(TABLE, line, "Yearly range (km)", r.yearly_range)?),
                r.distance.parse::<DistanceBucket>()?,
            ))
        })
        .collect()
}

pub fn read_vehicle_fuels(path: &Path) -> FleetResult<Vec<VehicleFuel>> {
    const TABLE: &str = "vehicles_fuels";
    read_table::<VehicleFuelRecord>(path, TABLE)?
        .into_iter()
        .map(|(line, r)| {
            Ok(VehicleFuel {
                vehicle: VehicleId::new(r.id),
                fuel: FuelType::new(r.fuel),
                consumption: parse_number(TABLE, line, "Consumption", r.consumption)?,
                line,
            })
        })
        .collect()
}

/// Join consumption rows into their vehicle models.
pub fn attach_fuels(vehicles: &mut [VehicleModel], rows: Vec<VehicleFuel>) -> FleetResult<()> {
    let index: HashMap<VehicleId, usize> = vehicles
        .iter()
        .enumerate()
        .map(|(i, v)| (v.id.clone(), i))
        .collect();
    let mut seen: HashSet<(VehicleId, FuelType)> = HashSet::new();

    for row in rows {
        let Some(&i) = index.get(&row.vehicle) else {
            return Err(FleetError::UnknownVehicle {
                table: "vehicles_fuels".to_string(),
                vehicle: row.vehicle,
            });
        };
        if !seen.insert((row.vehicle.clone(), row.fuel.clone())) {
            return Err(FleetError::DuplicateKey {
                entity: "vehicle fuel".to_string(),
                key: format!("{}/{}", row.vehicle, row.fuel),
            });
        }
        vehicles[i].fuel_consumption.insert(row.fuel, row.consumption);
    }
    Ok(())
}

pub fn read_fuels(path: &Path) -> FleetResult<Vec<FuelYearEntry>> {
    const TABLE: &str = "fuels";
    read_table::<FuelRecord>(path, TABLE)?
        .into_iter()
        .map(|(line, r)| {
            let entry = FuelYearEntry::new(
                r.fuel.as_str(),
                r.year,
                Co2(parse_number(TABLE, line, "Emissions", r.emissions)?),
                Dollars(parse_number(TABLE, line, "Cost", r.cost)?),
            );
            Ok(match r.cost_uncertainty {
                Some(pct) => entry.with_uncertainty(parse_number(TABLE, line, "Cost Uncertainty", pct)?),
                None => entry,
            })
        })
        .collect()
}

pub fn read_demand(path: &Path) -> FleetResult<Vec<DemandSegment>> {
    const TABLE: &str = "demand";
    read_table::<DemandRecord>(path, TABLE)?
        .into_iter()
        .map(|(line, r)| {
            Ok(DemandSegment::new(
                r.year,
                r.size.parse()?,
                r.distance.parse()?,
                Kilometers(parse_number(TABLE, line, "Demand (km)", r.demand)?),
            ))
        })
        .collect()
}

pub fn read_carbon_limits(path: &Path) -> FleetResult<Vec<CarbonLimit>> {
    const TABLE: &str = "carbon_emissions";
    read_table::<CarbonRecord>(path, TABLE)?
        .into_iter()
        .map(|(line, r)| {
            Ok(CarbonLimit {
                year: r.year,
                limit: Co2(parse_number(TABLE, line, "Carbon emission", r.limit)?),
            })
        })
        .collect()
}

pub fn read_budgets(path: &Path) -> FleetResult<Vec<BudgetLimit>> {
    const TABLE: &str = "budget";
    read_table::<BudgetRecord>(path, TABLE)?
        .into_iter()
        .map(|(line, r)| {
            Ok(BudgetLimit {
                year: r.year,
                budget: Dollars(parse_number(TABLE, line, "Budget ($)", r.budget)?),
            })
        })
        .collect()
}

/// Load every table in `dir` into a [`FleetDataset`].
///
/// Horizon-dependent checks are left to [`FleetDataset::validate`].
pub fn load_dataset(dir: &Path, files: &TableFiles) -> FleetResult<FleetDataset> {
    load_dataset_with_report(dir, files).map(|(dataset, _)| dataset)
}

/// Like [`load_dataset`], also returning row counts and non-fatal findings.
pub fn load_dataset_with_report(
    dir: &Path,
    files: &TableFiles,
) -> FleetResult<(FleetDataset, LoadReport)> {
    let mut report = LoadReport::new();

    let mut vehicles = read_vehicles(&dir.join(&files.vehicles))?;
    let vehicle_fuels = read_vehicle_fuels(&dir.join(&files.vehicle_fuels))?;
    let fuels = read_fuels(&dir.join(&files.fuels))?;
    let demand = read_demand(&dir.join(&files.demand))?;
    let carbon_limits = read_carbon_limits(&dir.join(&files.carbon_limits))?;

    let budget_path = dir.join(&files.budget);
    let budgets = if budget_path.is_file() {
        Some(read_budgets(&budget_path)?)
    } else {
        info!(path = %budget_path.display(), "no budget table; budget constraint disabled");
        None
    };

    report.stats.vehicles = vehicles.len();
    report.stats.vehicle_fuels = vehicle_fuels.len();
    report.stats.fuel_entries = fuels.len();
    report.stats.demand_segments = demand.len();
    report.stats.carbon_limits = carbon_limits.len();
    report.stats.budgets = budgets.as_ref().map(Vec::len);

    attach_fuels(&mut vehicles, vehicle_fuels)?;

    for vehicle in &vehicles {
        if vehicle.num_fuels() == 0 {
            report.add_warning_with_entity("vehicles_fuels", "vehicle has no fuel", vehicle.id.as_str());
        }
        if vehicle.yearly_range.value() == 0.0 {
            report.add_warning_with_entity(
                "vehicles",
                "yearly range is zero; the model cannot serve demand",
                vehicle.id.as_str(),
            );
        }
    }
    let uncertain = fuels
        .iter()
        .filter(|entry| entry.cost_uncertainty_pct != 0.0)
        .count();
    if uncertain > 0 {
        report.add_warning(
            "fuels",
            &format!(
                "{} fuel-year entries carry a cost uncertainty; the planner uses nominal costs",
                uncertain
            ),
        );
    }

    let dataset = FleetDataset::new(vehicles, fuels, demand, carbon_limits, budgets)?;
    info!(
        dir = %dir.display(),
        vehicles = report.stats.vehicles,
        fuel_entries = report.stats.fuel_entries,
        segments = report.stats.demand_segments,
        warnings = report.warning_count(),
        "dataset loaded"
    );
    Ok((dataset, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_vehicles_trims_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "vehicles.csv",
            "ID,Vehicle,Size,Year,Cost ($),Yearly range (km),Distance\n\
             BEV_S1_2023, BEV , S1 ,2023,187000,102000, D4\n",
        );
        let vehicles = read_vehicles(&path).unwrap();
        assert_eq!(vehicles.len(), 1);
        let v = &vehicles[0];
        assert_eq!(v.id, VehicleId::new("BEV_S1_2023"));
        assert_eq!(v.vehicle_type, "BEV");
        assert_eq!(v.size, SizeClass::S1);
        assert_eq!(v.distance_bucket, DistanceBucket::D4);
        assert_eq!(v.purchase_cost, Dollars(187_000.0));
    }

    #[test]
    fn test_malformed_number_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "demand.csv",
            "Year,Size,Distance,Demand (km)\n2023,S1,D1,100\n2023,S2,D1,lots\n",
        );
        let err = read_demand(&path).unwrap_err();
        match err {
            FleetError::Parse { table, line, .. } => {
                assert_eq!(table, "demand");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_codes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "demand.csv",
            "Year,Size,Distance,Demand (km)\n2023,S9,D1,100\n",
        );
        assert!(matches!(
            read_demand(&path),
            Err(FleetError::UnknownSizeClass(code)) if code == "S9"
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_fuels(&dir.path().join("fuels.csv")).unwrap_err();
        assert!(matches!(err, FleetError::Io(_)));
    }

    #[test]
    fn test_fuel_uncertainty_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "fuels.csv",
            "Fuel,Year,Emissions (CO2/unit_fuel),Cost ($/unit_fuel)\nElectricity,2023,0.1,0.3\n",
        );
        let fuels = read_fuels(&path).unwrap();
        assert_eq!(fuels[0].cost_uncertainty_pct, 0.0);
        assert_eq!(fuels[0].cost_per_unit, Dollars(0.3));
    }

    #[test]
    fn test_attach_fuels() {
        let mut vehicles = vec![VehicleModel::new(
            "LNG_S1_2023",
            "LNG",
            SizeClass::S1,
            2023,
            Dollars(1.0),
            Kilometers(1.0),
            DistanceBucket::D1,
        )];
        let row = |vehicle: &str, fuel: &str| VehicleFuel {
            vehicle: VehicleId::new(vehicle),
            fuel: FuelType::new(fuel),
            consumption: 0.1,
            line: 2,
        };

        attach_fuels(&mut vehicles, vec![row("LNG_S1_2023", "LNG"), row("LNG_S1_2023", "BioLNG")])
            .unwrap();
        assert_eq!(vehicles[0].num_fuels(), 2);

        let err = attach_fuels(&mut vehicles, vec![row("Ghost", "LNG")]).unwrap_err();
        assert!(matches!(err, FleetError::UnknownVehicle { .. }));

        let err = attach_fuels(&mut vehicles, vec![row("LNG_S1_2023", "HVO"), row("LNG_S1_2023", "HVO")])
            .unwrap_err();
        assert!(matches!(err, FleetError::DuplicateKey { .. }));
    }
}
