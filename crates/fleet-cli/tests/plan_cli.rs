//! Integration tests for `fleet-cli plan` commands

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_dataset(dir: &Path, carbon_limit: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("vehicles.csv"),
        "ID,Vehicle,Size,Year,Cost ($),Yearly range (km),Distance\n\
         BEV_S1_2023,BEV,S1,2023,100000,50000,D1\n\
         LNG_S2_2023,LNG,S2,2023,120000,60000,D3\n",
    )
    .unwrap();
    fs::write(
        dir.join("vehicles_fuels.csv"),
        "ID,Fuel,Consumption (unit_fuel/km)\n\
         BEV_S1_2023,Electricity,0.3\n\
         LNG_S2_2023,LNG,0.2\n",
    )
    .unwrap();
    fs::write(
        dir.join("fuels.csv"),
        "Fuel,Year,Emissions (CO2/unit_fuel),Cost ($/unit_fuel),Cost Uncertainty (±%)\n\
         Electricity,2023,2,1,0\n\
         Electricity,2024,2,1,0\n\
         LNG,2023,2.5,1.2,0\n\
         LNG,2024,2.5,1.2,0\n",
    )
    .unwrap();
    fs::write(
        dir.join("demand.csv"),
        "Year,Size,Distance,Demand (km)\n\
         2023,S1,D2,40000\n\
         2024,S1,D2,40000\n\
         2024,S2,D4,50000\n",
    )
    .unwrap();
    fs::write(
        dir.join("carbon_emissions.csv"),
        format!("Year,Carbon emission CO2/kg\n2023,{carbon_limit}\n2024,{carbon_limit}\n"),
    )
    .unwrap();
}

fn write_config(dir: &Path, data: &Path) -> std::path::PathBuf {
    let path = dir.join("fleet.toml");
    fs::write(
        &path,
        format!(
            "[data]\ndir = {:?}\n\n[horizon]\nstart = 2023\nend = 2024\n\n[logging]\nlevel = \"warn\"\n",
            data.display().to_string()
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_plan_help() {
    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_plan_solve_help() {
    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "solve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--strict-coverage"))
        .stdout(predicate::str::contains("--time-limit"))
        .stdout(predicate::str::contains("--format"));
}

#[test]
fn test_plan_validate_runs() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("Dataset");
    write_dataset(&data, "1000000");
    let config = write_config(tmp.path(), &data);

    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "validate", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid for 2023-2024"))
        .stdout(predicate::str::contains("All demand segments"));
}

#[test]
fn test_plan_solve_writes_csv() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("Dataset");
    write_dataset(&data, "1000000");
    let config = write_config(tmp.path(), &data);
    let out = tmp.path().join("plan.csv");

    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "solve", "--config"])
        .arg(&config)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: optimal"));

    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("Year,ID,Vintage,Type,Num_Vehicles"));
    assert!(csv.contains("2023,BEV_S1_2023,2023,Buy,1"));
    assert!(csv.contains("LNG_S2_2023"));
}

#[test]
fn test_plan_solve_json_to_stdout() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("Dataset");
    write_dataset(&data, "1000000");
    let config = write_config(tmp.path(), &data);

    let output = cargo_bin_cmd!("fleet-cli")
        .args(["plan", "solve", "--format", "json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "optimal");
    assert!(value["plan"].as_array().is_some_and(|rows| !rows.is_empty()));
}

#[test]
fn test_plan_solve_infeasible_exit_code() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("Dataset");
    write_dataset(&data, "1");
    let config = write_config(tmp.path(), &data);

    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "solve", "--config"])
        .arg(&config)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("infeasible"));
}

#[test]
fn test_plan_solve_rejects_zero_time_limit() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("Dataset");
    write_dataset(&data, "1000000");
    let config = write_config(tmp.path(), &data);

    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "solve", "--time-limit", "0", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_time_seconds must be positive"));
}

#[test]
fn test_plan_solve_missing_data_dir() {
    let tmp = tempdir().unwrap();
    let config = write_config(tmp.path(), &tmp.path().join("nowhere"));

    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "solve", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("loading dataset"));
}

#[test]
fn test_plan_schedule_unknown_vehicle() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("Dataset");
    write_dataset(&data, "1000000");
    let config = write_config(tmp.path(), &data);

    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "schedule", "--vehicle", "Ghost_S1_2023", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown vehicle"));
}

#[test]
fn test_plan_schedule_prints_ages() {
    let tmp = tempdir().unwrap();
    let data = tmp.path().join("Dataset");
    write_dataset(&data, "1000000");
    let config = write_config(tmp.path(), &data);

    let mut cmd = cargo_bin_cmd!("fleet-cli");
    cmd.args(["plan", "schedule", "--vehicle", "BEV_S1_2023", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("AGE"))
        .stdout(predicate::str::contains("Purchasable in: 2023"));
}
