//! End-to-end runs of the binary against presets and scenario files.

use std::path::PathBuf;
use std::process::{Command, Output};

fn run_cli(args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_autarky-sim"))
        .args(args)
        .output()
        .expect("autarky-sim process should run");
    assert!(
        output.status.success(),
        "run failed for {args:?}: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let output = run_cli(args);
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("autarky-sim-{}-{name}", std::process::id()))
}

#[test]
fn baseline_preset_text_report() {
    let output = run_cli(&["--preset", "baseline", "--period-days", "30"]);
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("--- Energy Summary ---"));
    assert!(stdout.contains("Self-sufficiency:"));
    assert!(stdout.contains("Net benefit:"));
    assert!(stdout.contains("Period  13:"));
}

#[test]
fn scenario_file_matches_preset() {
    let from_file = run_json(&["--scenario", "scenarios/baseline.toml", "--json"]);
    let from_preset = run_json(&["--preset", "baseline", "--json"]);
    assert_eq!(from_file, from_preset);
    assert_eq!(from_file["steps"], 8760);
    let ratio = from_file["self_sufficiency_pct"]
        .as_f64()
        .expect("ratio is defined");
    assert!((0.0..=100.0).contains(&ratio));
}

#[test]
fn battery_improves_on_no_battery_autarky() {
    let summary = run_json(&["--preset", "baseline", "--json"]);
    let with = summary["self_sufficiency_pct"].as_f64().expect("defined");
    let without = summary["baseline_autarky_pct"].as_f64().expect("defined");
    assert!(with >= without, "with battery {with} < without {without}");
}

#[test]
fn dimensioning_sweep_json() {
    let entries = run_json(&["--scenario", "scenarios/dimensioning.toml", "--sweep", "--json"]);
    let entries = entries.as_array().expect("sweep prints an array");
    let capacities: Vec<f64> = entries
        .iter()
        .map(|e| e["capacity_kwh"].as_f64().expect("capacity"))
        .collect();
    assert_eq!(capacities, vec![5.0, 10.0, 15.0, 20.0, 25.0, 35.0]);
}

#[test]
fn minute_scenario_runs() {
    let summary = run_json(&["--scenario", "scenarios/minute_week.toml", "--json"]);
    assert_eq!(summary["steps"], 7 * 24 * 60);
}

#[test]
fn capacities_flag_writes_sweep_csv() {
    let path = temp_path("sweep.csv");
    let path_str = path.to_str().expect("utf-8 temp path");
    let output = run_cli(&["--capacities", "4,8", "--workers", "2", "--telemetry-out", path_str]);
    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.contains("--- Capacity Sweep ---"));

    let csv = std::fs::read_to_string(&path).expect("sweep CSV written");
    std::fs::remove_file(&path).ok();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("4.00,"));
    assert!(lines[2].starts_with("8.00,"));
}

#[test]
fn readings_file_is_used() {
    let readings = temp_path("readings.csv");
    std::fs::write(
        &readings,
        "grid_import_kwh,grid_export_kwh,pv_kwh\n0,2,3\n2,0,0\n1,0,0.5\n",
    )
    .expect("write readings");
    let telemetry = temp_path("steps.csv");
    let summary = run_json(&[
        "--readings",
        readings.to_str().expect("utf-8 temp path"),
        "--telemetry-out",
        telemetry.to_str().expect("utf-8 temp path"),
        "--json",
    ]);
    let steps_csv = std::fs::read_to_string(&telemetry).expect("telemetry written");
    std::fs::remove_file(&readings).ok();
    std::fs::remove_file(&telemetry).ok();

    assert_eq!(summary["steps"], 3);
    // consumption = pv - export + import = 1 + 2 + 1.5
    assert!((summary["total_consumption_kwh"].as_f64().expect("total") - 4.5).abs() < 1e-9);
    assert_eq!(steps_csv.lines().count(), 4);
}

#[test]
fn unknown_preset_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_autarky-sim"))
        .args(["--preset", "nonexistent"])
        .output()
        .expect("autarky-sim process should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"));
}
