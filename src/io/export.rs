//! CSV export for per-step trajectories and capacity sweeps.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::balance::EnergyBalance;
use crate::sim::{RunReport, StepGrid, SweepResults};

/// Column header for per-step telemetry export.
const STEP_HEADER: &str = "step,time_hr,pv_kwh,consumption_kwh,surplus_kwh,\
                           soc_kwh,charge_kwh,discharge_kwh";

/// Column header for sweep export.
const SWEEP_HEADER: &str = "capacity_kwh,self_sufficiency_pct,energy_into_battery_kwh,\
                            energy_out_of_battery_kwh,net_benefit,floor_steps,ceiling_steps";

/// Exports one run's per-step series to a CSV file at the given path.
///
/// # Arguments
///
/// * `balance` - Energy balance the run was computed from
/// * `report` - Result of [`run`](crate::sim::run) on that balance
/// * `grid` - Step grid used for the time column
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_steps_csv(
    balance: &EnergyBalance,
    report: &RunReport,
    grid: &StepGrid,
    path: &Path,
) -> io::Result<()> {
    let file = File::create(path)?;
    write_steps_csv(balance, report, grid, io::BufWriter::new(file))
}

/// Writes one run's per-step series as CSV to any writer.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` of kind `InvalidInput` if `report` was not computed
/// on a balance of the same length, or any error from writing.
pub fn write_steps_csv(
    balance: &EnergyBalance,
    report: &RunReport,
    grid: &StepGrid,
    writer: impl Write,
) -> io::Result<()> {
    let steps = report.trajectory.len();
    let aligned = [
        balance.pv_total_kwh.len(),
        balance.consumption_kwh.len(),
        balance.surplus_kwh.len(),
        report.flows.len(),
    ]
    .iter()
    .all(|&len| len == steps);
    if !aligned {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("report has {steps} steps but the balance or flows differ in length"),
        ));
    }

    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(STEP_HEADER.split(',').map(str::trim))?;

    let soc = &report.trajectory.soc_kwh;
    let flows = &report.flows;
    for i in 0..soc.len() {
        wtr.write_record(&[
            i.to_string(),
            format!("{:.4}", grid.time_hr(i)),
            format!("{:.4}", balance.pv_total_kwh[i]),
            format!("{:.4}", balance.consumption_kwh[i]),
            format!("{:.4}", balance.surplus_kwh[i]),
            format!("{:.4}", soc[i]),
            format!("{:.4}", flows.charge_kwh[i]),
            format!("{:.4}", flows.discharge_kwh[i]),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a capacity sweep to a CSV file, one row per capacity.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_sweep_csv(results: &SweepResults, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_sweep_csv(results, io::BufWriter::new(file))
}

/// Writes a capacity sweep as CSV to any writer, ordered by capacity.
///
/// An undefined self-sufficiency ratio is written as an empty cell.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_sweep_csv(results: &SweepResults, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SWEEP_HEADER.split(',').map(str::trim))?;

    for (capacity, report) in results {
        let s = &report.summary;
        wtr.write_record(&[
            format!("{:.2}", capacity.into_inner()),
            s.self_sufficiency_pct
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
            format!("{:.4}", s.energy_into_battery_kwh),
            format!("{:.4}", s.energy_out_of_battery_kwh),
            format!("{:.4}", s.net_benefit),
            s.clamps.floor_steps.to_string(),
            s.clamps.ceiling_steps.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
