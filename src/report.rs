//! Human-readable and JSON renderings of run and sweep results.

use std::fmt;

use serde::Serialize;

use crate::sim::SweepResults;
use crate::sim::kpi::AutarkySummary;

/// Capacity sweep rendered as a fixed-width table, one row per capacity.
pub struct SweepTable<'a>(pub &'a SweepResults);

impl fmt::Display for SweepTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Capacity Sweep ---")?;
        write!(
            f,
            "{:>9} {:>8} {:>11} {:>11} {:>12}",
            "kWh", "autarky", "charged", "discharged", "net benefit"
        )?;
        for (capacity, report) in self.0 {
            let s = &report.summary;
            let ratio = s
                .self_sufficiency_pct
                .map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"));
            write!(
                f,
                "\n{:>9.1} {:>8} {:>11.1} {:>11.1} {:>8.2} {}",
                capacity.into_inner(),
                ratio,
                s.energy_into_battery_kwh,
                s.energy_out_of_battery_kwh,
                s.net_benefit,
                s.currency
            )?;
        }
        Ok(())
    }
}

/// Net battery savings per fixed-length period.
pub struct PeriodSavings<'a> {
    /// Savings per period in the major currency unit.
    pub savings: &'a [f64],
    /// Period length in days, for labelling.
    pub period_days: usize,
    pub currency: &'a str,
}

impl fmt::Display for PeriodSavings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--- Savings per {} day(s) ---", self.period_days)?;
        for (i, v) in self.savings.iter().enumerate() {
            write!(f, "\nPeriod {:>3}: {:>8.2} {}", i + 1, v, self.currency)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SweepEntry<'a> {
    capacity_kwh: f64,
    summary: &'a AutarkySummary,
}

/// Serializes a single run summary as pretty-printed JSON.
///
/// Undefined ratios are written as `null`.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn summary_json(summary: &AutarkySummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

/// Serializes a sweep as a JSON array ordered by capacity.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn sweep_json(results: &SweepResults) -> serde_json::Result<String> {
    let entries: Vec<SweepEntry<'_>> = results
        .iter()
        .map(|(capacity, report)| SweepEntry {
            capacity_kwh: capacity.into_inner(),
            summary: &report.summary,
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}
