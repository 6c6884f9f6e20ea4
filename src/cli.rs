//! Command-line arguments.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;

use autarky_sim::config::ScenarioConfig;

/// Home battery autarky simulator: replays meter data against a virtual battery.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Load scenario from TOML config file.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, dimensioning, minute).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// CSV readings file; synthetic demo data is generated if omitted.
    #[arg(long, value_name = "PATH")]
    pub readings: Option<PathBuf>,

    /// Override the battery capacity (kWh).
    #[arg(long, value_name = "KWH")]
    pub capacity: Option<f64>,

    /// Run a capacity sweep over the configured capacities.
    #[arg(long)]
    pub sweep: bool,

    /// Capacities to sweep (kWh, comma-separated); implies `--sweep`.
    #[arg(long, value_name = "KWH,...", value_delimiter = ',')]
    pub capacities: Vec<f64>,

    /// Worker threads for a sweep (defaults to available parallelism).
    #[arg(long, value_name = "N")]
    pub workers: Option<NonZeroUsize>,

    /// Report net savings per period of this many days (text report only).
    #[arg(
        long,
        value_name = "DAYS",
        conflicts_with_all = ["json", "sweep", "capacities"]
    )]
    pub period_days: Option<NonZeroUsize>,

    /// Override the synthetic data seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Export per-step (or per-capacity, for a sweep) results to CSV.
    #[arg(long, value_name = "PATH")]
    pub telemetry_out: Option<PathBuf>,

    /// Print results as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Whether a capacity sweep was requested.
    pub fn is_sweep(&self) -> bool {
        self.sweep || !self.capacities.is_empty()
    }

    /// Applies command-line overrides to a loaded scenario.
    pub fn apply_overrides(&self, scenario: &mut ScenarioConfig) {
        if let Some(capacity) = self.capacity {
            scenario.battery.capacity_kwh = capacity;
        }
        if let Some(seed) = self.seed {
            scenario.synthetic.seed = seed;
        }
        if !self.capacities.is_empty() {
            scenario.sweep.capacities_kwh = self.capacities.clone();
        }
    }
}
