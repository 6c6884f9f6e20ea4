//! Autarky simulator entry point: CLI wiring and report output.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use autarky_sim::balance::{EnergyBalance, MeterReadings};
use autarky_sim::config::ScenarioConfig;
use autarky_sim::io::export::{export_steps_csv, export_sweep_csv};
use autarky_sim::io::readings::load_readings;
use autarky_sim::report::{PeriodSavings, SweepTable, summary_json, sweep_json};
use autarky_sim::sim::kpi::period_savings;
use autarky_sim::sim::sweep::default_workers;
use autarky_sim::sim::{run, sweep};
use autarky_sim::synthetic;

use crate::cli::Args;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();

    let args = Args::parse();

    // --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(path) = &args.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &args.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };
    args.apply_overrides(&mut scenario);

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        bail!("scenario has {} configuration error(s)", errors.len());
    }

    let grid = scenario.grid()?;
    let readings = load_or_generate(&args, &scenario)?;
    let balance = EnergyBalance::compose(&readings).context("meter readings are inconsistent")?;
    let battery = scenario.battery_config();
    let tariff = scenario.tariff();

    if args.is_sweep() {
        let capacities = &scenario.sweep.capacities_kwh;
        if capacities.is_empty() {
            bail!("nothing to sweep: pass --capacities or set sweep.capacities_kwh");
        }
        let workers = args.workers.unwrap_or_else(default_workers);
        let results = sweep(&balance, &battery, capacities, &tariff, &grid, workers)?;

        if args.json {
            println!("{}", sweep_json(&results)?);
        } else {
            println!("{}", SweepTable(&results));
        }
        if let Some(path) = &args.telemetry_out {
            export_sweep_csv(&results, path)
                .with_context(|| format!("failed to write CSV to {}", path.display()))?;
            info!(path = %path.display(), "sweep results written");
        }
        return Ok(());
    }

    let report = run(&balance, &battery, &tariff, &grid)?;
    if args.json {
        println!("{}", summary_json(&report.summary)?);
    } else {
        println!("{}", report.summary);
        if let Some(days) = args.period_days {
            let savings = period_savings(&report.flows, &tariff, days.get() * grid.steps_per_day());
            let table = PeriodSavings {
                savings: &savings,
                period_days: days.get(),
                currency: &tariff.currency,
            };
            println!("\n{table}");
        }
    }

    if let Some(path) = &args.telemetry_out {
        export_steps_csv(&balance, &report, &grid, path)
            .with_context(|| format!("failed to write CSV to {}", path.display()))?;
        info!(path = %path.display(), "telemetry written");
    }

    Ok(())
}

fn load_or_generate(args: &Args, scenario: &ScenarioConfig) -> Result<MeterReadings> {
    if let Some(path) = &args.readings {
        return Ok(load_readings(path, &scenario.readings)?);
    }
    let grid = scenario.grid()?;
    let readings = synthetic::generate(&scenario.synthetic, &scenario.readings.pv, &grid);
    info!(
        days = scenario.synthetic.days,
        seed = scenario.synthetic.seed,
        steps = readings.len(),
        "no readings file given, using synthetic data"
    );
    Ok(readings)
}
