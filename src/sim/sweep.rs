//! Capacity sweep: one independent battery run per capacity.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::thread;

use ordered_float::OrderedFloat;
use tracing::info;

use crate::balance::EnergyBalance;

use super::battery::BatteryConfig;
use super::engine::{RunReport, run};
use super::error::SimError;
use super::grid::StepGrid;
use super::kpi::Tariff;

/// Sweep results keyed by battery capacity (kWh).
pub type SweepResults = BTreeMap<OrderedFloat<f64>, RunReport>;

/// Runs `template` resized to every capacity in `capacities_kwh`.
///
/// Each capacity keeps the template's floor fraction, power limits,
/// efficiencies and initial fraction. Runs share the read-only balance and
/// are spread over at most `workers` scoped threads. Duplicate capacities
/// collapse into one entry.
///
/// # Errors
///
/// Every resized configuration is validated before any run starts; the first
/// invalid one is returned. A template starting below its floor is rejected,
/// since the floor grows with capacity while the start fraction does not.
/// Run errors are propagated after all workers finished.
pub fn sweep(
    balance: &EnergyBalance,
    template: &BatteryConfig,
    capacities_kwh: &[f64],
    tariff: &Tariff,
    grid: &StepGrid,
    workers: NonZeroUsize,
) -> Result<SweepResults, SimError> {
    template.validate()?;
    if template.initial_soc_kwh() < template.capacity_min_kwh {
        return Err(SimError::invalid(
            "initial_soc",
            "must not be below the floor fraction for a capacity sweep",
        ));
    }

    let configs: Vec<BatteryConfig> = capacities_kwh
        .iter()
        .map(|&capacity| template.resized(capacity))
        .collect();
    for config in &configs {
        config.validate()?;
    }
    tariff.validate()?;

    let chunk_len = configs.len().div_ceil(workers.get()).max(1);
    let outcomes: Vec<Result<RunReport, SimError>> = thread::scope(|scope| {
        let handles: Vec<_> = configs
            .chunks(chunk_len)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|config| run(balance, config, tariff, grid))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| match handle.join() {
                Ok(results) => results,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    });

    let mut results = SweepResults::new();
    for outcome in outcomes {
        let report = outcome?;
        results.insert(OrderedFloat(report.battery.capacity_max_kwh), report);
    }

    info!(
        capacities = results.len(),
        workers = workers.get(),
        "capacity sweep finished"
    );
    Ok(results)
}

/// Worker count matching the available hardware parallelism.
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
