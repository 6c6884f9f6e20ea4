//! Battery simulation engine and the single-run pipeline.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::balance::EnergyBalance;

use super::battery::{BatteryConfig, SocLimit, StepOutcome};
use super::error::{SimError, ensure_finite};
use super::flow::{FlowDecomposition, decompose};
use super::grid::StepGrid;
use super::kpi::{AutarkySummary, Tariff, evaluate};

/// How often the state of charge touched its bounds during a run.
///
/// Frequent floor hits point at an undersized battery, frequent ceiling hits
/// at surplus the battery cannot absorb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClampStats {
    /// Steps that ended at `capacity_min_kwh`.
    pub floor_steps: usize,
    /// Steps that ended at `capacity_max_kwh`.
    pub ceiling_steps: usize,
    /// Steps where the final safety clamp changed the computed value.
    pub corrections: usize,
}

impl ClampStats {
    fn record(&mut self, outcome: &StepOutcome) {
        match outcome.limit {
            Some(SocLimit::Floor) => self.floor_steps += 1,
            Some(SocLimit::Ceiling) => self.ceiling_steps += 1,
            None => {}
        }
        if outcome.corrected {
            self.corrections += 1;
        }
    }
}

impl fmt::Display for ClampStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "floor={} ceiling={} corrections={}",
            self.floor_steps, self.ceiling_steps, self.corrections
        )
    }
}

/// State-of-charge trajectory of one run, aligned with the input series.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// State of charge after each step (kWh).
    pub soc_kwh: Vec<f64>,
    /// State of charge before the first step (kWh).
    pub initial_soc_kwh: f64,
    /// Total surplus absorbed by charging (kWh, before charge losses).
    pub drawn_kwh: f64,
    /// Total energy handed to the household (kWh, after discharge losses).
    pub delivered_kwh: f64,
    /// Bound statistics.
    pub clamps: ClampStats,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.soc_kwh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.soc_kwh.is_empty()
    }
}

/// Simulates the battery over a surplus/deficit series.
///
/// The trajectory is a scan of [`BatteryConfig::step`] over `surplus_kwh`,
/// seeded with [`BatteryConfig::initial_soc_kwh`]. An empty input yields an
/// empty trajectory.
///
/// # Errors
///
/// Returns [`SimError::InvalidConfig`] for an invalid battery, and
/// [`SimError::NonFiniteInput`] if the surplus contains `NaN` or infinity.
pub fn simulate(
    config: &BatteryConfig,
    surplus_kwh: &[f64],
    grid: &StepGrid,
) -> Result<Trajectory, SimError> {
    config.validate()?;
    ensure_finite("surplus", surplus_kwh)?;

    let initial_soc_kwh = config.initial_soc_kwh();
    let mut clamps = ClampStats::default();
    let mut drawn_kwh = 0.0;
    let mut delivered_kwh = 0.0;

    let soc_kwh: Vec<f64> = surplus_kwh
        .iter()
        .enumerate()
        .scan(initial_soc_kwh, |soc, (i, &surplus)| {
            let outcome = config.step(*soc, surplus, grid);
            if outcome.corrected {
                debug!(
                    step = i,
                    soc_prev = *soc,
                    soc = outcome.soc_kwh,
                    "state of charge clamped to bounds"
                );
            }
            clamps.record(&outcome);
            drawn_kwh += outcome.drawn_kwh;
            delivered_kwh += outcome.delivered_kwh;
            *soc = outcome.soc_kwh;
            Some(outcome.soc_kwh)
        })
        .collect();

    Ok(Trajectory {
        soc_kwh,
        initial_soc_kwh,
        drawn_kwh,
        delivered_kwh,
        clamps,
    })
}

/// Everything one battery configuration produces for a given energy balance.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub battery: BatteryConfig,
    pub trajectory: Trajectory,
    pub flows: FlowDecomposition,
    pub summary: AutarkySummary,
}

/// Runs simulation, flow decomposition and evaluation for one battery.
///
/// Side-effect free apart from logging; calling it twice with the same
/// arguments yields identical reports.
///
/// # Errors
///
/// Propagates configuration and input errors from [`simulate`] and
/// [`evaluate`].
pub fn run(
    balance: &EnergyBalance,
    battery: &BatteryConfig,
    tariff: &Tariff,
    grid: &StepGrid,
) -> Result<RunReport, SimError> {
    tariff.validate()?;
    let trajectory = simulate(battery, &balance.surplus_kwh, grid)?;
    let flows = decompose(&trajectory.soc_kwh);
    let summary = evaluate(balance, &flows, &trajectory, tariff)?;

    info!(
        capacity_kwh = battery.capacity_max_kwh,
        steps = trajectory.len(),
        clamps = %trajectory.clamps,
        net_benefit = summary.net_benefit,
        "battery run finished"
    );

    Ok(RunReport {
        battery: battery.clone(),
        trajectory,
        flows,
        summary,
    })
}
