//! Post-hoc autarky and financial evaluation of a battery run.

use std::fmt;

use serde::Serialize;

use crate::balance::EnergyBalance;

use super::engine::{ClampStats, Trajectory};
use super::error::{SimError, ensure_finite};
use super::flow::FlowDecomposition;

/// Grid tariff for the evaluation period.
///
/// Prices are in the currency's minor unit per kWh (e.g. Rappen, cents);
/// `minor_per_major` converts totals to the major unit for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tariff {
    /// Price paid per imported kWh.
    pub import_price: f64,
    /// Feed-in compensation per exported kWh.
    pub export_price: f64,
    /// Minor units per major unit (100 for CHF/Rp).
    pub minor_per_major: f64,
    /// Label of the major unit, used in reports only.
    pub currency: String,
}

impl Tariff {
    /// Checks that prices are finite and the unit conversion is positive.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.import_price.is_finite() {
            return Err(SimError::invalid("import_price", "must be finite"));
        }
        if !self.export_price.is_finite() {
            return Err(SimError::invalid("export_price", "must be finite"));
        }
        if !(self.minor_per_major.is_finite() && self.minor_per_major > 0.0) {
            return Err(SimError::invalid("minor_per_major", "must be > 0"));
        }
        Ok(())
    }

    /// Net value (major unit) of discharging `out_kwh` and charging `in_kwh`.
    pub fn net_benefit(&self, in_kwh: f64, out_kwh: f64) -> f64 {
        (out_kwh * self.import_price - in_kwh * self.export_price) / self.minor_per_major
    }
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            import_price: 22.5,
            export_price: 7.5,
            minor_per_major: 100.0,
            currency: "CHF".to_string(),
        }
    }
}

/// Descriptive statistics of a state-of-charge trajectory (kWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SocStats {
    pub min_kwh: f64,
    pub max_kwh: f64,
    pub mean_kwh: f64,
    /// Sample standard deviation; zero for fewer than two steps.
    pub std_kwh: f64,
}

impl SocStats {
    /// Returns `None` for an empty trajectory.
    pub fn from_soc(soc_kwh: &[f64]) -> Option<Self> {
        if soc_kwh.is_empty() {
            return None;
        }
        let n = soc_kwh.len() as f64;
        let mean = soc_kwh.iter().sum::<f64>() / n;
        let std = if soc_kwh.len() > 1 {
            let sq: f64 = soc_kwh.iter().map(|v| (v - mean).powi(2)).sum();
            (sq / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Some(Self {
            min_kwh: soc_kwh.iter().copied().fold(f64::INFINITY, f64::min),
            max_kwh: soc_kwh.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean_kwh: mean,
            std_kwh: std,
        })
    }
}

/// Aggregate energy and money figures of one battery run.
///
/// Ratios are `None` when their denominator is zero; they are never `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutarkySummary {
    pub steps: usize,
    pub total_consumption_kwh: f64,
    pub total_pv_kwh: f64,
    pub pv_direct_use_kwh: f64,
    pub energy_into_battery_kwh: f64,
    pub energy_out_of_battery_kwh: f64,
    /// Energy reaching the household after discharge losses.
    pub energy_delivered_kwh: f64,
    /// `pv_direct_use_kwh + energy_out_of_battery_kwh`.
    pub energy_covered_kwh: f64,
    /// Measured grid import (sensor sum).
    pub grid_import_kwh: f64,
    /// Measured grid export (sensor sum).
    pub grid_export_kwh: f64,
    /// Share of consumption covered by PV and battery, in percent.
    pub self_sufficiency_pct: Option<f64>,
    /// Measured autarky without battery: `1 - import / consumption`, in percent.
    pub baseline_autarky_pct: Option<f64>,
    /// Share of the scaled PV yield not exported, in percent.
    pub self_consumption_pct: Option<f64>,
    /// Import cost avoided by discharging (minor unit).
    pub grid_avoidance_savings: f64,
    /// Feed-in revenue given up by charging (minor unit).
    pub forgone_export_revenue: f64,
    /// `grid_avoidance_savings - forgone_export_revenue` (minor unit).
    pub net_benefit_minor: f64,
    /// Net benefit in the major unit.
    pub net_benefit: f64,
    pub currency: String,
    pub soc: Option<SocStats>,
    pub clamps: ClampStats,
}

fn percent(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator * 100.0)
    }
}

/// Aggregates flows and measured series into an [`AutarkySummary`].
///
/// All series are energy per step, so totals are plain sums.
///
/// # Errors
///
/// Returns [`SimError::LengthMismatch`] if flows and balance are not aligned,
/// [`SimError::NonFiniteInput`] for non-finite measurements and
/// [`SimError::InvalidConfig`] for an invalid tariff.
pub fn evaluate(
    balance: &EnergyBalance,
    flows: &FlowDecomposition,
    trajectory: &Trajectory,
    tariff: &Tariff,
) -> Result<AutarkySummary, SimError> {
    tariff.validate()?;
    let steps = balance.len();
    if flows.len() != steps {
        return Err(SimError::LengthMismatch {
            series: "flows".to_string(),
            expected: steps,
            actual: flows.len(),
        });
    }
    ensure_finite("consumption", &balance.consumption_kwh)?;
    ensure_finite("pv_total", &balance.pv_total_kwh)?;
    ensure_finite("grid_import", &balance.grid_import_kwh)?;
    ensure_finite("grid_export", &balance.grid_export_kwh)?;

    let total_consumption_kwh: f64 = balance.consumption_kwh.iter().sum();
    let total_pv_kwh: f64 = balance.pv_total_kwh.iter().sum();
    let pv_direct_use_kwh: f64 = balance
        .pv_total_kwh
        .iter()
        .zip(&balance.consumption_kwh)
        .map(|(pv, load)| pv.min(*load))
        .sum();
    let grid_import_kwh: f64 = balance.grid_import_kwh.iter().sum();
    let grid_export_kwh: f64 = balance.grid_export_kwh.iter().sum();

    let energy_into_battery_kwh = flows.total_charge_kwh();
    let energy_out_of_battery_kwh = flows.total_discharge_kwh();
    let energy_covered_kwh = pv_direct_use_kwh + energy_out_of_battery_kwh;

    let grid_avoidance_savings = energy_out_of_battery_kwh * tariff.import_price;
    let forgone_export_revenue = energy_into_battery_kwh * tariff.export_price;
    let net_benefit_minor = grid_avoidance_savings - forgone_export_revenue;

    Ok(AutarkySummary {
        steps,
        total_consumption_kwh,
        total_pv_kwh,
        pv_direct_use_kwh,
        energy_into_battery_kwh,
        energy_out_of_battery_kwh,
        energy_delivered_kwh: trajectory.delivered_kwh,
        energy_covered_kwh,
        grid_import_kwh,
        grid_export_kwh,
        self_sufficiency_pct: percent(energy_covered_kwh, total_consumption_kwh),
        baseline_autarky_pct: percent(
            total_consumption_kwh - grid_import_kwh,
            total_consumption_kwh,
        ),
        self_consumption_pct: percent(total_pv_kwh - grid_export_kwh, total_pv_kwh),
        grid_avoidance_savings,
        forgone_export_revenue,
        net_benefit_minor,
        net_benefit: net_benefit_minor / tariff.minor_per_major,
        currency: tariff.currency.clone(),
        soc: SocStats::from_soc(&trajectory.soc_kwh),
        clamps: trajectory.clamps,
    })
}

/// Net savings (major unit) summed over consecutive periods of
/// `steps_per_period` steps. The last period may be shorter.
pub fn period_savings(
    flows: &FlowDecomposition,
    tariff: &Tariff,
    steps_per_period: usize,
) -> Vec<f64> {
    let period = steps_per_period.max(1);
    flows
        .charge_kwh
        .chunks(period)
        .zip(flows.discharge_kwh.chunks(period))
        .map(|(charge, discharge)| {
            tariff.net_benefit(charge.iter().sum(), discharge.iter().sum())
        })
        .collect()
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
}

impl fmt::Display for AutarkySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy Summary ---")?;
        writeln!(f, "Consumption:            {:.2} kWh", self.total_consumption_kwh)?;
        writeln!(f, "PV generation:          {:.2} kWh", self.total_pv_kwh)?;
        writeln!(f, "PV used directly:       {:.2} kWh", self.pv_direct_use_kwh)?;
        writeln!(f, "Charged into battery:   {:.2} kWh", self.energy_into_battery_kwh)?;
        writeln!(
            f,
            "Taken from battery:     {:.2} kWh ({:.2} kWh delivered)",
            self.energy_out_of_battery_kwh, self.energy_delivered_kwh
        )?;
        writeln!(f, "Grid import (measured): {:.2} kWh", self.grid_import_kwh)?;
        writeln!(f, "Grid export (measured): {:.2} kWh", self.grid_export_kwh)?;
        writeln!(f, "Covered by PV+battery:  {:.2} kWh", self.energy_covered_kwh)?;
        writeln!(f, "Self-sufficiency:       {}", fmt_pct(self.self_sufficiency_pct))?;
        writeln!(f, "Autarky w/o battery:    {}", fmt_pct(self.baseline_autarky_pct))?;
        writeln!(f, "Self-consumption:       {}", fmt_pct(self.self_consumption_pct))?;
        if let Some(soc) = &self.soc {
            writeln!(
                f,
                "SoC min/max/mean/std:   {:.2} / {:.2} / {:.2} / {:.2} kWh",
                soc.min_kwh, soc.max_kwh, soc.mean_kwh, soc.std_kwh
            )?;
        }
        writeln!(f, "SoC at bounds:          {}", self.clamps)?;
        writeln!(f, "--- Battery Savings ---")?;
        writeln!(
            f,
            "Avoided grid import:    {:.2} kWh -> {:.2}",
            self.energy_out_of_battery_kwh, self.grid_avoidance_savings
        )?;
        writeln!(
            f,
            "Forgone feed-in:        {:.2} kWh -> {:.2}",
            self.energy_into_battery_kwh, self.forgone_export_revenue
        )?;
        write!(f, "Net benefit:            {:.2} {}", self.net_benefit, self.currency)
    }
}
