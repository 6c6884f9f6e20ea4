//! Battery model: configuration, validation and the per-step transition.

use super::error::SimError;
use super::grid::StepGrid;

/// Physical parameters of a stationary battery, fixed for one simulation run.
///
/// Energies are in kWh, powers in kW. The battery never drops below
/// `capacity_min_kwh` (depth-of-discharge protection) and never exceeds
/// `capacity_max_kwh`.
///
/// # Efficiency Convention
/// - Charging: the surplus drawn is limited by surplus and power first, then
///   multiplied by `charge_efficiency`, then clipped to the headroom.
/// - Discharging: the energy removed from storage is limited by demand, power
///   and available energy. The household receives that amount multiplied by
///   `discharge_efficiency`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryConfig {
    /// Usable upper bound of the state of charge (kWh).
    pub capacity_max_kwh: f64,
    /// Lower bound of the state of charge (kWh, > 0).
    pub capacity_min_kwh: f64,
    /// Maximum charging power (kW).
    pub charge_power_max_kw: f64,
    /// Maximum discharging power (kW).
    pub discharge_power_max_kw: f64,
    /// Charging efficiency in (0, 1].
    pub charge_efficiency: f64,
    /// Discharging efficiency in (0, 1].
    pub discharge_efficiency: f64,
    /// Initial state of charge as a fraction of `capacity_max_kwh`.
    pub initial_soc: f64,
}

impl BatteryConfig {
    /// Builds a configuration whose floor is `min_soc` times the capacity.
    pub fn with_floor_fraction(
        capacity_kwh: f64,
        min_soc: f64,
        initial_soc: f64,
        charge_power_max_kw: f64,
        discharge_power_max_kw: f64,
        charge_efficiency: f64,
        discharge_efficiency: f64,
    ) -> Self {
        Self {
            capacity_max_kwh: capacity_kwh,
            capacity_min_kwh: capacity_kwh * min_soc,
            charge_power_max_kw,
            discharge_power_max_kw,
            charge_efficiency,
            discharge_efficiency,
            initial_soc,
        }
    }

    /// Returns a copy resized to `capacity_kwh`, keeping the floor at the same
    /// fraction of capacity.
    pub fn resized(&self, capacity_kwh: f64) -> Self {
        let floor_fraction = if self.capacity_max_kwh > 0.0 {
            self.capacity_min_kwh / self.capacity_max_kwh
        } else {
            0.0
        };
        Self {
            capacity_max_kwh: capacity_kwh,
            capacity_min_kwh: capacity_kwh * floor_fraction,
            ..self.clone()
        }
    }

    /// Checks every parameter and fails on the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        let all_finite = [
            self.capacity_max_kwh,
            self.capacity_min_kwh,
            self.charge_power_max_kw,
            self.discharge_power_max_kw,
            self.charge_efficiency,
            self.discharge_efficiency,
            self.initial_soc,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(SimError::invalid("battery", "all parameters must be finite"));
        }
        if self.capacity_min_kwh <= 0.0 {
            return Err(SimError::invalid("capacity_min_kwh", "must be > 0"));
        }
        if self.capacity_min_kwh >= self.capacity_max_kwh {
            return Err(SimError::invalid(
                "capacity_min_kwh",
                format!(
                    "must be < capacity_max_kwh ({} >= {})",
                    self.capacity_min_kwh, self.capacity_max_kwh
                ),
            ));
        }
        if self.charge_power_max_kw <= 0.0 {
            return Err(SimError::invalid("charge_power_max_kw", "must be > 0"));
        }
        if self.discharge_power_max_kw <= 0.0 {
            return Err(SimError::invalid("discharge_power_max_kw", "must be > 0"));
        }
        if !(self.charge_efficiency > 0.0 && self.charge_efficiency <= 1.0) {
            return Err(SimError::invalid("charge_efficiency", "must be in (0, 1]"));
        }
        if !(self.discharge_efficiency > 0.0 && self.discharge_efficiency <= 1.0) {
            return Err(SimError::invalid(
                "discharge_efficiency",
                "must be in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_soc) {
            return Err(SimError::invalid("initial_soc", "must be in [0, 1]"));
        }
        Ok(())
    }

    /// State of charge (kWh) before the first step.
    pub fn initial_soc_kwh(&self) -> f64 {
        self.initial_soc * self.capacity_max_kwh
    }

    /// Advances the battery by one step.
    ///
    /// Pure function of its arguments: `soc_prev` is the stored energy before
    /// the step, `surplus_kwh` the PV surplus (positive) or deficit (negative)
    /// of the step.
    pub fn step(&self, soc_prev: f64, surplus_kwh: f64, grid: &StepGrid) -> StepOutcome {
        let mut drawn_kwh = 0.0;
        let mut delivered_kwh = 0.0;

        let unclamped = if surplus_kwh > 0.0 {
            let headroom = self.capacity_max_kwh - soc_prev;
            let gross = surplus_kwh.min(grid.energy_limit_kwh(self.charge_power_max_kw));
            let net = (gross * self.charge_efficiency).min(headroom).max(0.0);
            // Surplus actually consumed to store `net`.
            drawn_kwh = net / self.charge_efficiency;
            soc_prev + net
        } else if surplus_kwh < 0.0 {
            let needed = -surplus_kwh;
            let available = (soc_prev - self.capacity_min_kwh).max(0.0);
            let max_discharge = grid
                .energy_limit_kwh(self.discharge_power_max_kw)
                .min(available);
            let net = needed.min(max_discharge);
            delivered_kwh = net * self.discharge_efficiency;
            soc_prev - net
        } else {
            soc_prev
        };

        let soc_kwh = unclamped.clamp(self.capacity_min_kwh, self.capacity_max_kwh);
        let limit = if soc_kwh <= self.capacity_min_kwh {
            Some(SocLimit::Floor)
        } else if soc_kwh >= self.capacity_max_kwh {
            Some(SocLimit::Ceiling)
        } else {
            None
        };

        StepOutcome {
            soc_kwh,
            drawn_kwh,
            delivered_kwh,
            limit,
            corrected: soc_kwh != unclamped,
        }
    }
}

/// Which bound the state of charge rests on after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocLimit {
    Floor,
    Ceiling,
}

/// Result of one battery step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// State of charge after the step (kWh).
    pub soc_kwh: f64,
    /// Surplus energy absorbed from the household side (kWh).
    pub drawn_kwh: f64,
    /// Energy handed to the household after discharge losses (kWh).
    pub delivered_kwh: f64,
    /// Bound reached by the state of charge, if any.
    pub limit: Option<SocLimit>,
    /// `true` when the final clamp had to move the value.
    pub corrected: bool,
}
