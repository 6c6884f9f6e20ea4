//! Fixed-step time grid shared by every series of a run.

use super::error::SimError;

/// Uniform time grid: the duration of one step, in hours.
///
/// Every energy quantity in the crate is expressed in kWh *per step* of this
/// grid. Power limits (kW) become per-step energy limits by multiplying with
/// [`StepGrid::dt_hours`].
///
/// # Examples
///
/// ```
/// use autarky_sim::sim::grid::StepGrid;
///
/// let hourly = StepGrid::hourly();
/// assert_eq!(hourly.dt_hours(), 1.0);
///
/// let minutes = StepGrid::from_steps_per_hour(60).unwrap();
/// assert_eq!(minutes.steps_per_day(), 1440);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepGrid {
    dt_hours: f64,
}

impl StepGrid {
    /// Creates a grid with an explicit step length.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if `dt_hours` is not a positive,
    /// finite number.
    pub fn new(dt_hours: f64) -> Result<Self, SimError> {
        if !dt_hours.is_finite() || dt_hours <= 0.0 {
            return Err(SimError::invalid(
                "dt_hours",
                format!("must be a positive finite number, got {dt_hours}"),
            ));
        }
        Ok(Self { dt_hours })
    }

    /// Creates the grid whose step is the reciprocal of `steps_per_hour`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if `steps_per_hour` is zero.
    pub fn from_steps_per_hour(steps_per_hour: u32) -> Result<Self, SimError> {
        if steps_per_hour == 0 {
            return Err(SimError::invalid("steps_per_hour", "must be > 0"));
        }
        Self::new(1.0 / f64::from(steps_per_hour))
    }

    /// One step per hour.
    pub fn hourly() -> Self {
        Self { dt_hours: 1.0 }
    }

    /// Step length in hours.
    pub fn dt_hours(&self) -> f64 {
        self.dt_hours
    }

    /// Number of whole steps per day, at least one.
    pub fn steps_per_day(&self) -> usize {
        ((24.0 / self.dt_hours).round() as usize).max(1)
    }

    /// Elapsed time in hours at the start of step `index`.
    pub fn time_hr(&self, index: usize) -> f64 {
        index as f64 * self.dt_hours
    }

    /// Energy (kWh) a power limit (kW) allows within one step.
    pub fn energy_limit_kwh(&self, power_kw: f64) -> f64 {
        power_kw * self.dt_hours
    }
}

impl Default for StepGrid {
    fn default() -> Self {
        Self::hourly()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_grid() {
        let g = StepGrid::hourly();
        assert_eq!(g.dt_hours(), 1.0);
        assert_eq!(g.steps_per_day(), 24);
        assert_eq!(g.time_hr(5), 5.0);
        assert_eq!(g.energy_limit_kwh(3.0), 3.0);
    }

    #[test]
    fn minute_grid() {
        let g = StepGrid::from_steps_per_hour(60).unwrap();
        assert!((g.dt_hours() - 1.0 / 60.0).abs() < 1e-15);
        assert_eq!(g.steps_per_day(), 1440);
        assert!((g.energy_limit_kwh(6.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn zero_steps_per_hour_rejected() {
        assert!(StepGrid::from_steps_per_hour(0).is_err());
    }

    #[test]
    fn non_positive_dt_rejected() {
        assert!(StepGrid::new(0.0).is_err());
        assert!(StepGrid::new(-1.0).is_err());
        assert!(StepGrid::new(f64::NAN).is_err());
        assert!(StepGrid::new(f64::INFINITY).is_err());
    }
}
