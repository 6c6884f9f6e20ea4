//! Energy balance composition from per-step meter deltas.

use tracing::warn;

use crate::sim::error::{SimError, ensure_finite};

/// Yield of one PV sub-array, in kWh per step.
#[derive(Debug, Clone, PartialEq)]
pub struct PvArray {
    /// Sensor or array label.
    pub name: String,
    /// Measured yield per step (kWh).
    pub yield_kwh: Vec<f64>,
    /// Factor applied to the measured yield to model an extended array.
    pub scale: f64,
}

impl PvArray {
    pub fn new(name: impl Into<String>, yield_kwh: Vec<f64>, scale: f64) -> Self {
        Self {
            name: name.into(),
            yield_kwh,
            scale,
        }
    }
}

/// Time-aligned meter deltas on one step grid, all in kWh per step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterReadings {
    /// Energy drawn from the grid.
    pub grid_import_kwh: Vec<f64>,
    /// Energy fed into the grid.
    pub grid_export_kwh: Vec<f64>,
    /// PV sub-arrays.
    pub pv_arrays: Vec<PvArray>,
}

impl MeterReadings {
    /// Number of steps, taken from the import series.
    pub fn len(&self) -> usize {
        self.grid_import_kwh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid_import_kwh.is_empty()
    }
}

/// Derived per-step quantities feeding the battery simulation.
///
/// Household consumption is reconstructed from the *measured* PV yield:
/// `consumption = pv_measured - export + import`. The surplus uses the
/// *scaled* PV total: `surplus = pv_total - consumption`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyBalance {
    /// Sum of unscaled PV yields.
    pub pv_measured_kwh: Vec<f64>,
    /// Sum of PV yields after applying each array's scale factor.
    pub pv_total_kwh: Vec<f64>,
    /// Household consumption.
    pub consumption_kwh: Vec<f64>,
    /// PV surplus (positive) or deficit (negative).
    pub surplus_kwh: Vec<f64>,
    /// Measured grid import.
    pub grid_import_kwh: Vec<f64>,
    /// Measured grid export.
    pub grid_export_kwh: Vec<f64>,
}

impl EnergyBalance {
    /// Combines meter deltas into PV totals, consumption and surplus.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::LengthMismatch`] if the series do not share one
    /// grid, [`SimError::NonFiniteInput`] if any reading is not finite and
    /// [`SimError::InvalidConfig`] for a negative or non-finite scale factor.
    pub fn compose(readings: &MeterReadings) -> Result<Self, SimError> {
        let n = readings.len();
        check_len("grid_export", n, readings.grid_export_kwh.len())?;
        ensure_finite("grid_import", &readings.grid_import_kwh)?;
        ensure_finite("grid_export", &readings.grid_export_kwh)?;

        let mut pv_measured_kwh = vec![0.0; n];
        let mut pv_total_kwh = vec![0.0; n];
        for array in &readings.pv_arrays {
            check_len(&array.name, n, array.yield_kwh.len())?;
            ensure_finite(&array.name, &array.yield_kwh)?;
            if !(array.scale.is_finite() && array.scale >= 0.0) {
                return Err(SimError::invalid(
                    "pv_scale",
                    format!("must be >= 0 for array `{}`", array.name),
                ));
            }
            for (i, y) in array.yield_kwh.iter().enumerate() {
                pv_measured_kwh[i] += y;
                pv_total_kwh[i] += y * array.scale;
            }
        }

        let consumption_kwh: Vec<f64> = pv_measured_kwh
            .iter()
            .zip(&readings.grid_export_kwh)
            .zip(&readings.grid_import_kwh)
            .map(|((pv, export), import)| pv - export + import)
            .collect();

        let negative = consumption_kwh.iter().filter(|c| **c < 0.0).count();
        if negative > 0 {
            warn!(
                steps = negative,
                "consumption is negative at some steps, meter data may be misaligned"
            );
        }

        let surplus_kwh = pv_total_kwh
            .iter()
            .zip(&consumption_kwh)
            .map(|(pv, load)| pv - load)
            .collect();

        Ok(Self {
            pv_measured_kwh,
            pv_total_kwh,
            consumption_kwh,
            surplus_kwh,
            grid_import_kwh: readings.grid_import_kwh.clone(),
            grid_export_kwh: readings.grid_export_kwh.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.surplus_kwh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surplus_kwh.is_empty()
    }
}

fn check_len(series: &str, expected: usize, actual: usize) -> Result<(), SimError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SimError::LengthMismatch {
            series: series.to_string(),
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings() -> MeterReadings {
        MeterReadings {
            grid_import_kwh: vec![1.0, 0.0, 0.5],
            grid_export_kwh: vec![0.0, 2.0, 0.0],
            pv_arrays: vec![
                PvArray::new("east", vec![0.0, 2.0, 0.5], 1.0),
                PvArray::new("west", vec![0.0, 1.0, 0.25], 6.0),
            ],
        }
    }

    #[test]
    fn consumption_uses_measured_pv() {
        let b = EnergyBalance::compose(&readings()).expect("aligned readings");
        assert_eq!(b.pv_measured_kwh, vec![0.0, 3.0, 0.75]);
        assert_eq!(b.consumption_kwh, vec![1.0, 1.0, 1.25]);
    }

    #[test]
    fn surplus_uses_scaled_pv() {
        let b = EnergyBalance::compose(&readings()).expect("aligned readings");
        assert_eq!(b.pv_total_kwh, vec![0.0, 8.0, 2.0]);
        assert_eq!(b.surplus_kwh, vec![-1.0, 7.0, 0.75]);
    }

    #[test]
    fn no_pv_arrays_means_pure_deficit() {
        let r = MeterReadings {
            grid_import_kwh: vec![1.0, 2.0],
            grid_export_kwh: vec![0.0, 0.0],
            pv_arrays: Vec::new(),
        };
        let b = EnergyBalance::compose(&r).expect("aligned readings");
        assert_eq!(b.surplus_kwh, vec![-1.0, -2.0]);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let mut r = readings();
        r.pv_arrays[1].yield_kwh.pop();
        let err = EnergyBalance::compose(&r);
        assert!(matches!(err, Err(SimError::LengthMismatch { .. })));
    }

    #[test]
    fn nan_reading_rejected() {
        let mut r = readings();
        r.grid_import_kwh[2] = f64::NAN;
        let err = EnergyBalance::compose(&r);
        assert!(matches!(err, Err(SimError::NonFiniteInput { .. })));
    }

    #[test]
    fn nan_yield_names_the_array() {
        let mut r = readings();
        r.pv_arrays[1].yield_kwh[0] = f64::NAN;
        match EnergyBalance::compose(&r) {
            Err(SimError::NonFiniteInput { series, index, .. }) => {
                assert_eq!(series, "west");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn negative_scale_rejected() {
        let mut r = readings();
        r.pv_arrays[0].scale = -1.0;
        assert!(EnergyBalance::compose(&r).is_err());
    }

    #[test]
    fn empty_readings() {
        let b = EnergyBalance::compose(&MeterReadings::default()).expect("empty is valid");
        assert!(b.is_empty());
    }
}
