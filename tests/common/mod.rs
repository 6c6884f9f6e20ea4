//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use autarky_sim::balance::{EnergyBalance, MeterReadings, PvArray};
use autarky_sim::config::{PvSensorConfig, SyntheticConfig};
use autarky_sim::sim::{BatteryConfig, StepGrid, Tariff};
use autarky_sim::synthetic;

/// Reference battery: 20 kWh with a 2 kWh floor, 3 kW both ways, 95%/95%,
/// starting half full.
pub fn reference_battery() -> BatteryConfig {
    BatteryConfig::with_floor_fraction(20.0, 0.1, 0.5, 3.0, 3.0, 0.95, 0.95)
}

/// Surplus series whose trajectory on [`reference_battery`] is
/// `[12.85, 9.85, 9.85, 12.7, 11.7]`.
pub const REFERENCE_SURPLUS: [f64; 5] = [5.0, -5.0, 0.0, 10.0, -1.0];

/// Default tariff: 22.5 Rp import, 7.5 Rp export, CHF.
pub fn tariff() -> Tariff {
    Tariff::default()
}

/// Balance with the given PV and consumption and no PV scaling.
///
/// Grid import and export are derived as a meter without battery would
/// have recorded them.
pub fn balance(pv: &[f64], consumption: &[f64]) -> EnergyBalance {
    let import = pv
        .iter()
        .zip(consumption)
        .map(|(p, c)| (c - p).max(0.0))
        .collect();
    let export = pv
        .iter()
        .zip(consumption)
        .map(|(p, c)| (p - c).max(0.0))
        .collect();
    let readings = MeterReadings {
        grid_import_kwh: import,
        grid_export_kwh: export,
        pv_arrays: vec![PvArray::new("pv", pv.to_vec(), 1.0)],
    };
    EnergyBalance::compose(&readings).expect("fixture readings are finite")
}

/// Balance whose surplus equals `surplus`, with at least 1 kWh of load per step.
pub fn balance_from_surplus(surplus: &[f64]) -> EnergyBalance {
    let pv: Vec<f64> = surplus.iter().map(|s| (s + 1.0).max(0.0)).collect();
    let consumption: Vec<f64> = pv.iter().zip(surplus).map(|(p, s)| p - s).collect();
    balance(&pv, &consumption)
}

/// Seeded synthetic balance over `days` on `grid`, one PV array scaled six-fold.
pub fn synthetic_balance(days: usize, grid: &StepGrid) -> EnergyBalance {
    let cfg = SyntheticConfig {
        days,
        ..SyntheticConfig::default()
    };
    let arrays = [PvSensorConfig {
        scale: 6.0,
        ..PvSensorConfig::default()
    }];
    let readings = synthetic::generate(&cfg, &arrays, grid);
    EnergyBalance::compose(&readings).expect("synthetic readings are finite")
}
