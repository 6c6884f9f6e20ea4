//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::sim::{BatteryConfig, SimError, StepGrid, Tariff};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Time grid of the readings.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: StorageConfig,
    /// Import and export prices.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Column mapping for CSV readings.
    #[serde(default)]
    pub readings: ReadingsConfig,
    /// Capacities evaluated by a sweep.
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Demo data generator used when no readings file is given.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

/// Time grid of the readings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of readings per hour (1 = hourly, 60 = per minute).
    pub steps_per_hour: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { steps_per_hour: 1 }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Usable upper bound of the stored energy (kWh).
    pub capacity_kwh: f64,
    /// Floor as a fraction of capacity (0.0–1.0, exclusive).
    pub min_soc: f64,
    /// Initial state of charge as a fraction of capacity (0.0–1.0).
    pub initial_soc: f64,
    /// Maximum charging power (kW).
    pub max_charge_kw: f64,
    /// Maximum discharging power (kW).
    pub max_discharge_kw: f64,
    /// Charge efficiency (0.0–1.0].
    pub eta_charge: f64,
    /// Discharge efficiency (0.0–1.0].
    pub eta_discharge: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 20.0,
            min_soc: 0.1,
            initial_soc: 0.5,
            max_charge_kw: 3.0,
            max_discharge_kw: 3.0,
            eta_charge: 0.95,
            eta_discharge: 0.95,
        }
    }
}

/// Import and export prices in the currency's minor unit per kWh.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Price paid per imported kWh.
    pub import_price: f64,
    /// Compensation received per exported kWh.
    pub export_price: f64,
    /// Minor units per major unit.
    pub minor_per_major: f64,
    /// Major unit label.
    pub currency: String,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            import_price: 22.5,
            export_price: 6.0,
            minor_per_major: 100.0,
            currency: "CHF".to_string(),
        }
    }
}

/// Column mapping for a CSV readings table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadingsConfig {
    /// Column holding grid import.
    pub import_column: String,
    /// Column holding grid export.
    pub export_column: String,
    /// Columns hold cumulative counters instead of per-step deltas.
    pub cumulative: bool,
    /// PV sub-arrays.
    pub pv: Vec<PvSensorConfig>,
}

impl Default for ReadingsConfig {
    fn default() -> Self {
        Self {
            import_column: "grid_import_kwh".to_string(),
            export_column: "grid_export_kwh".to_string(),
            cumulative: false,
            pv: vec![PvSensorConfig::default()],
        }
    }
}

/// One PV sub-array and the factor applied to its measured yield.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvSensorConfig {
    /// Column holding the array's yield.
    pub column: String,
    /// Multiplier modelling an extended array (1.0 = as measured).
    pub scale: f64,
}

impl Default for PvSensorConfig {
    fn default() -> Self {
        Self {
            column: "pv_kwh".to_string(),
            scale: 1.0,
        }
    }
}

/// Capacities evaluated by a sweep.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Battery capacities (kWh).
    pub capacities_kwh: Vec<f64>,
}

/// Demo data generator parameters.
///
/// PV follows a half-sine between sunrise and sunset; consumption follows
/// a daily sinusoid. Both carry multiplicative or additive Gaussian noise.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    /// Number of days to generate.
    pub days: usize,
    /// Random seed.
    pub seed: u64,
    /// Peak output of each configured PV array before scaling (kW).
    pub pv_kw_peak: f64,
    /// Hour of sunrise (0–24).
    pub sunrise_hour: f64,
    /// Hour of sunset (0–24).
    pub sunset_hour: f64,
    /// Relative PV noise standard deviation.
    pub pv_noise_std: f64,
    /// Mean household load (kW).
    pub base_kw: f64,
    /// Daily load amplitude (kW).
    pub amp_kw: f64,
    /// Load phase offset (radians).
    pub phase_rad: f64,
    /// Load noise standard deviation (kW).
    pub load_noise_std: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            days: 365,
            seed: 42,
            pv_kw_peak: 1.2,
            sunrise_hour: 6.0,
            sunset_hour: 19.0,
            pv_noise_std: 0.1,
            base_kw: 0.8,
            amp_kw: 0.4,
            phase_rad: 1.2,
            load_noise_std: 0.05,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.min_soc"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: hourly year, 20 kWh battery, one PV
    /// array extended six-fold.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            battery: StorageConfig::default(),
            tariff: TariffConfig::default(),
            readings: ReadingsConfig {
                pv: vec![PvSensorConfig {
                    scale: 6.0,
                    ..PvSensorConfig::default()
                }],
                ..ReadingsConfig::default()
            },
            sweep: SweepConfig::default(),
            synthetic: SyntheticConfig::default(),
        }
    }

    /// Returns the dimensioning preset: capacity sweep at full export price.
    pub fn dimensioning() -> Self {
        Self {
            tariff: TariffConfig {
                export_price: 7.5,
                ..TariffConfig::default()
            },
            sweep: SweepConfig {
                capacities_kwh: vec![5.0, 10.0, 15.0, 20.0, 25.0, 35.0],
            },
            ..Self::baseline()
        }
    }

    /// Returns the per-minute preset: one-minute grid, 15 kWh, 10 kW inverter.
    pub fn minute() -> Self {
        Self {
            simulation: SimulationConfig { steps_per_hour: 60 },
            battery: StorageConfig {
                capacity_kwh: 15.0,
                max_charge_kw: 10.0,
                max_discharge_kw: 10.0,
                eta_charge: 0.8,
                eta_discharge: 0.9,
                ..StorageConfig::default()
            },
            synthetic: SyntheticConfig {
                days: 7,
                ..SyntheticConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "dimensioning", "minute"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "dimensioning" => Ok(Self::dimensioning()),
            "minute" => Ok(Self::minute()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.steps_per_hour == 0 {
            errors.push(ConfigError::new("simulation.steps_per_hour", "must be > 0"));
        }

        let bat = &self.battery;
        if !(bat.capacity_kwh.is_finite() && bat.capacity_kwh > 0.0) {
            errors.push(ConfigError::new("battery.capacity_kwh", "must be > 0"));
        }
        if !(bat.min_soc > 0.0 && bat.min_soc < 1.0) {
            errors.push(ConfigError::new("battery.min_soc", "must be in (0.0, 1.0)"));
        }
        if !(0.0..=1.0).contains(&bat.initial_soc) {
            errors.push(ConfigError::new("battery.initial_soc", "must be in [0.0, 1.0]"));
        } else if bat.initial_soc < bat.min_soc {
            errors.push(ConfigError::new("battery.initial_soc", "must be >= battery.min_soc"));
        }
        for (field, kw) in [
            ("battery.max_charge_kw", bat.max_charge_kw),
            ("battery.max_discharge_kw", bat.max_discharge_kw),
        ] {
            if !(kw.is_finite() && kw > 0.0) {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }
        for (field, eta) in [
            ("battery.eta_charge", bat.eta_charge),
            ("battery.eta_discharge", bat.eta_discharge),
        ] {
            if !(eta > 0.0 && eta <= 1.0) {
                errors.push(ConfigError::new(field, "must be in (0.0, 1.0]"));
            }
        }

        let t = &self.tariff;
        for (field, price) in [
            ("tariff.import_price", t.import_price),
            ("tariff.export_price", t.export_price),
        ] {
            if !(price.is_finite() && price >= 0.0) {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }
        if !(t.minor_per_major.is_finite() && t.minor_per_major > 0.0) {
            errors.push(ConfigError::new("tariff.minor_per_major", "must be > 0"));
        }

        let r = &self.readings;
        if r.import_column.is_empty() {
            errors.push(ConfigError::new("readings.import_column", "must not be empty"));
        }
        if r.export_column.is_empty() {
            errors.push(ConfigError::new("readings.export_column", "must not be empty"));
        }
        for (i, pv) in r.pv.iter().enumerate() {
            if pv.column.is_empty() {
                errors.push(ConfigError::new(
                    &format!("readings.pv[{i}].column"),
                    "must not be empty",
                ));
            }
            if !(pv.scale.is_finite() && pv.scale >= 0.0) {
                errors.push(ConfigError::new(&format!("readings.pv[{i}].scale"), "must be >= 0"));
            }
        }

        if self
            .sweep
            .capacities_kwh
            .iter()
            .any(|c| !(c.is_finite() && *c > 0.0))
        {
            errors.push(ConfigError::new(
                "sweep.capacities_kwh",
                "every capacity must be > 0",
            ));
        }

        let syn = &self.synthetic;
        if syn.days == 0 {
            errors.push(ConfigError::new("synthetic.days", "must be > 0"));
        }
        if !(0.0 <= syn.sunrise_hour && syn.sunrise_hour < syn.sunset_hour && syn.sunset_hour <= 24.0)
        {
            errors.push(ConfigError::new(
                "synthetic.sunrise_hour",
                "must satisfy 0 <= sunrise_hour < sunset_hour <= 24",
            ));
        }
        if syn.pv_kw_peak < 0.0 || syn.base_kw < 0.0 {
            errors.push(ConfigError::new(
                "synthetic.pv_kw_peak",
                "peak and base load must be >= 0",
            ));
        }
        if syn.pv_noise_std < 0.0 || syn.load_noise_std < 0.0 {
            errors.push(ConfigError::new(
                "synthetic.pv_noise_std",
                "noise standard deviations must be >= 0",
            ));
        }

        errors
    }

    /// Battery model for the configured capacity.
    pub fn battery_config(&self) -> BatteryConfig {
        let b = &self.battery;
        BatteryConfig::with_floor_fraction(
            b.capacity_kwh,
            b.min_soc,
            b.initial_soc,
            b.max_charge_kw,
            b.max_discharge_kw,
            b.eta_charge,
            b.eta_discharge,
        )
    }

    /// Tariff used for the financial evaluation.
    pub fn tariff(&self) -> Tariff {
        Tariff {
            import_price: self.tariff.import_price,
            export_price: self.tariff.export_price,
            minor_per_major: self.tariff.minor_per_major,
            currency: self.tariff.currency.clone(),
        }
    }

    /// Step grid of the readings.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if `steps_per_hour` is zero.
    pub fn grid(&self) -> Result<StepGrid, SimError> {
        StepGrid::from_steps_per_hour(self.simulation.steps_per_hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent").expect_err("unknown preset");
        assert!(err.message.contains("unknown preset"));
        assert!(err.to_string().starts_with("config error: preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).expect("preset should load");
            let errors = cfg.validate();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
            assert!(cfg.grid().is_ok());
            assert!(cfg.battery_config().validate().is_ok());
        }
    }

    #[test]
    fn baseline_battery_matches_reference_pack() {
        let bat = ScenarioConfig::baseline().battery_config();
        assert_eq!(bat.capacity_max_kwh, 20.0);
        assert!((bat.capacity_min_kwh - 2.0).abs() < 1e-12);
        assert_eq!(bat.charge_power_max_kw, 3.0);
        assert_eq!(bat.discharge_efficiency, 0.95);
    }

    #[test]
    fn dimensioning_has_sweep() {
        let cfg = ScenarioConfig::dimensioning();
        assert_eq!(cfg.sweep.capacities_kwh.len(), 6);
        assert_eq!(cfg.tariff().export_price, 7.5);
    }

    #[test]
    fn minute_preset_grid() {
        let cfg = ScenarioConfig::minute();
        let grid = cfg.grid().expect("valid grid");
        assert!((grid.dt_hours() - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(cfg.battery_config().charge_efficiency, 0.8);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
steps_per_hour = 4

[battery]
capacity_kwh = 12.0
min_soc = 0.05
initial_soc = 0.3
max_charge_kw = 5.0
max_discharge_kw = 4.0
eta_charge = 0.92
eta_discharge = 0.93

[tariff]
import_price = 30.0
export_price = 8.0
minor_per_major = 100.0
currency = "EUR"

[readings]
import_column = "import"
export_column = "export"
cumulative = true

[[readings.pv]]
column = "roof_east"
scale = 2.0

[[readings.pv]]
column = "roof_west"

[sweep]
capacities_kwh = [5.0, 10.0]
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).expect("valid TOML should parse");
        assert_eq!(cfg.simulation.steps_per_hour, 4);
        assert_eq!(cfg.readings.pv.len(), 2);
        assert_eq!(cfg.readings.pv[1].scale, 1.0);
        assert!(cfg.readings.cumulative);
        assert_eq!(cfg.tariff().currency, "EUR");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[battery]
capacity_kwh = 10.0
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_bad_floor() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.min_soc = 0.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.min_soc"));
    }

    #[test]
    fn validation_catches_start_below_floor() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.initial_soc = 0.05;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.initial_soc"));

        cfg.battery.initial_soc = cfg.battery.min_soc;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_catches_bad_efficiency() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.eta_discharge = 1.2;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.eta_discharge"));
    }

    #[test]
    fn validation_catches_negative_sweep_capacity() {
        let mut cfg = ScenarioConfig::dimensioning();
        cfg.sweep.capacities_kwh.push(-5.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "sweep.capacities_kwh"));
    }

    #[test]
    fn validation_collects_multiple_errors() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.steps_per_hour = 0;
        cfg.readings.pv[0].scale = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.steps_per_hour"));
        assert!(errors.iter().any(|e| e.field == "readings.pv[0].scale"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[battery]
capacity_kwh = 8.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).expect("partial TOML parses");
        assert_eq!(cfg.battery.capacity_kwh, 8.0);
        assert_eq!(cfg.battery.eta_charge, 0.95);
        assert_eq!(cfg.simulation.steps_per_hour, 1);
        assert_eq!(cfg.readings.pv.len(), 1);
    }
}
