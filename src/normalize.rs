//! Reading normalization: turns raw sensor values into clean per-step deltas.
//!
//! This is the only place where missing values are coerced. Everything
//! downstream of [`EnergyBalance::compose`](crate::balance::EnergyBalance::compose)
//! rejects non-finite input instead.

use tracing::warn;

/// Converts a monotonically increasing energy counter into per-step deltas.
///
/// The output has the same length as the input; the first step has no
/// predecessor and yields `0.0`. Missing (non-finite) counter values yield a
/// zero delta and the next valid value is differenced against the last valid
/// one. A decreasing counter (meter reset or replacement) yields a zero delta.
pub fn counter_deltas(counter: &[f64]) -> Vec<f64> {
    let mut last: Option<f64> = None;
    let mut resets = 0_usize;
    let deltas = counter
        .iter()
        .map(|&value| {
            if !value.is_finite() {
                return 0.0;
            }
            let delta = match last {
                Some(prev) if value >= prev => value - prev,
                Some(_) => {
                    resets += 1;
                    0.0
                }
                None => 0.0,
            };
            last = Some(value);
            delta
        })
        .collect();
    if resets > 0 {
        warn!(resets, "energy counter decreased, treating as reset");
    }
    deltas
}

/// Replaces missing (non-finite) delta values with zero.
pub fn fill_missing(values: &[f64]) -> Vec<f64> {
    let mut missing = 0_usize;
    let filled = values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                v
            } else {
                missing += 1;
                0.0
            }
        })
        .collect();
    if missing > 0 {
        warn!(missing, "missing readings replaced with zero");
    }
    filled
}

/// Normalizes one sensor column, either a cumulative counter or plain deltas.
pub fn normalize(values: &[f64], cumulative: bool) -> Vec<f64> {
    if cumulative {
        counter_deltas(values)
    } else {
        fill_missing(values)
    }
}
