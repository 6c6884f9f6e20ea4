//! Errors raised by the simulation core.

use thiserror::Error;

/// Failure of a simulation run.
///
/// Configuration problems are reported before any step is simulated; input
/// problems abort the run at the offending step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A battery or grid parameter is outside its admissible range.
    #[error("invalid configuration: {field} {message}")]
    InvalidConfig {
        /// Name of the offending parameter.
        field: &'static str,
        /// Constraint the value violates.
        message: String,
    },

    /// An input series carries `NaN` or an infinite value.
    #[error("non-finite value {value} in `{series}` at step {index}")]
    NonFiniteInput {
        series: String,
        index: usize,
        value: f64,
    },

    /// Two series that must share a time grid have different lengths.
    #[error("series `{series}` has {actual} steps, expected {expected}")]
    LengthMismatch {
        series: String,
        expected: usize,
        actual: usize,
    },
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}

/// Rejects the first non-finite value in `values`.
///
/// # Errors
///
/// Returns [`SimError::NonFiniteInput`] naming `series` and the step index.
pub fn ensure_finite(series: &str, values: &[f64]) -> Result<(), SimError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SimError::NonFiniteInput {
            series: series.to_string(),
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}
