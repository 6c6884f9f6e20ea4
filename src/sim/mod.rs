//! Battery simulation core: step function, flow decomposition, evaluation.

pub mod battery;
pub mod engine;
pub mod error;
pub mod flow;
/// Uniform time grid shared by all series of a run.
pub mod grid;
pub mod kpi;
pub mod sweep;

pub use battery::BatteryConfig;
pub use engine::{RunReport, Trajectory, run, simulate};
pub use error::SimError;
pub use flow::{FlowDecomposition, decompose};
pub use grid::StepGrid;
pub use kpi::{AutarkySummary, Tariff, evaluate};
pub use sweep::{SweepResults, sweep};
