//! Home battery autarky simulator.
//!
//! Replays metered household energy data against a virtual battery and
//! reports how much of the consumption PV and storage could have covered.

/// Energy balance composition from meter readings.
pub mod balance;
pub mod config;
pub mod io;
pub mod normalize;
pub mod report;
/// Battery model, flow decomposition, evaluation and capacity sweeps.
pub mod sim;
pub mod synthetic;
