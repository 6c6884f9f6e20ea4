//! CSV input and output.

/// Per-step and sweep CSV export.
pub mod export;
pub mod readings;
