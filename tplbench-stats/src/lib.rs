#![warn(missing_docs)]
//! tplbench Statistics Engine
//!
//! Pure functions turning per-iteration timing samples into descriptive metrics:
//! - Central tendency (mean, median)
//! - Dispersion (population standard deviation, min, max)
//! - Element-wise phase addition (`total = parse + render`)
//!
//! Every function requires at least one sample. Adapters are always asked for
//! `iterations >= 1`, so an empty array means a caller bug and is reported as
//! [`StatsError::EmptyInput`] rather than encoded as a zero.

mod metrics;
mod summary;

pub use metrics::{PhaseMetrics, TimingMetrics, calculate_metrics, calculate_timing_metrics};
pub use summary::{add_arrays, max, mean, median, min, stddev};

use thiserror::Error;

/// Errors produced by the statistics functions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// A statistic was requested over zero samples
    #[error("cannot compute statistics over an empty sample set")]
    EmptyInput,

    /// Two arrays that must be combined element-wise differ in length
    #[error("array length mismatch: {left} vs {right}")]
    LengthMismatch {
        /// Length of the left-hand array
        left: usize,
        /// Length of the right-hand array
        right: usize,
    },
}

/// Result alias for statistics functions
pub type Result<T> = std::result::Result<T, StatsError>;
