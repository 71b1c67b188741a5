//! Phase Metrics
//!
//! Composes the summary reductions into per-phase records. A `PhaseMetrics`
//! never travels alone: it is always part of a [`TimingMetrics`] triple.

use crate::summary::{add_arrays, max, mean, median, min, stddev};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Descriptive statistics for one timing phase, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseMetrics {
    /// Arithmetic mean
    pub mean_ms: f64,
    /// Population standard deviation
    pub stddev_ms: f64,
    /// Fastest iteration
    pub min_ms: f64,
    /// Slowest iteration
    pub max_ms: f64,
    /// Median iteration
    pub median_ms: f64,
}

/// Metrics for the parse phase, the render phase and their per-iteration sum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingMetrics {
    /// Template parse/compile phase
    pub parse: PhaseMetrics,
    /// Render phase
    pub render: PhaseMetrics,
    /// `parse[i] + render[i]` for each iteration
    pub total: PhaseMetrics,
}

/// Compute all descriptive statistics for one timing array
pub fn calculate_metrics(samples: &[f64]) -> Result<PhaseMetrics> {
    Ok(PhaseMetrics {
        mean_ms: mean(samples)?,
        stddev_ms: stddev(samples)?,
        min_ms: min(samples)?,
        max_ms: max(samples)?,
        median_ms: median(samples)?,
    })
}

/// Compute the parse/render/total triple from raw per-iteration timings
pub fn calculate_timing_metrics(parse_ms: &[f64], render_ms: &[f64]) -> Result<TimingMetrics> {
    let total_ms = add_arrays(parse_ms, render_ms)?;

    Ok(TimingMetrics {
        parse: calculate_metrics(parse_ms)?,
        render: calculate_metrics(render_ms)?,
        total: calculate_metrics(&total_ms)?,
    })
}
