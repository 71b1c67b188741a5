//! Summary Statistics
//!
//! Single-statistic reductions over timing arrays.
//!
//! Standard deviation is the POPULATION form (divide by N): the samples are the
//! complete set of iterations measured in a run, not a draw from a larger one.

use crate::{Result, StatsError};

fn non_empty(samples: &[f64]) -> Result<&[f64]> {
    if samples.is_empty() {
        Err(StatsError::EmptyInput)
    } else {
        Ok(samples)
    }
}

/// Arithmetic mean
pub fn mean(samples: &[f64]) -> Result<f64> {
    let samples = non_empty(samples)?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Population standard deviation (0 for a single sample)
pub fn stddev(samples: &[f64]) -> Result<f64> {
    let avg = mean(samples)?;
    let variance =
        samples.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / samples.len() as f64;
    Ok(variance.sqrt())
}

/// Smallest sample
pub fn min(samples: &[f64]) -> Result<f64> {
    non_empty(samples)?
        .iter()
        .copied()
        .min_by(|a, b| a.total_cmp(b))
        .ok_or(StatsError::EmptyInput)
}

/// Largest sample
pub fn max(samples: &[f64]) -> Result<f64> {
    non_empty(samples)?
        .iter()
        .copied()
        .max_by(|a, b| a.total_cmp(b))
        .ok_or(StatsError::EmptyInput)
}

/// Median: middle element of the sorted samples, or the mean of the two
/// central elements for an even count
pub fn median(samples: &[f64]) -> Result<f64> {
    let mut sorted = non_empty(samples)?.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Element-wise sum of two equal-length arrays.
///
/// Used to derive `total_ms[i] = parse_ms[i] + render_ms[i]`.
pub fn add_arrays(left: &[f64], right: &[f64]) -> Result<Vec<f64>> {
    if left.len() != right.len() {
        return Err(StatsError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    Ok(left.iter().zip(right).map(|(a, b)| a + b).collect())
}
