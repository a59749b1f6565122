// crates/perf-tracker-core/src/runtime/stats.rs
// ============================================================================
// Module: Sample Statistics
// Description: Mean, dispersion, extrema, percentile, and period helpers.
// Purpose: Reduce a sample series to summary statistics without NaN leakage.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every helper rejects an empty series instead of dividing by zero, and every
//! floating-point result is checked for finiteness before it is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Statistics errors for degenerate sample series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The series has no samples.
    #[error("sample series is empty")]
    Empty,
    /// The series is too long to count exactly as `f64`.
    #[error("sample series has too many samples: {0}")]
    TooManySamples(usize),
    /// A statistic overflowed to a non-finite value.
    #[error("{0} is not finite")]
    NonFinite(&'static str),
    /// Percentile outside `1..=100`.
    #[error("percentile must be within 1..=100, got {0}")]
    InvalidPercentile(u32),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the sample count as an exact `f64`.
fn sample_count(values: &[f64]) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::Empty);
    }
    let count = u32::try_from(values.len()).map_err(|_| StatsError::TooManySamples(values.len()))?;
    Ok(f64::from(count))
}

/// Returns `value` when finite, otherwise a [`StatsError::NonFinite`].
fn finite(name: &'static str, value: f64) -> Result<f64, StatsError> {
    if value.is_finite() { Ok(value) } else { Err(StatsError::NonFinite(name)) }
}

// ============================================================================
// SECTION: Statistics
// ============================================================================

/// Arithmetic mean of the series.
///
/// Accumulated incrementally as `m += v/k - m/k`, so series whose sum
/// overflows but whose mean is finite still succeed.
///
/// # Errors
///
/// Returns [`StatsError::Empty`] for an empty series and
/// [`StatsError::NonFinite`] when a sample or the mean is not finite.
pub fn mean(values: &[f64]) -> Result<f64, StatsError> {
    sample_count(values)?;
    let mut average = 0.0_f64;
    let mut seen = 0.0_f64;
    for value in values {
        seen += 1.0;
        average += finite("sample", *value)? / seen - average / seen;
    }
    finite("average", average)
}

/// Population standard deviation: `sqrt(Σ(mean - v)^2 / n)`.
///
/// Deviations are scaled by the largest one before squaring and the mean
/// square is accumulated incrementally, so large but finite spreads do not
/// overflow.
///
/// # Errors
///
/// Returns [`StatsError`] for an empty series or non-finite result.
pub fn population_std_dev(values: &[f64], mean: f64) -> Result<f64, StatsError> {
    sample_count(values)?;
    let scale = values
        .iter()
        .map(|value| (mean - value).abs())
        .fold(0.0_f64, f64::max);
    let scale = finite("spread", scale)?;
    if scale <= 0.0 {
        return Ok(0.0);
    }
    let mut mean_square = 0.0_f64;
    let mut seen = 0.0_f64;
    for value in values {
        seen += 1.0;
        let scaled = (mean - value) / scale;
        mean_square += (scaled * scaled - mean_square) / seen;
    }
    finite("spread", scale * mean_square.sqrt())
}

/// Legacy dispersion: `sqrt((Σ(mean - v))^2 / n)`.
///
/// Squares the summed deviations rather than summing squared deviations, so
/// it is close to zero for any series. Kept for comparing against records
/// written by older tooling.
///
/// # Errors
///
/// Returns [`StatsError`] for an empty series or non-finite result.
pub fn legacy_summed_deviation(values: &[f64], mean: f64) -> Result<f64, StatsError> {
    let count = sample_count(values)?;
    let summed: f64 = values.iter().map(|value| mean - value).sum();
    finite("spread", (summed.powi(2) / count).sqrt())
}

/// Smallest and largest sample, as `(min, max)`.
///
/// # Errors
///
/// Returns [`StatsError::Empty`] for an empty series.
pub fn extrema(values: &[f64]) -> Result<(f64, f64), StatsError> {
    let (first, rest) = values.split_first().ok_or(StatsError::Empty)?;
    let (min, max) = rest
        .iter()
        .fold((*first, *first), |(min, max), value| (min.min(*value), max.max(*value)));
    Ok((finite("min", min)?, finite("max", max)?))
}

/// Nearest-rank percentile: the smallest sample such that at least
/// `percentile` percent of the series is less than or equal to it.
///
/// # Errors
///
/// Returns [`StatsError`] for an empty series or a percentile outside
/// `1..=100`.
pub fn percentile_nearest_rank(values: &[f64], percentile: u32) -> Result<f64, StatsError> {
    if values.is_empty() {
        return Err(StatsError::Empty);
    }
    if !(1 ..= 100).contains(&percentile) {
        return Err(StatsError::InvalidPercentile(percentile));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let scale =
        usize::try_from(percentile).map_err(|_| StatsError::InvalidPercentile(percentile))?;
    // rank = ceil(p * n / 100), always within 1..=n for p in 1..=100
    let rank = scale.saturating_mul(sorted.len()).div_ceil(100);
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    finite("p99", sorted[index])
}

/// Sampling period in whole seconds: `floor(window_seconds / n)`.
///
/// # Errors
///
/// Returns [`StatsError::Empty`] when `sample_count` is zero.
pub fn period_seconds(window_seconds: u64, sample_count: usize) -> Result<u64, StatsError> {
    if sample_count == 0 {
        return Err(StatsError::Empty);
    }
    let count = u64::try_from(sample_count).map_err(|_| StatsError::TooManySamples(sample_count))?;
    Ok(window_seconds / count)
}
