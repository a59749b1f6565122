// crates/perf-tracker-core/tests/proptest_stats.rs
// ============================================================================
// Module: Statistics Property-Based Tests
// Description: Property tests for mean, spread, percentile, and period.
// Purpose: Detect NaN leakage and ordering violations across wide inputs.
// ============================================================================

//! Property-based tests for sample statistics invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use perf_tracker_core::Aggregator;
use perf_tracker_core::RawMetricSample;
use perf_tracker_core::StatsError;
use perf_tracker_core::stats;
use proptest::prelude::*;

fn values_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6 .. 1.0e6_f64, 1 .. 256)
}

proptest! {
    #[test]
    fn mean_matches_arithmetic_mean(values in values_strategy()) {
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        let actual = stats::mean(&values).unwrap();
        let magnitude = values.iter().fold(1.0_f64, |acc, value| acc.max(value.abs()));
        prop_assert!((actual - expected).abs() <= 1e-9 * magnitude);
    }

    #[test]
    fn period_is_floor_of_window_over_count(count in 1usize .. 10_000, window in 1u64 .. 10_000) {
        let period = stats::period_seconds(window, count).unwrap();
        let expected = (window as f64 / count as f64).floor() as u64;
        prop_assert_eq!(period, expected);
    }

    #[test]
    fn statistics_respect_ordering(values in values_strategy()) {
        let sample = RawMetricSample {
            id: String::new(),
            label: "m".to_string(),
            messages: String::new(),
            status_code: String::new(),
            timestamps: vec![String::new(); values.len()],
            values,
        };
        let metric = Aggregator::default().aggregate_metric(&sample).unwrap();
        prop_assert!(metric.min <= metric.p99 && metric.p99 <= metric.max);
        prop_assert!(metric.min - 1e-6 <= metric.average && metric.average <= metric.max + 1e-6);
        prop_assert!(metric.spread >= 0.0 && metric.spread.is_finite());
    }

    #[test]
    fn spread_is_zero_for_constant_series(value in -1.0e6 .. 1.0e6_f64, count in 1usize .. 64) {
        let values = vec![value; count];
        let mean = stats::mean(&values).unwrap();
        let spread = stats::population_std_dev(&values, mean).unwrap();
        prop_assert!(spread <= 1e-6 * value.abs().max(1.0));
    }
}

#[test]
fn empty_series_is_an_error_not_nan() {
    assert_eq!(stats::mean(&[]), Err(StatsError::Empty));
    assert_eq!(stats::population_std_dev(&[], 0.0), Err(StatsError::Empty));
    assert_eq!(stats::extrema(&[]), Err(StatsError::Empty));
    assert_eq!(stats::percentile_nearest_rank(&[], 99), Err(StatsError::Empty));
    assert_eq!(stats::period_seconds(300, 0), Err(StatsError::Empty));
}

#[test]
fn percentile_uses_nearest_rank() {
    let values: Vec<f64> = (1 ..= 200).map(f64::from).collect();
    assert_eq!(stats::percentile_nearest_rank(&values, 99), Ok(198.0));
    assert_eq!(stats::percentile_nearest_rank(&values, 100), Ok(200.0));
    assert_eq!(stats::percentile_nearest_rank(&[5.0, 1.0, 3.0], 50), Ok(3.0));
    assert_eq!(stats::percentile_nearest_rank(&[1.0], 0), Err(StatsError::InvalidPercentile(0)));
}
