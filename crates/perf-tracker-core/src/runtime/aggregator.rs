// crates/perf-tracker-core/src/runtime/aggregator.rs
// ============================================================================
// Module: Metric Aggregator
// Description: Reduces collector documents into per-build metric records.
// Purpose: Parse, validate, and summarize raw sample series.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The aggregator turns a [`CollectorDocument`] into a [`MetricRecord`] keyed
//! by a caller-supplied [`BuildIdentity`]. A metric that cannot be summarized
//! (no samples, mismatched timestamps, overflow, invalid label) aborts the
//! whole record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AggregatedMetric;
use crate::core::BuildIdentity;
use crate::core::CollectorDocument;
use crate::core::MetricLabel;
use crate::core::MetricRecord;
use crate::core::RawMetricSample;
use crate::runtime::stats;
use crate::runtime::stats::StatsError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Time window covered by one collection run, in seconds.
pub const DEFAULT_WINDOW_SECONDS: u64 = 300;
/// Maximum collector document size in bytes.
pub const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;
/// Maximum number of metric entries per document.
pub const MAX_METRICS_PER_DOCUMENT: usize = 1024;
/// Maximum number of samples per metric.
pub const MAX_SAMPLES_PER_METRIC: usize = 100_000;
/// Percentile reported as `P99`.
const P99: u32 = 99;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Dispersion formula used for the `StandardDev` statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpreadFormula {
    /// Population standard deviation.
    #[default]
    Population,
    /// Square of summed deviations; matches records from older tooling.
    LegacySummedDeviation,
}

/// Aggregation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationSettings {
    /// Collection window in seconds used to derive the sampling period.
    pub window_seconds: u64,
    /// Dispersion formula.
    pub spread: SpreadFormula,
    /// Maximum samples accepted per metric.
    pub max_samples_per_metric: usize,
    /// Maximum metric entries accepted per document.
    pub max_metrics: usize,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            spread: SpreadFormula::default(),
            max_samples_per_metric: MAX_SAMPLES_PER_METRIC,
            max_metrics: MAX_METRICS_PER_DOCUMENT,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Aggregation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    /// Document did not match the collector schema.
    #[error("collector document parse error: {0}")]
    Parse(String),
    /// Metric data cannot be summarized.
    #[error("invalid input for metric {label}: {reason}")]
    InvalidInput {
        /// Label of the offending metric.
        label: String,
        /// Human-readable reason.
        reason: String,
    },
    /// Document exceeded a size limit.
    #[error("collector document too large: {0}")]
    TooLarge(String),
}

impl AggregateError {
    /// Builds an [`AggregateError::InvalidInput`] for a metric label.
    fn invalid(label: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            label: label.to_string(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Reduces collector documents into [`MetricRecord`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    /// Aggregation settings.
    settings: AggregationSettings,
}

impl Aggregator {
    /// Creates an aggregator with explicit settings.
    #[must_use]
    pub const fn new(settings: AggregationSettings) -> Self {
        Self {
            settings,
        }
    }

    /// Returns the aggregator settings.
    #[must_use]
    pub const fn settings(&self) -> &AggregationSettings {
        &self.settings
    }

    /// Parses a collector document from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::TooLarge`] for oversized input and
    /// [`AggregateError::Parse`] on schema mismatch.
    pub fn parse_document(&self, bytes: &[u8]) -> Result<CollectorDocument, AggregateError> {
        if bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(AggregateError::TooLarge(format!(
                "{} bytes (max {MAX_DOCUMENT_BYTES})",
                bytes.len()
            )));
        }
        let document: CollectorDocument =
            serde_json::from_slice(bytes).map_err(|err| AggregateError::Parse(err.to_string()))?;
        if document.len() > self.settings.max_metrics {
            return Err(AggregateError::TooLarge(format!(
                "{} metrics (max {})",
                document.len(),
                self.settings.max_metrics
            )));
        }
        Ok(document)
    }

    /// Parses and aggregates a collector document in one step.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] when parsing or aggregation fails.
    pub fn aggregate_bytes(
        &self,
        bytes: &[u8],
        identity: &BuildIdentity,
    ) -> Result<MetricRecord, AggregateError> {
        let document = self.parse_document(bytes)?;
        self.aggregate(&document, identity)
    }

    /// Aggregates every metric in the document into one record.
    ///
    /// Later entries replace earlier entries with the same label.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidInput`] for the first metric that
    /// cannot be summarized; no partial record is produced.
    pub fn aggregate(
        &self,
        document: &CollectorDocument,
        identity: &BuildIdentity,
    ) -> Result<MetricRecord, AggregateError> {
        if document.len() > self.settings.max_metrics {
            return Err(AggregateError::TooLarge(format!(
                "{} metrics (max {})",
                document.len(),
                self.settings.max_metrics
            )));
        }
        let mut record = MetricRecord::new(identity);
        for sample in document.samples() {
            let label = MetricLabel::new(sample.label.clone())
                .map_err(|err| AggregateError::invalid(&sample.label, err.to_string()))?;
            let metric = self.aggregate_metric(sample)?;
            record.insert(label, metric);
        }
        Ok(record)
    }

    /// Summarizes a single raw sample series.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidInput`] naming the metric label when
    /// the series is empty, mismatched, oversized, or overflows.
    pub fn aggregate_metric(
        &self,
        sample: &RawMetricSample,
    ) -> Result<AggregatedMetric, AggregateError> {
        let label = sample.label.as_str();
        let values = sample.values.as_slice();
        if values.is_empty() {
            return Err(AggregateError::invalid(label, "no samples"));
        }
        if sample.timestamps.len() != values.len() {
            return Err(AggregateError::invalid(
                label,
                format!(
                    "{} timestamps for {} values",
                    sample.timestamps.len(),
                    values.len()
                ),
            ));
        }
        if values.len() > self.settings.max_samples_per_metric {
            return Err(AggregateError::invalid(
                label,
                format!(
                    "{} samples exceeds limit {}",
                    values.len(),
                    self.settings.max_samples_per_metric
                ),
            ));
        }
        let stat_err = |err: StatsError| AggregateError::invalid(label, err.to_string());
        let average = stats::mean(values).map_err(stat_err)?;
        let spread = match self.settings.spread {
            SpreadFormula::Population => stats::population_std_dev(values, average),
            SpreadFormula::LegacySummedDeviation => {
                stats::legacy_summed_deviation(values, average)
            }
        }
        .map_err(stat_err)?;
        let (min, max) = stats::extrema(values).map_err(stat_err)?;
        let p99 = stats::percentile_nearest_rank(values, P99).map_err(stat_err)?;
        let period_seconds =
            stats::period_seconds(self.settings.window_seconds, values.len()).map_err(stat_err)?;
        Ok(AggregatedMetric {
            average,
            spread,
            max,
            min,
            p99,
            period_seconds,
            raw_samples: values.to_vec(),
        })
    }
}
