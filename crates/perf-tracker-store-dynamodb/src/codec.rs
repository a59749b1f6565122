// crates/perf-tracker-store-dynamodb/src/codec.rs
// ============================================================================
// Module: Metric Record Codec
// Description: Explicit MetricRecord <-> DynamoDB attribute-value mapping.
// Purpose: Encode records without reflection and fail with typed errors.
// Dependencies: aws-sdk-dynamodb, perf-tracker-core, thiserror
// ============================================================================

//! ## Overview
//! A record is stored as one item: `Hash` (S), optional `CommitDate` (S),
//! `IsRelease` (BOOL, only when set), and one map attribute per metric label
//! holding `Average`, `StandardDev`, `Max`, `Min`, `P99`, `Period`, `Data`.
//! Numbers outside the range `DynamoDB` can represent are rejected with
//! [`CodecError::Unrepresentable`].
//!
//! Decoding also accepts items written by older tooling. `Average`, `Period`
//! and `Data` are required; a missing `StandardDev`, `Max`, `Min` or `P99` is
//! recomputed from `Data` (population spread, extrema, nearest-rank p99). An
//! empty `CommitDate` decodes as absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use perf_tracker_core::AggregatedMetric;
use perf_tracker_core::BuildHash;
use perf_tracker_core::MetricLabel;
use perf_tracker_core::MetricRecord;
use perf_tracker_core::stats;
use thiserror::Error;

use crate::backend::HASH_KEY_ATTRIBUTE;
use crate::backend::Item;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Commit date attribute.
pub const COMMIT_DATE_ATTRIBUTE: &str = "CommitDate";
/// Release flag attribute.
pub const IS_RELEASE_ATTRIBUTE: &str = "IsRelease";
/// Average statistic attribute.
const AVERAGE: &str = "Average";
/// Spread statistic attribute.
const STANDARD_DEV: &str = "StandardDev";
/// Maximum statistic attribute.
const MAX: &str = "Max";
/// Minimum statistic attribute.
const MIN: &str = "Min";
/// 99th percentile attribute.
const P99: &str = "P99";
/// Sampling period attribute.
const PERIOD: &str = "Period";
/// Raw samples attribute.
const DATA: &str = "Data";
/// Largest magnitude `DynamoDB` numbers can hold (exclusive).
const MAX_NUMBER_MAGNITUDE: f64 = 1e126;
/// Smallest non-zero magnitude `DynamoDB` numbers can hold.
const MIN_NUMBER_MAGNITUDE: f64 = 1e-130;
/// Magnitudes rendered in plain decimal notation.
const PLAIN_NOTATION_RANGE: std::ops::Range<f64> = 1e-6 .. 1e15;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record encoding and decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Value cannot be represented as a `DynamoDB` number.
    #[error("{field} value {value} cannot be stored as a number")]
    Unrepresentable {
        /// Attribute path of the value.
        field: String,
        /// Rendered value.
        value: String,
    },
    /// Stored attribute is missing.
    #[error("missing attribute {0}")]
    Missing(String),
    /// Stored attribute has an unexpected type or content.
    #[error("malformed attribute {field}: {reason}")]
    Malformed {
        /// Attribute path.
        field: String,
        /// Reason for rejection.
        reason: String,
    },
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes a record into a store-native item.
///
/// # Errors
///
/// Returns [`CodecError::Unrepresentable`] when a statistic or sample cannot
/// be stored as a `DynamoDB` number.
pub fn encode_record(record: &MetricRecord) -> Result<Item, CodecError> {
    let mut item = HashMap::with_capacity(record.metrics.len() + 3);
    item.insert(
        HASH_KEY_ATTRIBUTE.to_string(),
        AttributeValue::S(record.build_hash.as_str().to_string()),
    );
    if let Some(commit_date) = &record.commit_date {
        item.insert(COMMIT_DATE_ATTRIBUTE.to_string(), AttributeValue::S(commit_date.clone()));
    }
    if record.is_release {
        item.insert(IS_RELEASE_ATTRIBUTE.to_string(), AttributeValue::Bool(true));
    }
    for (label, metric) in &record.metrics {
        item.insert(label.as_str().to_string(), encode_metric(label.as_str(), metric)?);
    }
    Ok(item)
}

/// Encodes one aggregated metric as a map attribute.
fn encode_metric(label: &str, metric: &AggregatedMetric) -> Result<AttributeValue, CodecError> {
    let mut map = HashMap::with_capacity(7);
    let stats = [
        (AVERAGE, metric.average),
        (STANDARD_DEV, metric.spread),
        (MAX, metric.max),
        (MIN, metric.min),
        (P99, metric.p99),
    ];
    for (name, value) in stats {
        map.insert(name.to_string(), number(&format!("{label}.{name}"), value)?);
    }
    map.insert(PERIOD.to_string(), AttributeValue::N(metric.period_seconds.to_string()));
    let data = metric
        .raw_samples
        .iter()
        .enumerate()
        .map(|(idx, value)| number(&format!("{label}.{DATA}[{idx}]"), *value))
        .collect::<Result<Vec<_>, _>>()?;
    map.insert(DATA.to_string(), AttributeValue::L(data));
    Ok(AttributeValue::M(map))
}

/// Renders a finite `f64` as a `DynamoDB` number attribute.
fn number(field: &str, value: f64) -> Result<AttributeValue, CodecError> {
    format_number(value).map(AttributeValue::N).ok_or_else(|| CodecError::Unrepresentable {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Formats a number in a notation `DynamoDB` accepts, or `None` when the
/// value is out of range.
///
/// Plain decimal notation is used for ordinary magnitudes; very large or very
/// small values use exponent notation so the digit count stays bounded.
#[must_use]
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == 0.0 {
        return Some("0".to_string());
    }
    let magnitude = value.abs();
    if !(MIN_NUMBER_MAGNITUDE .. MAX_NUMBER_MAGNITUDE).contains(&magnitude) {
        return None;
    }
    if PLAIN_NOTATION_RANGE.contains(&magnitude) {
        Some(value.to_string())
    } else {
        Some(format!("{value:e}"))
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes a store-native item into a record.
///
/// Attributes other than the key, commit date, and release flag must be
/// metric maps.
///
/// # Errors
///
/// Returns [`CodecError`] when the item is missing required attributes or
/// holds malformed values.
pub fn decode_record(item: &Item) -> Result<MetricRecord, CodecError> {
    let hash = match item.get(HASH_KEY_ATTRIBUTE) {
        Some(AttributeValue::S(value)) => value.clone(),
        Some(_) => return Err(malformed(HASH_KEY_ATTRIBUTE, "expected string")),
        None => return Err(CodecError::Missing(HASH_KEY_ATTRIBUTE.to_string())),
    };
    let build_hash =
        BuildHash::new(hash).map_err(|err| malformed(HASH_KEY_ATTRIBUTE, err.to_string()))?;
    let commit_date = match item.get(COMMIT_DATE_ATTRIBUTE) {
        Some(AttributeValue::S(value)) if value.is_empty() => None,
        Some(AttributeValue::S(value)) => Some(value.clone()),
        Some(_) => return Err(malformed(COMMIT_DATE_ATTRIBUTE, "expected string")),
        None => None,
    };
    let is_release = match item.get(IS_RELEASE_ATTRIBUTE) {
        Some(AttributeValue::Bool(value)) => *value,
        Some(_) => return Err(malformed(IS_RELEASE_ATTRIBUTE, "expected boolean")),
        None => false,
    };
    let mut record = MetricRecord {
        build_hash,
        commit_date,
        is_release,
        metrics: std::collections::BTreeMap::new(),
    };
    for (name, value) in item {
        let reserved = [HASH_KEY_ATTRIBUTE, COMMIT_DATE_ATTRIBUTE, IS_RELEASE_ATTRIBUTE];
        if reserved.contains(&name.as_str()) {
            continue;
        }
        let label = MetricLabel::new(name.clone()).map_err(|err| malformed(name, err.to_string()))?;
        record.insert(label, decode_metric(name, value)?);
    }
    Ok(record)
}

/// Decodes one metric map attribute.
fn decode_metric(label: &str, value: &AttributeValue) -> Result<AggregatedMetric, CodecError> {
    let AttributeValue::M(map) = value else {
        return Err(malformed(label, "expected metric map"));
    };
    let stat = |name: &str| -> Result<Option<f64>, CodecError> {
        map.get(name).map(|value| parse_number(&format!("{label}.{name}"), value)).transpose()
    };
    let period_field = format!("{label}.{PERIOD}");
    let period_seconds = match map.get(PERIOD) {
        Some(AttributeValue::N(text)) => text
            .parse::<u64>()
            .map_err(|err| malformed(&period_field, err.to_string()))?,
        Some(_) => return Err(malformed(&period_field, "expected number")),
        None => return Err(CodecError::Missing(period_field)),
    };
    let data_field = format!("{label}.{DATA}");
    let raw_samples = match map.get(DATA) {
        Some(AttributeValue::L(values)) => values
            .iter()
            .enumerate()
            .map(|(idx, value)| parse_number(&format!("{data_field}[{idx}]"), value))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(malformed(&data_field, "expected list")),
        None => return Err(CodecError::Missing(data_field)),
    };
    let average = stat(AVERAGE)?.ok_or_else(|| CodecError::Missing(format!("{label}.{AVERAGE}")))?;
    let derived = |name: &str, err: stats::StatsError| {
        malformed(&format!("{label}.{name}"), format!("cannot derive from {DATA}: {err}"))
    };
    let spread = match stat(STANDARD_DEV)? {
        Some(value) => value,
        None => stats::population_std_dev(&raw_samples, average)
            .map_err(|err| derived(STANDARD_DEV, err))?,
    };
    let (min, max) = match (stat(MIN)?, stat(MAX)?) {
        (Some(min), Some(max)) => (min, max),
        (min, max) => {
            let (low, high) = stats::extrema(&raw_samples).map_err(|err| derived(MIN, err))?;
            (min.unwrap_or(low), max.unwrap_or(high))
        }
    };
    let p99 = match stat(P99)? {
        Some(value) => value,
        None => stats::percentile_nearest_rank(&raw_samples, 99)
            .map_err(|err| derived(P99, err))?,
    };
    Ok(AggregatedMetric {
        average,
        spread,
        max,
        min,
        p99,
        period_seconds,
        raw_samples,
    })
}

/// Parses a number attribute into a finite `f64`.
fn parse_number(field: &str, value: &AttributeValue) -> Result<f64, CodecError> {
    let AttributeValue::N(text) = value else {
        return Err(malformed(field, "expected number"));
    };
    let parsed = text.parse::<f64>().map_err(|err| malformed(field, err.to_string()))?;
    if parsed.is_finite() { Ok(parsed) } else { Err(malformed(field, "number is not finite")) }
}

/// Builds a [`CodecError::Malformed`].
fn malformed(field: &str, reason: impl Into<String>) -> CodecError {
    CodecError::Malformed {
        field: field.to_string(),
        reason: reason.into(),
    }
}
