// crates/perf-tracker-core/src/core/record.rs
// ============================================================================
// Module: Metric Records
// Description: Aggregated statistics and per-build metric records.
// Purpose: Define the record persisted once per build hash.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`MetricRecord`] maps metric labels to [`AggregatedMetric`] values for a
//! single build. Serialized field names match the persisted attribute names
//! and metrics are flattened to one top-level key per label, so JSON output
//! has the same layout as a stored item.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BuildHash;
use crate::core::identifiers::BuildIdentity;
use crate::core::identifiers::MetricLabel;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Summary statistics derived from one metric's sample series.
///
/// # Invariants
/// - All floating-point fields are finite.
/// - `min <= p99 <= max`, and `min <= average <= max` within rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetric {
    /// Arithmetic mean of the samples.
    #[serde(rename = "Average")]
    pub average: f64,
    /// Dispersion of the samples.
    #[serde(rename = "StandardDev")]
    pub spread: f64,
    /// Largest sample.
    #[serde(rename = "Max")]
    pub max: f64,
    /// Smallest sample.
    #[serde(rename = "Min")]
    pub min: f64,
    /// 99th percentile (nearest rank).
    #[serde(rename = "P99")]
    pub p99: f64,
    /// Sampling period in whole seconds.
    #[serde(rename = "Period")]
    pub period_seconds: u64,
    /// Original sample series, retained for audit.
    #[serde(rename = "Data")]
    pub raw_samples: Vec<f64>,
}

/// One build's full set of aggregated metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Primary key of the persisted record.
    #[serde(rename = "Hash")]
    pub build_hash: BuildHash,
    /// Optional commit date of the build.
    #[serde(rename = "CommitDate", default, skip_serializing_if = "Option::is_none")]
    pub commit_date: Option<String>,
    /// Whether the build has been tagged as a release.
    #[serde(rename = "IsRelease", default, skip_serializing_if = "is_false")]
    pub is_release: bool,
    /// Aggregated metrics keyed by label, one top-level key each.
    #[serde(flatten)]
    pub metrics: BTreeMap<MetricLabel, AggregatedMetric>,
}

impl MetricRecord {
    /// Creates an empty record for the provided build identity.
    #[must_use]
    pub fn new(identity: &BuildIdentity) -> Self {
        Self {
            build_hash: identity.build_hash.clone(),
            commit_date: identity.commit_date.clone(),
            is_release: false,
            metrics: BTreeMap::new(),
        }
    }

    /// Inserts a metric, replacing any earlier metric with the same label.
    pub fn insert(&mut self, label: MetricLabel, metric: AggregatedMetric) {
        self.metrics.insert(label, metric);
    }

    /// Returns the metric for a label string, if present.
    #[must_use]
    pub fn metric(&self, label: &str) -> Option<&AggregatedMetric> {
        self.metrics.get(label)
    }
}

/// Serde helper for skipping false flags.
#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde skip_serializing_if signature.")]
const fn is_false(value: &bool) -> bool {
    !*value
}
