// crates/perf-tracker-core/src/core/document.rs
// ============================================================================
// Module: Collector Document
// Description: Raw per-metric sample series supplied by the data collector.
// Purpose: Deserialize the collector's JSON document without interpretation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The collector document is a JSON array of per-metric entries. Field names
//! are `PascalCase` on the wire. `Id`, `Messages` and `StatusCode` are carried
//! through untouched and default to empty strings; `Label`, `Timestamps` and
//! `Values` are required. Validation of the series happens in the aggregator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One metric's time-stamped value series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricSample {
    /// Collector-assigned identifier.
    #[serde(rename = "Id", default)]
    pub id: String,
    /// Human-readable metric label; becomes the record key.
    #[serde(rename = "Label")]
    pub label: String,
    /// Collector status message.
    #[serde(rename = "Messages", default)]
    pub messages: String,
    /// Collector status code.
    #[serde(rename = "StatusCode", default)]
    pub status_code: String,
    /// Ordered sample timestamps, parallel to `values`.
    #[serde(rename = "Timestamps")]
    pub timestamps: Vec<String>,
    /// Ordered sample values, parallel to `timestamps`.
    #[serde(rename = "Values")]
    pub values: Vec<f64>,
}

/// Full collector document: an ordered list of raw metric samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectorDocument(pub Vec<RawMetricSample>);

impl CollectorDocument {
    /// Returns the samples in document order.
    #[must_use]
    pub fn samples(&self) -> &[RawMetricSample] {
        &self.0
    }

    /// Returns the number of metric entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
