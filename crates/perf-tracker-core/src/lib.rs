// crates/perf-tracker-core/src/lib.rs
// ============================================================================
// Module: Performance Tracker Core Library
// Description: Public API surface for metric aggregation.
// Purpose: Expose collector document types, records, and the aggregator.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Performance Tracker core reduces raw collector documents (per-metric label,
//! timestamps, and numeric samples) into per-build [`MetricRecord`] values.
//! It has no knowledge of the backing store; persistence lives in
//! `perf-tracker-store-dynamodb`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use runtime::AggregateError;
pub use runtime::AggregationSettings;
pub use runtime::Aggregator;
pub use runtime::DEFAULT_WINDOW_SECONDS;
pub use runtime::MAX_DOCUMENT_BYTES;
pub use runtime::MAX_METRICS_PER_DOCUMENT;
pub use runtime::MAX_SAMPLES_PER_METRIC;
pub use runtime::SpreadFormula;
pub use runtime::StatsError;
pub use runtime::stats;
