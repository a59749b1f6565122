// crates/perf-tracker-core/src/runtime/mod.rs
// ============================================================================
// Module: Performance Tracker Runtime
// Description: Aggregation runtime and statistics helpers.
// Purpose: Group the logic that turns collector documents into records.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Runtime modules hold the aggregation pipeline and the pure statistics
//! functions it is built on.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregator;
pub mod stats;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregator::AggregateError;
pub use aggregator::AggregationSettings;
pub use aggregator::Aggregator;
pub use aggregator::DEFAULT_WINDOW_SECONDS;
pub use aggregator::MAX_DOCUMENT_BYTES;
pub use aggregator::MAX_METRICS_PER_DOCUMENT;
pub use aggregator::MAX_SAMPLES_PER_METRIC;
pub use aggregator::SpreadFormula;
pub use stats::StatsError;
