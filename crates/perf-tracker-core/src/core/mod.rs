// crates/perf-tracker-core/src/core/mod.rs
// ============================================================================
// Module: Performance Tracker Core Types
// Description: Collector documents, build identifiers, and metric records.
// Purpose: Provide stable, serializable types shared by the pipeline crates.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe what flows through the pipeline: the raw collector
//! document on the way in and the label-keyed [`MetricRecord`] on the way out.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod document;
pub mod identifiers;
pub mod record;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::CollectorDocument;
pub use document::RawMetricSample;
pub use identifiers::BuildHash;
pub use identifiers::BuildIdentity;
pub use identifiers::IdentifierError;
pub use identifiers::MAX_BUILD_HASH_LENGTH;
pub use identifiers::MAX_LABEL_LENGTH;
pub use identifiers::MetricLabel;
pub use identifiers::RESERVED_ATTRIBUTE_NAMES;
pub use record::AggregatedMetric;
pub use record::MetricRecord;
