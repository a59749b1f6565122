// crates/perf-tracker-store-dynamodb/src/lib.rs
// ============================================================================
// Module: Performance Tracker DynamoDB Store
// Description: Durable metric record persistence on DynamoDB.
// Purpose: Table lifecycle, record writes, and the transmit pipeline.
// Dependencies: aws-config, aws-sdk-dynamodb, perf-tracker-core, tokio
// ============================================================================

//! ## Overview
//! This crate persists [`perf_tracker_core::MetricRecord`] values in a table
//! keyed by build hash. [`MetricStoreClient`] applies retry and readiness
//! policy over a [`TableBackend`]; [`DynamoDbBackend`] talks to `DynamoDB`
//! and [`InMemoryTableBackend`] serves tests and offline runs.
//! [`Transmitter`] ties aggregation and persistence together.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backend;
pub mod client;
pub mod codec;
pub mod dynamodb;
pub mod events;
pub mod memory;
pub mod transmitter;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::BackendError;
pub use backend::BackendErrorKind;
pub use backend::CapacityMode;
pub use backend::HASH_KEY_ATTRIBUTE;
pub use backend::Item;
pub use backend::TableBackend;
pub use backend::TableName;
pub use backend::TableSpec;
pub use backend::TableStatus;
pub use client::MetricStoreClient;
pub use client::ReadinessPolicy;
pub use client::RecordId;
pub use client::RetryPolicy;
pub use client::StoreError;
pub use client::StoreSettings;
pub use codec::CodecError;
pub use codec::decode_record;
pub use codec::encode_record;
pub use dynamodb::DynamoDbBackend;
pub use dynamodb::DynamoDbConfig;
pub use events::FileStoreEventSink;
pub use events::NoopStoreEventSink;
pub use events::StderrStoreEventSink;
pub use events::StoreEvent;
pub use events::StoreEventKind;
pub use events::StoreEventSink;
pub use memory::InMemoryTableBackend;
pub use memory::MemoryOperation;
pub use transmitter::TransmitError;
pub use transmitter::Transmitter;
