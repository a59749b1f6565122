// crates/perf-tracker-store-dynamodb/src/transmitter.rs
// ============================================================================
// Module: Metric Transmitter
// Description: One-way pipeline from collector document to stored record.
// Purpose: Bind an aggregator, a store client, and a target table.
// Dependencies: perf-tracker-core, thiserror
// ============================================================================

//! ## Overview
//! [`Transmitter`] runs `document -> aggregate -> ensure_table -> put_record`
//! for one table. Aggregation failures abort before anything is written.

// ============================================================================
// SECTION: Imports
// ============================================================================

use perf_tracker_core::AggregateError;
use perf_tracker_core::Aggregator;
use perf_tracker_core::BuildHash;
use perf_tracker_core::BuildIdentity;
use perf_tracker_core::MetricRecord;
use thiserror::Error;

use crate::backend::TableBackend;
use crate::backend::TableName;
use crate::client::MetricStoreClient;
use crate::client::RecordId;
use crate::client::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Transmission errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransmitError {
    /// Document could not be aggregated.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Transmitter
// ============================================================================

/// Sends aggregated metric records to one table.
pub struct Transmitter<B: TableBackend> {
    /// Document aggregator.
    aggregator: Aggregator,
    /// Store client.
    client: MetricStoreClient<B>,
    /// Target table.
    table: TableName,
}

impl<B: TableBackend> Transmitter<B> {
    /// Creates a transmitter for the given table.
    #[must_use]
    pub const fn new(
        aggregator: Aggregator,
        client: MetricStoreClient<B>,
        table: TableName,
    ) -> Self {
        Self {
            aggregator,
            client,
            table,
        }
    }

    /// Returns the target table.
    #[must_use]
    pub const fn table(&self) -> &TableName {
        &self.table
    }

    /// Returns the store client.
    #[must_use]
    pub const fn client(&self) -> &MetricStoreClient<B> {
        &self.client
    }

    /// Ensures the target table exists and is active.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::Store`] when the table cannot be made ready.
    pub fn initialize(&self) -> Result<(), TransmitError> {
        self.client.ensure_table(&self.table)?;
        Ok(())
    }

    /// Aggregates a raw collector document and stores the resulting record.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::Aggregate`] for unusable documents (nothing is
    /// written) and [`TransmitError::Store`] for store failures.
    pub fn send_document(
        &self,
        bytes: &[u8],
        identity: &BuildIdentity,
    ) -> Result<RecordId, TransmitError> {
        let record = self.aggregator.aggregate_bytes(bytes, identity)?;
        self.send_record(&record)
    }

    /// Stores an already aggregated record.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::Store`] when the table cannot be made ready or
    /// the write fails.
    pub fn send_record(&self, record: &MetricRecord) -> Result<RecordId, TransmitError> {
        self.initialize()?;
        Ok(self.client.put_record(&self.table, record)?)
    }

    /// Marks the record of a build as a release.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::Store`] when no record exists for the build.
    pub fn tag_release(&self, build_hash: &BuildHash) -> Result<(), TransmitError> {
        Ok(self.client.tag_release(&self.table, build_hash)?)
    }

    /// Deletes the target table if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError::Store`] for failures other than absence.
    pub fn remove_table(&self) -> Result<bool, TransmitError> {
        Ok(self.client.delete_table_if_exists(&self.table)?)
    }
}
