// crates/perf-tracker-store-dynamodb/src/client.rs
// ============================================================================
// Module: Metric Store Client
// Description: Table lifecycle and record persistence over a table backend.
// Purpose: Apply retry, readiness, and encoding policy to store operations.
// Dependencies: perf-tracker-core, thiserror
// ============================================================================

//! ## Overview
//! [`MetricStoreClient`] is an explicitly constructed, blocking client over a
//! [`TableBackend`]. It owns the policy the backend does not: transient
//! failures are retried with bounded exponential backoff, table creation
//! tolerates a concurrent creator and polls until the table is active, and
//! records go through the explicit attribute codec.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use perf_tracker_core::BuildHash;
use perf_tracker_core::MetricRecord;
use thiserror::Error;

use crate::backend::BackendError;
use crate::backend::BackendErrorKind;
use crate::backend::CapacityMode;
use crate::backend::TableBackend;
use crate::backend::TableName;
use crate::backend::TableSpec;
use crate::backend::TableStatus;
use crate::codec::IS_RELEASE_ATTRIBUTE;
use crate::codec::decode_record;
use crate::codec::encode_record;
use crate::events::NoopStoreEventSink;
use crate::events::StoreEvent;
use crate::events::StoreEventKind;
use crate::events::StoreEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default attempts per backend call, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
/// Default upper bound for a single retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);
/// Default interval between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default number of readiness polls.
pub const DEFAULT_MAX_POLLS: u32 = 60;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Retry policy for transient backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Returns the delay after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1_u32 << exponent).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Bounded polling used while waiting for a table to become active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Interval between polls.
    pub poll_interval: Duration,
    /// Maximum number of polls.
    pub max_polls: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

/// Store client settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreSettings {
    /// Capacity applied to newly created tables.
    pub capacity: CapacityMode,
    /// Retry policy.
    pub retry: RetryPolicy,
    /// Readiness polling policy.
    pub readiness: ReadinessPolicy,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Metric store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Table or record does not exist.
    #[error("store not found: {0}")]
    NotFound(String),
    /// Table did not become active within the polling bound.
    #[error("table {table} not active after {polls} polls")]
    NotReady {
        /// Table name.
        table: String,
        /// Polls performed.
        polls: u32,
    },
    /// Table exists but cannot accept requests (being deleted).
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Record could not be encoded.
    #[error("record encode error: {0}")]
    Encode(String),
    /// Stored item could not be decoded.
    #[error("record decode error: {0}")]
    Decode(String),
    /// Request was invalid.
    #[error("store invalid: {0}")]
    Invalid(String),
    /// Transient failures exhausted the retry budget.
    #[error("store transient failure after retries: {0}")]
    Transient(String),
    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true for [`StoreError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<BackendError> for StoreError {
    fn from(error: BackendError) -> Self {
        match error.kind {
            BackendErrorKind::NotFound => Self::NotFound(error.message),
            BackendErrorKind::Transient => Self::Transient(error.message),
            BackendErrorKind::Invalid => Self::Invalid(error.message),
            BackendErrorKind::InUse
            | BackendErrorKind::ConditionFailed
            | BackendErrorKind::Other => Self::Backend(error.message),
        }
    }
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Location of a written record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId {
    /// Table holding the record.
    pub table: TableName,
    /// Record key.
    pub build_hash: BuildHash,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking metric store client.
pub struct MetricStoreClient<B: TableBackend> {
    /// Table backend.
    backend: B,
    /// Client settings.
    settings: StoreSettings,
    /// Event sink for lifecycle logging.
    events: Arc<dyn StoreEventSink>,
}

impl<B: TableBackend> MetricStoreClient<B> {
    /// Creates a client that discards lifecycle events.
    #[must_use]
    pub fn new(backend: B, settings: StoreSettings) -> Self {
        Self {
            backend,
            settings,
            events: Arc::new(NoopStoreEventSink),
        }
    }

    /// Replaces the lifecycle event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn StoreEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the underlying backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the client settings.
    #[must_use]
    pub const fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Ensures the table exists and is active, creating it when absent.
    ///
    /// A concurrent creator winning the race counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the table is being deleted,
    /// [`StoreError::NotReady`] when it does not become active within the
    /// polling bound, or the mapped backend failure.
    pub fn ensure_table(&self, table: &TableName) -> Result<(), StoreError> {
        match self.with_retry(table, "describe_table", || self.backend.describe_table(table)) {
            Ok(TableStatus::Deleting) => {
                return Err(StoreError::Unavailable(format!("table {table} is being deleted")));
            }
            Ok(_) => {}
            Err(err) if err.kind == BackendErrorKind::NotFound => {
                self.emit(StoreEvent::new(StoreEventKind::TableMissing, table.as_str()));
                self.create(table)?;
            }
            Err(err) => return Err(err.into()),
        }
        self.wait_until_active(table)
    }

    /// Returns true when the table exists in any state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for failures other than "not found".
    pub fn table_exists(&self, table: &TableName) -> Result<bool, StoreError> {
        match self.with_retry(table, "describe_table", || self.backend.describe_table(table)) {
            Ok(_) => Ok(true),
            Err(err) if err.kind == BackendErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes a record, replacing any record with the same build hash.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] when the record holds numbers the store
    /// cannot represent, or the mapped backend failure.
    pub fn put_record(
        &self,
        table: &TableName,
        record: &MetricRecord,
    ) -> Result<RecordId, StoreError> {
        let item = encode_record(record).map_err(|err| StoreError::Encode(err.to_string()))?;
        self.with_retry(table, "put_item", || self.backend.put_item(table, item.clone()))?;
        self.emit(
            StoreEvent::new(StoreEventKind::RecordWritten, table.as_str())
                .with_build_hash(record.build_hash.as_str())
                .with_detail(format!("{} metrics", record.metrics.len())),
        );
        Ok(RecordId {
            table: table.clone(),
            build_hash: record.build_hash.clone(),
        })
    }

    /// Reads back the record stored for a build hash.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] when the stored item is malformed, or
    /// the mapped backend failure.
    pub fn get_record(
        &self,
        table: &TableName,
        build_hash: &BuildHash,
    ) -> Result<Option<MetricRecord>, StoreError> {
        let item =
            self.with_retry(table, "get_item", || self.backend.get_item(table, build_hash))?;
        item.map(|item| decode_record(&item).map_err(|err| StoreError::Decode(err.to_string())))
            .transpose()
    }

    /// Deletes a table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the table does not exist.
    pub fn delete_table(&self, table: &TableName) -> Result<(), StoreError> {
        self.with_retry(table, "delete_table", || self.backend.delete_table(table))?;
        self.emit(StoreEvent::new(StoreEventKind::TableDeleted, table.as_str()));
        Ok(())
    }

    /// Deletes a table if it exists; returns whether anything was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for failures other than "not found".
    pub fn delete_table_if_exists(&self, table: &TableName) -> Result<bool, StoreError> {
        match self.delete_table(table) {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Marks an existing record as a release build.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the table or the record does
    /// not exist.
    pub fn tag_release(&self, table: &TableName, build_hash: &BuildHash) -> Result<(), StoreError> {
        let result = self.with_retry(table, "set_flag", || {
            self.backend.set_flag(table, build_hash, IS_RELEASE_ATTRIBUTE, true)
        });
        match result {
            Ok(()) => {}
            Err(err) if err.kind == BackendErrorKind::ConditionFailed => {
                return Err(StoreError::NotFound(format!(
                    "no record for build {build_hash} in table {table}"
                )));
            }
            Err(err) => return Err(err.into()),
        }
        self.emit(
            StoreEvent::new(StoreEventKind::ReleaseTagged, table.as_str())
                .with_build_hash(build_hash.as_str()),
        );
        Ok(())
    }

    /// Requests table creation, tolerating a concurrent creator.
    fn create(&self, table: &TableName) -> Result<(), StoreError> {
        let spec = TableSpec {
            name: table.clone(),
            capacity: self.settings.capacity,
        };
        match self.with_retry(table, "create_table", || self.backend.create_table(&spec)) {
            Ok(()) => {
                self.emit(StoreEvent::new(StoreEventKind::TableCreateRequested, table.as_str()));
                Ok(())
            }
            Err(err) if err.kind == BackendErrorKind::InUse => {
                self.emit(
                    StoreEvent::new(StoreEventKind::TableCreateRequested, table.as_str())
                        .with_detail("created concurrently"),
                );
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Polls the table status until it is writable or the bound is reached.
    fn wait_until_active(&self, table: &TableName) -> Result<(), StoreError> {
        let readiness = self.settings.readiness;
        let max_polls = readiness.max_polls.max(1);
        for poll in 1 ..= max_polls {
            match self.with_retry(table, "describe_table", || self.backend.describe_table(table)) {
                Ok(status) if status.is_writable() => {
                    self.emit(StoreEvent::new(StoreEventKind::TableReady, table.as_str()));
                    return Ok(());
                }
                Ok(TableStatus::Deleting) => {
                    return Err(StoreError::Unavailable(format!(
                        "table {table} is being deleted"
                    )));
                }
                // Newly created tables may briefly describe as missing.
                Ok(_) => {}
                Err(err) if err.kind == BackendErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            if poll < max_polls {
                thread::sleep(readiness.poll_interval);
            }
        }
        Err(StoreError::NotReady {
            table: table.to_string(),
            polls: max_polls,
        })
    }

    /// Runs a backend call, retrying transient failures per the policy.
    fn with_retry<T>(
        &self,
        table: &TableName,
        operation: &str,
        mut call: impl FnMut() -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let retry = self.settings.retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    self.emit(
                        StoreEvent::new(StoreEventKind::StoreRetry, table.as_str())
                            .with_attempt(attempt)
                            .with_detail(format!("{operation}: {err}")),
                    );
                    thread::sleep(retry.delay_after(attempt));
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Forwards an event to the sink.
    fn emit(&self, event: StoreEvent) {
        self.events.record(&event);
    }
}
