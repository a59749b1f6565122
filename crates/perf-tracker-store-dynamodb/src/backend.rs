// crates/perf-tracker-store-dynamodb/src/backend.rs
// ============================================================================
// Module: Table Backend Interface
// Description: Backend-agnostic table lifecycle and item operations.
// Purpose: Separate store client policy from the wire-level table service.
// Dependencies: aws-sdk-dynamodb (attribute values), serde, thiserror
// ============================================================================

//! ## Overview
//! [`TableBackend`] is the seam between [`crate::MetricStoreClient`] (retry,
//! readiness polling, encoding) and the service that actually holds the table.
//! Backends report failures as [`BackendError`] with a coarse
//! [`BackendErrorKind`] so the client can decide what is tolerated, retried,
//! or propagated. Items use the `DynamoDB` attribute-value representation for
//! every backend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;

use aws_sdk_dynamodb::types::AttributeValue;
use perf_tracker_core::BuildHash;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Partition key attribute for metric tables.
pub const HASH_KEY_ATTRIBUTE: &str = "Hash";
/// Minimum table name length accepted by `DynamoDB`.
const MIN_TABLE_NAME_LENGTH: usize = 3;
/// Maximum table name length accepted by `DynamoDB`.
const MAX_TABLE_NAME_LENGTH: usize = 255;
/// Default provisioned read capacity units.
pub const DEFAULT_READ_CAPACITY_UNITS: i64 = 10;
/// Default provisioned write capacity units.
pub const DEFAULT_WRITE_CAPACITY_UNITS: i64 = 10;

/// Store-native item representation.
pub type Item = HashMap<String, AttributeValue>;

// ============================================================================
// SECTION: Table Types
// ============================================================================

/// Validated `DynamoDB` table name.
///
/// # Invariants
/// - 3 to 255 characters from `[A-Za-z0-9_.-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Creates a validated table name.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] of kind [`BackendErrorKind::Invalid`] when
    /// the name violates `DynamoDB` naming rules.
    pub fn new(value: impl Into<String>) -> Result<Self, BackendError> {
        let value = value.into();
        if value.len() < MIN_TABLE_NAME_LENGTH || value.len() > MAX_TABLE_NAME_LENGTH {
            return Err(BackendError::invalid(format!(
                "table name must be {MIN_TABLE_NAME_LENGTH}..={MAX_TABLE_NAME_LENGTH} characters"
            )));
        }
        if !value.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.')) {
            return Err(BackendError::invalid(format!(
                "table name {value} contains characters outside [A-Za-z0-9_.-]"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the table name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for TableName {
    type Error = BackendError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

/// Table lifecycle status reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    /// Table is being created.
    Creating,
    /// Table accepts reads and writes.
    Active,
    /// Table settings are being updated; reads and writes still succeed.
    Updating,
    /// Table is being deleted.
    Deleting,
    /// Any other backend-specific status.
    Other(String),
}

impl TableStatus {
    /// Returns true when the table accepts item writes.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::Active | Self::Updating)
    }
}

/// Capacity configuration applied when a table is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CapacityMode {
    /// Fixed provisioned throughput.
    Provisioned {
        /// Read capacity units.
        #[serde(default = "default_read_units")]
        read_units: i64,
        /// Write capacity units.
        #[serde(default = "default_write_units")]
        write_units: i64,
    },
    /// Pay-per-request billing.
    OnDemand,
}

impl Default for CapacityMode {
    fn default() -> Self {
        Self::Provisioned {
            read_units: DEFAULT_READ_CAPACITY_UNITS,
            write_units: DEFAULT_WRITE_CAPACITY_UNITS,
        }
    }
}

/// Returns the default read capacity units.
const fn default_read_units() -> i64 {
    DEFAULT_READ_CAPACITY_UNITS
}

/// Returns the default write capacity units.
const fn default_write_units() -> i64 {
    DEFAULT_WRITE_CAPACITY_UNITS
}

/// Everything a backend needs to create a metric table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Table name.
    pub name: TableName,
    /// Capacity configuration.
    pub capacity: CapacityMode,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Coarse classification of backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Table or item does not exist.
    NotFound,
    /// Table already exists or is in a state that blocks the request.
    InUse,
    /// Conditional write precondition failed.
    ConditionFailed,
    /// Throttling, timeout, or network failure; safe to retry.
    Transient,
    /// Request was rejected as invalid before reaching the service.
    Invalid,
    /// Any other failure.
    Other,
}

/// Backend failure with a classification and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    /// Failure classification.
    pub kind: BackendErrorKind,
    /// Human-readable message.
    pub message: String,
}

impl BackendError {
    /// Creates a backend error.
    #[must_use]
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a [`BackendErrorKind::NotFound`] error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    /// Creates a [`BackendErrorKind::InUse`] error.
    #[must_use]
    pub fn in_use(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::InUse, message)
    }

    /// Creates a [`BackendErrorKind::Transient`] error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Transient, message)
    }

    /// Creates a [`BackendErrorKind::Invalid`] error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Invalid, message)
    }

    /// Creates a [`BackendErrorKind::Other`] error.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }

    /// Returns true when the failure is worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == BackendErrorKind::Transient
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Blocking table service used by the metric store client.
pub trait TableBackend: Send + Sync {
    /// Returns the status of a table.
    ///
    /// # Errors
    ///
    /// Returns [`BackendErrorKind::NotFound`] when the table does not exist.
    fn describe_table(&self, table: &TableName) -> Result<TableStatus, BackendError>;

    /// Requests creation of a table keyed by [`HASH_KEY_ATTRIBUTE`].
    ///
    /// Creation may complete asynchronously; callers poll
    /// [`TableBackend::describe_table`] until the table is active.
    ///
    /// # Errors
    ///
    /// Returns [`BackendErrorKind::InUse`] when the table already exists.
    fn create_table(&self, spec: &TableSpec) -> Result<(), BackendError>;

    /// Deletes a table.
    ///
    /// # Errors
    ///
    /// Returns [`BackendErrorKind::NotFound`] when the table does not exist.
    fn delete_table(&self, table: &TableName) -> Result<(), BackendError>;

    /// Writes an item, replacing any item with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the write fails.
    fn put_item(&self, table: &TableName, item: Item) -> Result<(), BackendError>;

    /// Reads an item by build hash with strong consistency.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the read fails.
    fn get_item(&self, table: &TableName, key: &BuildHash) -> Result<Option<Item>, BackendError>;

    /// Sets a boolean attribute on an existing item.
    ///
    /// # Errors
    ///
    /// Returns [`BackendErrorKind::ConditionFailed`] when no item exists for
    /// the key.
    fn set_flag(
        &self,
        table: &TableName,
        key: &BuildHash,
        attribute: &str,
        value: bool,
    ) -> Result<(), BackendError>;
}
