// crates/perf-tracker-core/src/core/identifiers.rs
// ============================================================================
// Module: Performance Tracker Identifiers
// Description: Build hashes, build identities, and metric labels.
// Purpose: Provide strongly typed, validated keys with stable string forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Identifiers in this module become attribute names or key values in the
//! backing store, so they are validated at construction: build hashes are the
//! partition key of a persisted record and metric labels become top-level
//! attribute names next to the reserved record attributes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum build hash length in bytes (`DynamoDB` partition key limit).
pub const MAX_BUILD_HASH_LENGTH: usize = 2048;
/// Maximum metric label length in bytes.
pub const MAX_LABEL_LENGTH: usize = 255;
/// Attribute names owned by the record itself; labels may not reuse them.
pub const RESERVED_ATTRIBUTE_NAMES: &[&str] = &["Hash", "CommitDate", "IsRelease"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier was empty or whitespace.
    #[error("{0} must be non-empty")]
    Empty(&'static str),
    /// Identifier exceeded its length limit.
    #[error("{field} exceeds {max} bytes")]
    TooLong {
        /// Identifier kind.
        field: &'static str,
        /// Maximum allowed length in bytes.
        max: usize,
    },
    /// Label collides with a reserved record attribute.
    #[error("label {0} is reserved for record attributes")]
    Reserved(String),
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Build identifier used as the primary key of a persisted record.
///
/// # Invariants
/// - Non-empty after trimming and at most [`MAX_BUILD_HASH_LENGTH`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildHash(String);

impl BuildHash {
    /// Creates a validated build hash.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the value is empty or too long.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(IdentifierError::Empty("build hash"));
        }
        if value.len() > MAX_BUILD_HASH_LENGTH {
            return Err(IdentifierError::TooLong {
                field: "build hash",
                max: MAX_BUILD_HASH_LENGTH,
            });
        }
        Ok(Self(value))
    }

    /// Returns the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for BuildHash {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BuildHash> for String {
    fn from(value: BuildHash) -> Self {
        value.0
    }
}

/// Human-readable metric label; the key of one metric inside a record.
///
/// # Invariants
/// - Non-empty, at most [`MAX_LABEL_LENGTH`] bytes, not a reserved attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetricLabel(String);

impl MetricLabel {
    /// Creates a validated metric label.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the label is empty, too long, or
    /// reserved.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        if value.is_empty() {
            return Err(IdentifierError::Empty("metric label"));
        }
        if value.len() > MAX_LABEL_LENGTH {
            return Err(IdentifierError::TooLong {
                field: "metric label",
                max: MAX_LABEL_LENGTH,
            });
        }
        if RESERVED_ATTRIBUTE_NAMES.contains(&value.as_str()) {
            return Err(IdentifierError::Reserved(value));
        }
        Ok(Self(value))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Borrow<str> for MetricLabel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MetricLabel {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MetricLabel> for String {
    fn from(value: MetricLabel) -> Self {
        value.0
    }
}

/// Identity of the build a record belongs to, supplied by the invoking
/// environment rather than computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildIdentity {
    /// Source-control commit hash of the build.
    pub build_hash: BuildHash,
    /// Optional commit date as provided by the environment.
    pub commit_date: Option<String>,
}

impl BuildIdentity {
    /// Creates a build identity.
    #[must_use]
    pub const fn new(build_hash: BuildHash, commit_date: Option<String>) -> Self {
        Self {
            build_hash,
            commit_date,
        }
    }
}
