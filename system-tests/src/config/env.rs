// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed. When no endpoint override is
//! set, the helpers start a `DynamoDB` Local container instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Region used when no override is set.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Table name prefix used when no override is set.
pub const DEFAULT_TABLE_PREFIX: &str = "perf-tracker-system";

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional external `DynamoDB` endpoint (skips the container).
    DynamoDbEndpoint,
    /// Optional region override.
    Region,
    /// Optional table name prefix override.
    TablePrefix,
    /// Optional readiness timeout override in seconds (positive integer).
    TimeoutSeconds,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DynamoDbEndpoint => "PERF_TRACKER_SYSTEM_DYNAMODB_ENDPOINT",
            Self::Region => "PERF_TRACKER_SYSTEM_REGION",
            Self::TablePrefix => "PERF_TRACKER_SYSTEM_TABLE_PREFIX",
            Self::TimeoutSeconds => "PERF_TRACKER_SYSTEM_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTestConfig {
    /// Optional external endpoint override.
    pub dynamodb_endpoint: Option<String>,
    /// Region passed to the store client.
    pub region: String,
    /// Prefix for per-test table names.
    pub table_prefix: String,
    /// Optional readiness timeout override.
    pub timeout: Option<Duration>,
}

impl Default for SystemTestConfig {
    fn default() -> Self {
        Self {
            dynamodb_endpoint: None,
            region: DEFAULT_REGION.to_string(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            timeout: None,
        }
    }
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, a non-http endpoint or zero timeout).
    pub fn load() -> Result<Self, String> {
        let dynamodb_endpoint = read_env_nonempty(SystemTestEnv::DynamoDbEndpoint.as_str())?
            .map(|value| parse_endpoint(SystemTestEnv::DynamoDbEndpoint.as_str(), value))
            .transpose()?;
        let region = read_env_nonempty(SystemTestEnv::Region.as_str())?
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let table_prefix = read_env_nonempty(SystemTestEnv::TablePrefix.as_str())?
            .map(|value| parse_table_prefix(SystemTestEnv::TablePrefix.as_str(), value))
            .transpose()?
            .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            dynamodb_endpoint,
            region,
            table_prefix,
            timeout,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Accepts only http(s) endpoints.
fn parse_endpoint(name: &str, raw: String) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(format!("{name} must be an http or https url"))
    }
}

/// Table prefixes must stay within the table name alphabet.
fn parse_table_prefix(name: &str, raw: String) -> Result<String, String> {
    let valid = raw.len() <= 128
        && raw.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if valid { Ok(raw) } else { Err(format!("{name} must use only [A-Za-z0-9_.-]")) }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
