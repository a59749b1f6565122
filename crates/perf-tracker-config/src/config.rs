// crates/perf-tracker-config/src/config.rs
// ============================================================================
// Module: Performance Tracker Configuration
// Description: Configuration loading and validation for perf-tracker.
// Purpose: Provide strict, fail-closed config parsing with limits.
// Dependencies: perf-tracker-core, perf-tracker-store-dynamodb, serde, toml
// ============================================================================

//! ## Overview
//! This module loads `perf-tracker.toml` and validates it before any store
//! call is made. The path comes from the caller, then `PERF_TRACKER_CONFIG`,
//! then the working directory. Only a missing default file falls back to
//! built-in defaults; an explicitly named file must exist.
//!
//! Build identity (hash and commit date) is read from environment variables
//! whose names are configurable, so CI systems can map their own variables.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use perf_tracker_core::AggregationSettings;
use perf_tracker_core::BuildHash;
use perf_tracker_core::BuildIdentity;
use perf_tracker_core::DEFAULT_WINDOW_SECONDS;
use perf_tracker_core::MAX_METRICS_PER_DOCUMENT;
use perf_tracker_core::MAX_SAMPLES_PER_METRIC;
use perf_tracker_core::SpreadFormula;
use perf_tracker_store_dynamodb::CapacityMode;
use perf_tracker_store_dynamodb::DynamoDbConfig;
use perf_tracker_store_dynamodb::FileStoreEventSink;
use perf_tracker_store_dynamodb::NoopStoreEventSink;
use perf_tracker_store_dynamodb::ReadinessPolicy;
use perf_tracker_store_dynamodb::RetryPolicy;
use perf_tracker_store_dynamodb::StderrStoreEventSink;
use perf_tracker_store_dynamodb::StoreEventSink;
use perf_tracker_store_dynamodb::StoreSettings;
use perf_tracker_store_dynamodb::TableName;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config file name.
const DEFAULT_CONFIG_NAME: &str = "perf-tracker.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "PERF_TRACKER_CONFIG";
/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default metric table name.
pub const DEFAULT_TABLE_NAME: &str = "CWAPerformanceMetrics";
/// Default environment variable holding the build hash.
pub const DEFAULT_HASH_ENV: &str = "SHA";
/// Default environment variable holding the commit date.
pub const DEFAULT_COMMIT_DATE_ENV: &str = "SHA_DATE";
/// Maximum region name length.
const MAX_REGION_LENGTH: usize = 64;
/// Maximum endpoint URL length.
const MAX_ENDPOINT_LENGTH: usize = 2048;
/// Maximum provisioned capacity units per direction.
pub(crate) const MAX_CAPACITY_UNITS: i64 = 40_000;
/// Maximum attempts per store call.
pub(crate) const MAX_RETRY_ATTEMPTS: u32 = 20;
/// Maximum single retry delay in milliseconds.
pub(crate) const MAX_RETRY_DELAY_MS: u64 = 60_000;
/// Maximum readiness poll interval in milliseconds.
pub(crate) const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Maximum readiness polls.
pub(crate) const MAX_READINESS_POLLS: u32 = 1_000;
/// Maximum collection window in seconds.
pub(crate) const MAX_WINDOW_SECONDS: u64 = 86_400;
/// Maximum environment variable name length.
const MAX_ENV_NAME_LENGTH: usize = 128;
/// Default attempts per store call.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default base retry delay in milliseconds.
const DEFAULT_BASE_DELAY_MS: u64 = 100;
/// Default max retry delay in milliseconds.
const DEFAULT_MAX_DELAY_MS: u64 = 5_000;
/// Default readiness poll interval in milliseconds.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
/// Default readiness polls.
const DEFAULT_MAX_POLLS: u32 = 60;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Performance tracker configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerfTrackerConfig {
    /// Metric store settings.
    pub store: StoreConfig,
    /// Aggregation settings.
    pub aggregation: AggregationConfig,
    /// Build identity settings.
    pub build: BuildConfig,
    /// Event logging settings.
    pub logging: LoggingConfig,
}

impl PerfTrackerConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => {
                return Err(ConfigError::Io(format!("{}: {err}", resolved.display())));
            }
        };
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.aggregation.validate()?;
        self.build.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Store Config
// ============================================================================

/// Metric store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Target table name.
    pub table_name: String,
    /// AWS region override.
    pub region: Option<String>,
    /// Endpoint override (e.g. `DynamoDB` Local).
    pub endpoint: Option<String>,
    /// Capacity applied when the table is created.
    pub capacity: CapacityMode,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
    /// Readiness polling after table creation.
    pub readiness: ReadinessConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            region: None,
            endpoint: None,
            capacity: CapacityMode::default(),
            retry: RetryConfig::default(),
            readiness: ReadinessConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the validated table name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the name is not a valid table name.
    pub fn table(&self) -> Result<TableName, ConfigError> {
        TableName::new(self.table_name.clone())
            .map_err(|err| ConfigError::Invalid(format!("store.table_name: {err}")))
    }

    /// Returns the connection settings for the `DynamoDB` backend.
    #[must_use]
    pub fn dynamodb(&self) -> DynamoDbConfig {
        DynamoDbConfig {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        }
    }

    /// Returns the store client settings.
    #[must_use]
    pub const fn settings(&self) -> StoreSettings {
        StoreSettings {
            capacity: self.capacity,
            retry: self.retry.policy(),
            readiness: self.readiness.policy(),
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.table()?;
        if let Some(region) = &self.region {
            if region.trim().is_empty() {
                return Err(ConfigError::Invalid("store.region must be non-empty".to_string()));
            }
            if region.len() > MAX_REGION_LENGTH {
                return Err(ConfigError::Invalid("store.region exceeds max length".to_string()));
            }
        }
        if let Some(endpoint) = &self.endpoint {
            if endpoint.len() > MAX_ENDPOINT_LENGTH {
                return Err(ConfigError::Invalid("store.endpoint exceeds max length".to_string()));
            }
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigError::Invalid(
                    "store.endpoint must be an http or https url".to_string(),
                ));
            }
        }
        if let CapacityMode::Provisioned {
            read_units,
            write_units,
        } = self.capacity
        {
            for (field, units) in [("read_units", read_units), ("write_units", write_units)] {
                if !(1 ..= MAX_CAPACITY_UNITS).contains(&units) {
                    return Err(ConfigError::Invalid(format!(
                        "store.capacity.{field} must be between 1 and {MAX_CAPACITY_UNITS}"
                    )));
                }
            }
        }
        self.retry.validate()?;
        self.readiness.validate()?;
        Ok(())
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Attempts per store call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound for a single retry delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryConfig {
    /// Converts to the store retry policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    /// Validates retry bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_RETRY_ATTEMPTS).contains(&self.max_attempts) {
            return Err(ConfigError::Invalid(format!(
                "store.retry.max_attempts must be between 1 and {MAX_RETRY_ATTEMPTS}"
            )));
        }
        if self.max_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "store.retry.max_delay_ms must be at most {MAX_RETRY_DELAY_MS}"
            )));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::Invalid(
                "store.retry.base_delay_ms must not exceed max_delay_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Readiness polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessConfig {
    /// Interval between polls in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of polls.
    pub max_polls: u32,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl ReadinessConfig {
    /// Converts to the store readiness policy.
    #[must_use]
    pub const fn policy(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_polls: self.max_polls,
        }
    }

    /// Validates polling bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "store.readiness.poll_interval_ms must be at most {MAX_POLL_INTERVAL_MS}"
            )));
        }
        if !(1 ..= MAX_READINESS_POLLS).contains(&self.max_polls) {
            return Err(ConfigError::Invalid(format!(
                "store.readiness.max_polls must be between 1 and {MAX_READINESS_POLLS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Aggregation Config
// ============================================================================

/// Aggregation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationConfig {
    /// Collection window in seconds.
    pub window_seconds: u64,
    /// Dispersion formula for `StandardDev`.
    pub spread: SpreadFormula,
    /// Maximum samples per metric.
    pub max_samples_per_metric: usize,
    /// Maximum metrics per document.
    pub max_metrics: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW_SECONDS,
            spread: SpreadFormula::default(),
            max_samples_per_metric: MAX_SAMPLES_PER_METRIC,
            max_metrics: MAX_METRICS_PER_DOCUMENT,
        }
    }
}

impl AggregationConfig {
    /// Converts to aggregator settings.
    #[must_use]
    pub const fn settings(&self) -> AggregationSettings {
        AggregationSettings {
            window_seconds: self.window_seconds,
            spread: self.spread,
            max_samples_per_metric: self.max_samples_per_metric,
            max_metrics: self.max_metrics,
        }
    }

    /// Validates aggregation bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_WINDOW_SECONDS).contains(&self.window_seconds) {
            return Err(ConfigError::Invalid(format!(
                "aggregation.window_seconds must be between 1 and {MAX_WINDOW_SECONDS}"
            )));
        }
        if !(1 ..= MAX_SAMPLES_PER_METRIC).contains(&self.max_samples_per_metric) {
            return Err(ConfigError::Invalid(format!(
                "aggregation.max_samples_per_metric must be between 1 and {MAX_SAMPLES_PER_METRIC}"
            )));
        }
        if !(1 ..= MAX_METRICS_PER_DOCUMENT).contains(&self.max_metrics) {
            return Err(ConfigError::Invalid(format!(
                "aggregation.max_metrics must be between 1 and {MAX_METRICS_PER_DOCUMENT}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Build Identity Config
// ============================================================================

/// Environment variables that carry the build identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Variable holding the build hash.
    pub hash_env: String,
    /// Variable holding the commit date.
    pub commit_date_env: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            hash_env: DEFAULT_HASH_ENV.to_string(),
            commit_date_env: DEFAULT_COMMIT_DATE_ENV.to_string(),
        }
    }
}

impl BuildConfig {
    /// Resolves the build identity from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the hash variable is unset or
    /// holds an invalid hash.
    pub fn resolve_identity(&self) -> Result<BuildIdentity, ConfigError> {
        self.identity_from(|name| env::var(name).ok())
    }

    /// Resolves the build identity through an arbitrary variable lookup.
    ///
    /// An empty commit date is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the hash variable is unset or
    /// holds an invalid hash.
    pub fn identity_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<BuildIdentity, ConfigError> {
        let hash = lookup(&self.hash_env).ok_or_else(|| {
            ConfigError::Invalid(format!("build hash variable {} is not set", self.hash_env))
        })?;
        let build_hash = BuildHash::new(hash)
            .map_err(|err| ConfigError::Invalid(format!("{}: {err}", self.hash_env)))?;
        let commit_date = lookup(&self.commit_date_env).filter(|value| !value.trim().is_empty());
        Ok(BuildIdentity::new(build_hash, commit_date))
    }

    /// Validates variable names.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_env_name("build.hash_env", &self.hash_env)?;
        validate_env_name("build.commit_date_env", &self.commit_date_env)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging Config
// ============================================================================

/// Store event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    #[serde(rename = "none")]
    Discard,
}

/// Store event logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Sink kind.
    pub sink: LogSinkKind,
    /// File path for the `file` sink.
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Builds the configured event sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the log file cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn StoreEventSink>, ConfigError> {
        match self.sink {
            LogSinkKind::Stderr => Ok(Arc::new(StderrStoreEventSink)),
            LogSinkKind::Discard => Ok(Arc::new(NoopStoreEventSink)),
            LogSinkKind::File => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("logging.path is required for file sink".to_string())
                })?;
                let sink = FileStoreEventSink::new(Path::new(path))
                    .map_err(|err| ConfigError::Io(format!("{path}: {err}")))?;
                Ok(Arc::new(sink))
            }
        }
    }

    /// Validates sink settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, Some(path)) => validate_path_string("logging.path", path),
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.path is required for file sink".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("logging.path is only valid for file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag is true when the path was named
/// explicitly rather than defaulted.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an environment variable name.
fn validate_env_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_ENV_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if !value.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(ConfigError::Invalid(format!(
            "{field} must contain only ASCII letters, digits, and underscores"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn explicit_path_flag_tracks_origin() {
        let (path, explicit) = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("custom.toml"));
        assert!(explicit);
    }

    #[test]
    fn long_path_component_is_rejected() {
        let component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_path(Path::new(&component)).unwrap_err();
        assert!(err.to_string().contains("component too long"));
    }

    #[test]
    fn env_names_are_restricted() {
        assert!(validate_env_name("build.hash_env", "GITHUB_SHA").is_ok());
        assert!(validate_env_name("build.hash_env", "").is_err());
        assert!(validate_env_name("build.hash_env", "SHA=1").is_err());
    }
}
