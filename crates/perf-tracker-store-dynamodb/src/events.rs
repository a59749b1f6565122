// crates/perf-tracker-store-dynamodb/src/events.rs
// ============================================================================
// Module: Store Events
// Description: Structured lifecycle events for metric store operations.
// Purpose: Emit JSON-line logs without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The store client reports table lifecycle transitions, writes, and retries
//! as [`StoreEvent`] values. Sinks serialize each event as one JSON line so
//! CI logs can be grepped or shipped as-is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Store lifecycle event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEventKind {
    /// Table was not found during `ensure_table`.
    TableMissing,
    /// Table creation was requested.
    TableCreateRequested,
    /// Table reached a writable state.
    TableReady,
    /// Record was written.
    RecordWritten,
    /// Transient failure is being retried.
    StoreRetry,
    /// Table was deleted.
    TableDeleted,
    /// Record was tagged as a release.
    ReleaseTagged,
}

/// Store event payload.
#[derive(Debug, Clone, Serialize)]
pub struct StoreEvent {
    /// Event kind.
    pub event: StoreEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Table the event concerns.
    pub table: String,
    /// Build hash when the event concerns a record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_hash: Option<String>,
    /// Attempt number for retries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    /// Operation or failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StoreEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(event: StoreEventKind, table: impl Into<String>) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            table: table.into(),
            build_hash: None,
            attempt: None,
            detail: None,
        }
    }

    /// Attaches a build hash.
    #[must_use]
    pub fn with_build_hash(mut self, build_hash: impl Into<String>) -> Self {
        self.build_hash = Some(build_hash.into());
        self
    }

    /// Attaches a retry attempt number.
    #[must_use]
    pub const fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attaches a detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Store event sink.
pub trait StoreEventSink: Send + Sync {
    /// Records a store event.
    fn record(&self, event: &StoreEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrStoreEventSink;

impl StoreEventSink for StderrStoreEventSink {
    fn record(&self, event: &StoreEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that logs JSON lines to a file.
pub struct FileStoreEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileStoreEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl StoreEventSink for FileStoreEventSink {
    fn record(&self, event: &StoreEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopStoreEventSink;

impl StoreEventSink for NoopStoreEventSink {
    fn record(&self, _event: &StoreEvent) {}
}
