// crates/perf-tracker-store-dynamodb/src/memory.rs
// ============================================================================
// Module: In-Memory Table Backend
// Description: Process-local table backend with scripted failures.
// Purpose: Exercise store client policy offline and in tests.
// Dependencies: perf-tracker-core
// ============================================================================

//! ## Overview
//! [`InMemoryTableBackend`] mimics the table lifecycle of the real service:
//! new tables report `Creating` for a configurable number of describe calls
//! before turning `Active`, writes to a missing table fail with `NotFound`,
//! and conditional updates fail when the item is absent. Failures can be
//! queued per operation to drive retry and race handling.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;

use aws_sdk_dynamodb::types::AttributeValue;
use perf_tracker_core::BuildHash;

use crate::backend::BackendError;
use crate::backend::BackendErrorKind;
use crate::backend::HASH_KEY_ATTRIBUTE;
use crate::backend::Item;
use crate::backend::TableBackend;
use crate::backend::TableName;
use crate::backend::TableSpec;
use crate::backend::TableStatus;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Backend operation selector for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemoryOperation {
    /// `describe_table`.
    Describe,
    /// `create_table`.
    Create,
    /// `delete_table`.
    Delete,
    /// `put_item`.
    Put,
    /// `get_item`.
    Get,
    /// `set_flag`.
    SetFlag,
}

/// One simulated table.
#[derive(Debug, Clone)]
struct MemoryTable {
    /// Creation spec.
    spec: TableSpec,
    /// Describe calls left before the table turns active.
    pending_polls: u32,
    /// Table is being deleted.
    deleting: bool,
    /// Items keyed by build hash.
    items: HashMap<String, Item>,
}

impl MemoryTable {
    /// Returns the current status without advancing it.
    fn status(&self) -> TableStatus {
        if self.deleting {
            TableStatus::Deleting
        } else if self.pending_polls > 0 {
            TableStatus::Creating
        } else {
            TableStatus::Active
        }
    }
}

/// Mutable backend state.
#[derive(Debug, Default)]
struct MemoryState {
    /// Tables by name.
    tables: BTreeMap<TableName, MemoryTable>,
    /// Queued failures per operation.
    failures: BTreeMap<MemoryOperation, VecDeque<BackendError>>,
    /// Call counters per operation.
    calls: BTreeMap<MemoryOperation, u32>,
}

/// Process-local [`TableBackend`].
#[derive(Debug, Default)]
pub struct InMemoryTableBackend {
    /// Describe calls a newly created table spends in `Creating`.
    activation_polls: u32,
    /// Shared state.
    state: Mutex<MemoryState>,
}

impl InMemoryTableBackend {
    /// Creates an empty backend whose tables become active immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend whose new tables report `Creating` for the
    /// given number of describe calls.
    #[must_use]
    pub fn with_activation_polls(activation_polls: u32) -> Self {
        Self {
            activation_polls,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Queues a failure returned by the next call of `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the state lock is poisoned.
    pub fn inject_failure(
        &self,
        operation: MemoryOperation,
        error: BackendError,
    ) -> Result<(), BackendError> {
        self.lock()?.failures.entry(operation).or_default().push_back(error);
        Ok(())
    }

    /// Marks an existing table as being deleted.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the table does not exist.
    pub fn mark_deleting(&self, table: &TableName) -> Result<(), BackendError> {
        let mut state = self.lock()?;
        let entry = state.tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        entry.deleting = true;
        Ok(())
    }

    /// Returns how many times `operation` was invoked.
    #[must_use]
    pub fn calls(&self, operation: MemoryOperation) -> u32 {
        self.state
            .lock()
            .map(|state| state.calls.get(&operation).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Returns the creation spec of a table, if it exists.
    #[must_use]
    pub fn table_spec(&self, table: &TableName) -> Option<TableSpec> {
        self.state.lock().ok()?.tables.get(table).map(|entry| entry.spec.clone())
    }

    /// Returns the number of items stored in a table.
    #[must_use]
    pub fn item_count(&self, table: &TableName) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.tables.get(table).map(|entry| entry.items.len()))
            .unwrap_or_default()
    }

    /// Locks the state.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, BackendError> {
        self.state.lock().map_err(|_| BackendError::other("table state lock poisoned"))
    }

    /// Locks the state, counts the call, and pops any queued failure.
    fn begin(
        &self,
        operation: MemoryOperation,
    ) -> Result<MutexGuard<'_, MemoryState>, BackendError> {
        let mut state = self.lock()?;
        *state.calls.entry(operation).or_default() += 1;
        if let Some(error) = state.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        Ok(state)
    }
}

// ============================================================================
// SECTION: TableBackend
// ============================================================================

impl TableBackend for InMemoryTableBackend {
    fn describe_table(&self, table: &TableName) -> Result<TableStatus, BackendError> {
        let mut state = self.begin(MemoryOperation::Describe)?;
        let entry = state.tables.get_mut(table).ok_or_else(|| missing_table(table))?;
        let status = entry.status();
        if status == TableStatus::Creating {
            entry.pending_polls = entry.pending_polls.saturating_sub(1);
        }
        Ok(status)
    }

    fn create_table(&self, spec: &TableSpec) -> Result<(), BackendError> {
        let mut state = self.begin(MemoryOperation::Create)?;
        if state.tables.contains_key(&spec.name) {
            return Err(BackendError::in_use(format!("table already exists: {}", spec.name)));
        }
        state.tables.insert(
            spec.name.clone(),
            MemoryTable {
                spec: spec.clone(),
                pending_polls: self.activation_polls,
                deleting: false,
                items: HashMap::new(),
            },
        );
        Ok(())
    }

    fn delete_table(&self, table: &TableName) -> Result<(), BackendError> {
        let mut state = self.begin(MemoryOperation::Delete)?;
        state.tables.remove(table).map(|_| ()).ok_or_else(|| missing_table(table))
    }

    fn put_item(&self, table: &TableName, item: Item) -> Result<(), BackendError> {
        let mut state = self.begin(MemoryOperation::Put)?;
        let entry = active_table(&mut state, table)?;
        let key = match item.get(HASH_KEY_ATTRIBUTE) {
            Some(AttributeValue::S(key)) => key.clone(),
            _ => {
                return Err(BackendError::invalid(format!(
                    "item is missing string key attribute {HASH_KEY_ATTRIBUTE}"
                )));
            }
        };
        entry.items.insert(key, item);
        Ok(())
    }

    fn get_item(&self, table: &TableName, key: &BuildHash) -> Result<Option<Item>, BackendError> {
        let mut state = self.begin(MemoryOperation::Get)?;
        let entry = active_table(&mut state, table)?;
        Ok(entry.items.get(key.as_str()).cloned())
    }

    fn set_flag(
        &self,
        table: &TableName,
        key: &BuildHash,
        attribute: &str,
        value: bool,
    ) -> Result<(), BackendError> {
        let mut state = self.begin(MemoryOperation::SetFlag)?;
        let entry = active_table(&mut state, table)?;
        let item = entry.items.get_mut(key.as_str()).ok_or_else(|| {
            BackendError::new(BackendErrorKind::ConditionFailed, format!("no item for key {key}"))
        })?;
        item.insert(attribute.to_string(), AttributeValue::Bool(value));
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a writable table or a `NotFound` error.
fn active_table<'a>(
    state: &'a mut MemoryState,
    table: &TableName,
) -> Result<&'a mut MemoryTable, BackendError> {
    match state.tables.get_mut(table) {
        Some(entry) if entry.status().is_writable() => Ok(entry),
        _ => Err(missing_table(table)),
    }
}

/// Builds the error returned for an absent table.
fn missing_table(table: &TableName) -> BackendError {
    BackendError::not_found(format!("table not found: {table}"))
}
