// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for Performance Tracker system-tests.
// Purpose: Provide DynamoDB fixtures and environment utilities.
// Dependencies: system-tests, perf-tracker-store-dynamodb, testcontainers
// ============================================================================

//! ## Overview
//! Shared helpers for Performance Tracker system-tests.
//! Invariants:
//! - Every test works against its own uniquely named table.
//! - Tables created through a `TableGuard` are removed when the guard drops.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod env;
pub mod infra;
