// system-tests/src/lib.rs
// ============================================================================
// Module: Performance Tracker System Tests Library
// Description: Shared configuration for system test scenarios.
// Purpose: Provide common settings for the DynamoDB-backed system tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! This crate hosts shared configuration used by the Performance Tracker
//! system-tests binaries in `system-tests/tests`. The binaries only build with
//! the `system-tests` feature because they need Docker or an external
//! `DynamoDB` endpoint.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
