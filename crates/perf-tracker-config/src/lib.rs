// crates/perf-tracker-config/src/lib.rs
// ============================================================================
// Module: Performance Tracker Config Library
// Description: Configuration model and validation for perf-tracker.
// Purpose: Single source of truth for perf-tracker.toml semantics.
// Dependencies: perf-tracker-core, perf-tracker-store-dynamodb, serde, toml
// ============================================================================

//! ## Overview
//! `perf-tracker-config` defines the configuration model shared by the CLI
//! and the system tests. Validation is strict and fail-closed: an invalid
//! file is an error, never a partially applied config.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
