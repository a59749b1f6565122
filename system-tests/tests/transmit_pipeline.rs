// system-tests/tests/transmit_pipeline.rs
// ============================================================================
// Module: Transmit Pipeline Suite
// Description: Aggregates document-to-table system tests into one binary.
// Purpose: Exercise aggregation and upload together against DynamoDB.
// Dependencies: suites/*, helpers
// ============================================================================

//! ## Overview
//! Aggregates transmit pipeline system tests into one binary.

mod helpers;

#[path = "suites/transmit.rs"]
mod transmit;
