// system-tests/tests/helpers/env.rs
// ============================================================================
// Module: Test Environment Helpers
// Description: Safe wrappers for test-only environment mutation.
// Purpose: Centralize env var changes with explicit safety notes.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Safe wrappers for test-only environment mutation. The AWS default provider
//! chain reads credentials and region from the process environment, so the
//! fixtures publish dummy values before the first client is built.

#![allow(unsafe_code, reason = "Test harness mutates process env for configuration.")]

use std::sync::Once;

/// Sets an environment variable for the current process.
pub fn set_var(key: &str, value: &str) {
    // SAFETY: Tests control process lifecycle and set env vars before any client starts.
    unsafe {
        std::env::set_var(key, value);
    }
}

/// Publishes local credentials accepted by `DynamoDB` Local exactly once.
pub fn install_local_credentials(region: &str) {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        set_var("AWS_ACCESS_KEY_ID", "perf-tracker");
        set_var("AWS_SECRET_ACCESS_KEY", "perf-tracker");
        set_var("AWS_REGION", region);
        set_var("AWS_EC2_METADATA_DISABLED", "true");
    });
}
