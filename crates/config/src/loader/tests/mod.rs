//! Tests for the configuration loader.
//!
//! Invariants:
//! - Tests that touch process-global state (env vars, cwd) use `serial_test`
//!   and the global test lock.

use std::sync::Mutex;

mod dotenv_tests;
mod env_tests;

/// Returns the global test lock for environment variable isolation.
pub fn env_lock() -> &'static Mutex<()> {
    crate::test_util::global_test_lock()
}
