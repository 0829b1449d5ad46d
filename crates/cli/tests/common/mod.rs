//! Shared test utilities for splunk-search CLI integration tests.
//!
//! Responsibilities:
//! - Provide a hermetic CLI command factory that prevents dotenv loading.
//! - Ensure consistent test environment setup (tokens, base URLs).
//!
//! Invariants / Assumptions:
//! - `SPLUNK_API_TOKEN` is set to "test-token" unless overridden.
//! - Polling runs at the minimum interval so wait loops finish quickly.

use assert_cmd::Command;

/// Returns a hermetic `splunk-search` command for integration testing.
///
/// It ensures:
/// - `DOTENV_DISABLED=1` is set to prevent local `.env` contamination.
/// - `SPLUNK_API_TOKEN` is set to a dummy value to satisfy config validation.
/// - Other connection env vars are cleared to ensure no leakage from the host.
pub fn splunk_cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("splunk-search");

    cmd.env("DOTENV_DISABLED", "1");
    cmd.env("SPLUNK_API_TOKEN", "test-token");
    cmd.env("SPLUNK_POLL_INTERVAL_MS", "50");

    cmd.env_remove("SPLUNK_BASE_URL")
        .env_remove("SPLUNK_SESSION_KEY")
        .env_remove("SPLUNK_OWNER")
        .env_remove("SPLUNK_APP")
        .env_remove("SPLUNK_MAX_WAIT_SECS")
        .env_remove("SPLUNK_REALTIME_INTERVAL_MS")
        .env_remove("RUST_LOG");

    cmd
}

/// Returns a hermetic `splunk-search` command with a specific base URL.
#[allow(dead_code)]
pub fn splunk_cmd_with_base_url(base_url: &str) -> Command {
    let mut cmd = splunk_cmd();
    cmd.env("SPLUNK_BASE_URL", base_url);
    cmd
}
