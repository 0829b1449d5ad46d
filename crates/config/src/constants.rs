//! Centralized constants for the splunk-search workspace.
//!
//! This module contains default values used across crates to avoid
//! magic number duplication and improve maintainability.

// =============================================================================
// Connection & Timeout Defaults
// =============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum allowed connection timeout in seconds (1 hour).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Default Splunk management port.
pub const DEFAULT_SPLUNK_PORT: u16 = 8089;

/// Default maximum number of HTTP redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Default maximum number of retries for rate-limited or unavailable responses.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Maximum allowed retries. Backoff doubles per attempt, so this caps the
/// total wait at roughly 17 minutes.
pub const MAX_MAX_RETRIES: usize = 10;

// =============================================================================
// Search & Polling Defaults
// =============================================================================

/// Default polling interval for job status checks in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default interval between realtime preview snapshots in milliseconds.
pub const DEFAULT_REALTIME_INTERVAL_MS: u64 = 1000;

/// Smallest accepted poll or snapshot interval in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Largest accepted poll or snapshot interval in milliseconds (1 minute).
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Default maximum time to wait for search job completion in seconds.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 300;

/// Maximum allowed wait for a search job in seconds (24 hours).
pub const MAX_WAIT_SECS: u64 = 86_400;

/// Maximum allowed stall on a single result stream read in seconds.
pub const MAX_READ_TIMEOUT_SECS: u64 = 3600;

/// Default maximum number of search results to return.
pub const DEFAULT_MAX_RESULTS: u64 = 1000;

/// Default sliding window for realtime searches in seconds.
pub const DEFAULT_REALTIME_WINDOW_SECS: u64 = 60;
