//! Search namespace and polling configuration.

use std::time::Duration;

use crate::constants::{DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_REALTIME_INTERVAL_MS};

/// The user/app context searches are submitted in.
///
/// Either half may be unset; the client then uses the `-` wildcard for it,
/// and with both unset searches go to the global `/services` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceConfig {
    pub owner: Option<String>,
    pub app: Option<String>,
}

/// Polling cadence and deadlines for search jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between status refreshes of a running job.
    pub poll_interval: Duration,
    /// Sleep between realtime preview snapshots.
    pub realtime_interval: Duration,
    /// Overall deadline for a job to finish. `None` waits indefinitely.
    pub max_wait: Option<Duration>,
    /// Bound on a single stalled read of a result stream.
    pub read_timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            realtime_interval: Duration::from_millis(DEFAULT_REALTIME_INTERVAL_MS),
            max_wait: Some(Duration::from_secs(DEFAULT_MAX_WAIT_SECS)),
            read_timeout: None,
        }
    }
}
