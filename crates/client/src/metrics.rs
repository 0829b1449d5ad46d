//! Metrics for search API calls and result streaming.
//!
//! This module records, through the `metrics` facade:
//! - Request latency histograms and request/retry/error counters
//! - Records decoded, truncated snapshot tails and malformed streams
//! - Poll loop iterations
//!
//! # What this module does NOT handle:
//! - Metrics exposition/export (install any `metrics` recorder for that)
//!
//! # Invariants
//! - All metrics use consistent label names: `endpoint`, `method`, `status`,
//!   `error_category`, `kind`, `mode`
//! - Metric recording is infallible
//! - Zero-cost when no metrics recorder is installed

use crate::error::ClientError;
use crate::models::{ResultKind, SearchMode};
use std::time::Duration;

/// Metric name for request duration histogram.
pub const METRIC_REQUEST_DURATION: &str = "splunk_search_request_duration_seconds";

/// Metric name for total request counter.
pub const METRIC_REQUESTS_TOTAL: &str = "splunk_search_requests_total";

/// Metric name for retry counter.
pub const METRIC_RETRIES_TOTAL: &str = "splunk_search_retries_total";

/// Metric name for error counter.
pub const METRIC_ERRORS_TOTAL: &str = "splunk_search_errors_total";

/// Metric name for decoded record counter.
pub const METRIC_RECORDS_DECODED: &str = "splunk_search_records_decoded_total";

/// Metric name for result streams that ended inside a partial record.
pub const METRIC_TRUNCATED_TAILS: &str = "splunk_search_truncated_tails_total";

/// Metric name for result streams rejected as malformed.
pub const METRIC_MALFORMED_STREAMS: &str = "splunk_search_malformed_streams_total";

/// Metric name for poll loop iterations.
pub const METRIC_POLL_ITERATIONS: &str = "splunk_search_poll_iterations_total";

/// Error categories for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport-level errors (connection refused, DNS, etc.)
    Transport,
    /// HTTP 4xx client errors, including rejected searches
    Http4xx,
    /// HTTP 5xx server errors
    Http5xx,
    /// Authentication failures
    Auth,
    /// Result data that could not be decoded
    Data,
    /// Caller deadline exceeded
    Timeout,
    /// Unknown/unclassified errors
    Unknown,
}

impl ErrorCategory {
    /// Returns the string label for this error category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transport => "transport",
            ErrorCategory::Http4xx => "http_4xx",
            ErrorCategory::Http5xx => "http_5xx",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Data => "data",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl From<&ClientError> for ErrorCategory {
    fn from(error: &ClientError) -> Self {
        match error {
            ClientError::OperationTimeout { .. } => ErrorCategory::Timeout,
            ClientError::HttpError(e) if e.is_timeout() => ErrorCategory::Timeout,
            ClientError::HttpError(_) | ClientError::Transport(_) => ErrorCategory::Transport,
            ClientError::MaxRetriesExceeded(_) => ErrorCategory::Transport,
            ClientError::Unauthorized(_) => ErrorCategory::Auth,
            ClientError::RequestRejected { .. } | ClientError::NotFound(_) => {
                ErrorCategory::Http4xx
            }
            ClientError::ApiError { status, .. } if (400..500).contains(status) => {
                ErrorCategory::Http4xx
            }
            ClientError::ApiError { status, .. } if (500..600).contains(status) => {
                ErrorCategory::Http5xx
            }
            ClientError::MalformedData { .. } | ClientError::InvalidResponse(_) => {
                ErrorCategory::Data
            }
            _ => ErrorCategory::Unknown,
        }
    }
}

/// Metrics collector for search API calls and result streams.
///
/// A lightweight wrapper around the `metrics` crate macros with consistent
/// labels. Cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    enabled: bool,
}

impl MetricsCollector {
    /// Create an enabled collector. Use [`Self::disabled()`] for a no-op one.
    pub fn new() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record the duration of an API request.
    ///
    /// `status` is `None` when the request failed before a response arrived.
    pub fn record_request_duration(
        &self,
        endpoint: &str,
        method: &str,
        duration: Duration,
        status: Option<u16>,
    ) {
        if !self.enabled {
            return;
        }

        let status_label = status.map_or("error".to_string(), |s| s.to_string());

        metrics::histogram!(METRIC_REQUEST_DURATION,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
            "status" => status_label,
        )
        .record(duration.as_secs_f64());
    }

    /// Record a request attempt, including retries.
    pub fn record_request(&self, endpoint: &str, method: &str) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_REQUESTS_TOTAL,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
        )
        .increment(1);
    }

    /// Record a retry attempt (1-based, not counting the initial request).
    pub fn record_retry(&self, endpoint: &str, method: &str, attempt: usize) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_RETRIES_TOTAL,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
            "attempt" => attempt.to_string(),
        )
        .increment(1);
    }

    pub fn record_error(&self, endpoint: &str, method: &str, category: ErrorCategory) {
        if !self.enabled {
            return;
        }

        metrics::counter!(METRIC_ERRORS_TOTAL,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
            "error_category" => category.as_str(),
        )
        .increment(1);
    }

    /// Record an error, categorizing it automatically.
    pub fn record_client_error(&self, endpoint: &str, method: &str, error: &ClientError) {
        self.record_error(endpoint, method, ErrorCategory::from(error));
    }

    /// Record records handed out by a result stream.
    pub fn record_records_decoded(&self, kind: ResultKind, count: u64) {
        if !self.enabled || count == 0 {
            return;
        }
        metrics::counter!(METRIC_RECORDS_DECODED, "kind" => kind.to_string()).increment(count);
    }

    /// Record a stream whose body ended inside a partial record.
    pub fn record_truncated_tail(&self, kind: ResultKind) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_TRUNCATED_TAILS, "kind" => kind.to_string()).increment(1);
    }

    /// Record a stream rejected as malformed.
    pub fn record_malformed_stream(&self, kind: ResultKind) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_MALFORMED_STREAMS, "kind" => kind.to_string()).increment(1);
    }

    /// Record one status refresh or preview fetch of a poll loop.
    pub fn record_poll_iteration(&self, mode: SearchMode) {
        if !self.enabled {
            return;
        }
        metrics::counter!(METRIC_POLL_ITERATIONS, "mode" => mode.to_string()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_as_str() {
        assert_eq!(ErrorCategory::Transport.as_str(), "transport");
        assert_eq!(ErrorCategory::Http4xx.as_str(), "http_4xx");
        assert_eq!(ErrorCategory::Http5xx.as_str(), "http_5xx");
        assert_eq!(ErrorCategory::Auth.as_str(), "auth");
        assert_eq!(ErrorCategory::Data.as_str(), "data");
        assert_eq!(ErrorCategory::Timeout.as_str(), "timeout");
        assert_eq!(ErrorCategory::Unknown.as_str(), "unknown");
    }

    #[test]
    fn test_error_categorization() {
        let timeout_err = ClientError::OperationTimeout {
            operation: "wait_for_job",
            timeout: Duration::from_secs(1),
        };
        assert_eq!(ErrorCategory::from(&timeout_err), ErrorCategory::Timeout);

        let conn_err = ClientError::Transport("connection reset".to_string());
        assert_eq!(ErrorCategory::from(&conn_err), ErrorCategory::Transport);

        let rejected = ClientError::RequestRejected {
            status: 400,
            message: "Unknown search command".to_string(),
            messages: vec![],
        };
        assert_eq!(ErrorCategory::from(&rejected), ErrorCategory::Http4xx);

        let api_500 = ClientError::ApiError {
            status: 500,
            url: "test".to_string(),
            message: "server error".to_string(),
            request_id: None,
        };
        assert_eq!(ErrorCategory::from(&api_500), ErrorCategory::Http5xx);

        let malformed = ClientError::MalformedData {
            offset: 0,
            message: "mismatched".to_string(),
        };
        assert_eq!(ErrorCategory::from(&malformed), ErrorCategory::Data);

        assert_eq!(
            ErrorCategory::from(&ClientError::Unauthorized("expired".to_string())),
            ErrorCategory::Auth
        );
        assert_eq!(
            ErrorCategory::from(&ClientError::Cancelled),
            ErrorCategory::Unknown
        );
    }

    #[test]
    fn test_metrics_collector_enabled() {
        let collector = MetricsCollector::new();
        assert!(collector.is_enabled());

        let disabled = MetricsCollector::disabled();
        assert!(!disabled.is_enabled());
        // no recorder installed: recording is a no-op
        collector.record_truncated_tail(ResultKind::Preview);
        collector.record_records_decoded(ResultKind::FinalResults, 3);
        collector.record_poll_iteration(SearchMode::Normal);
    }
}
