//! Error types for the Splunk search client.
//!
//! Responsibilities:
//! - Define one error enum covering transport, service, decoding and polling failures.
//! - Classify errors for retry decisions in poll loops and the HTTP layer.
//!
//! Does NOT handle:
//! - Truncated result snapshots. A stream that ends mid-record is not an error
//!   and never produces a `ClientError` (see [`crate::stream`]).
//!
//! Invariants:
//! - `RequestRejected` carries the service-provided message text verbatim.
//! - `OperationTimeout` is only produced by caller-supplied deadlines, never by
//!   a job reported as failed by the service (that is `JobFailed`).

use std::time::Duration;
use thiserror::Error;

use crate::models::SplunkMessage;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during Splunk search operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request error (connection reset, DNS failure, TLS, body read).
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Connection-level failure reported by a non-HTTP transport.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The service rejected the request (bad search syntax, bad argument value).
    #[error("Request rejected ({status}): {message}")]
    RequestRejected {
        status: u16,
        message: String,
        messages: Vec<SplunkMessage>,
    },

    /// Session or token is invalid; the caller must re-authenticate.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unknown resource, typically a job whose TTL has expired.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Any other non-success response from Splunk.
    #[error("API error ({status}) at {url}: {message}{}", .request_id.as_ref().map(|id| format!(" [Request ID: {id}]")).unwrap_or_default())]
    ApiError {
        status: u16,
        url: String,
        message: String,
        request_id: Option<String>,
    },

    /// Invalid response format from Splunk.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Result stream bytes that cannot be completed into a valid document.
    #[error("Malformed result data at byte {offset}: {message}")]
    MalformedData { offset: u64, message: String },

    /// The request cannot be submitted as given.
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    /// The job reached the FAILED dispatch state.
    #[error("Search job {sid} failed: {message}")]
    JobFailed { sid: String, message: String },

    /// Final results were requested before the job was observed done.
    #[error("Search job {0} is not done; refresh until done before reading final results")]
    JobNotDone(String),

    /// A caller-supplied deadline was exceeded.
    #[error("{operation} timed out after {timeout:?}")]
    OperationTimeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// Cooperative cancellation was observed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Maximum retries exceeded.
    #[error("Maximum retries exceeded ({0} attempts)")]
    MaxRetriesExceeded(usize),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Check if this error is worth retrying from a poll loop.
    ///
    /// Connection-level failures, rate limiting and transient gateway errors
    /// are retryable. Service rejections, auth failures, missing jobs and data
    /// corruption are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::Transport(_) | Self::MaxRetriesExceeded(_) => true,
            Self::ApiError { status, .. } => Self::is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if an HTTP status code is retryable.
    ///
    /// Retryable status codes:
    /// - 429: Too Many Requests (rate limiting)
    /// - 502: Bad Gateway (transient server error)
    /// - 503: Service Unavailable (transient server error)
    /// - 504: Gateway Timeout (transient server error)
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 429 | 502 | 503 | 504)
    }

    /// Check if this error indicates authentication failure.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}
