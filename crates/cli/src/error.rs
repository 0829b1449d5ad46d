//! Structured exit codes for the CLI.
//!
//! Responsibilities:
//! - Define the exit codes scripts can rely on.
//! - Map `ClientError` variants onto those codes.
//!
//! Does NOT handle:
//! - Printing errors (see `main`).
//!
//! Invariants:
//! - Codes are stable; new failure classes get new codes rather than reusing one.

use splunk_search::ClientError;

use crate::cancellation::SIGINT_EXIT_CODE;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Invalid or expired credentials (401/403).
    AuthenticationFailed = 2,
    /// The server could not be reached.
    ConnectionError = 3,
    /// Unknown or expired search job.
    NotFound = 4,
    /// The query or its arguments were rejected.
    ValidationError = 5,
    /// A wait or read deadline elapsed.
    Timeout = 6,
    RateLimited = 7,
    ServiceUnavailable = 8,
    Interrupted = SIGINT_EXIT_CODE,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as u8 as i32
    }
}

impl From<&ClientError> for ExitCode {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Unauthorized(_) => ExitCode::AuthenticationFailed,
            ClientError::NotFound(_) => ExitCode::NotFound,
            ClientError::RequestRejected { .. }
            | ClientError::InvalidRequest(_)
            | ClientError::InvalidUrl(_) => ExitCode::ValidationError,
            ClientError::OperationTimeout { .. } => ExitCode::Timeout,
            ClientError::Cancelled => ExitCode::Interrupted,
            ClientError::Transport(_) => ExitCode::ConnectionError,
            ClientError::HttpError(e) => {
                if e.is_connect() || e.is_timeout() {
                    ExitCode::ConnectionError
                } else {
                    ExitCode::GeneralError
                }
            }

            ClientError::ApiError { status, .. } => match status {
                400 => ExitCode::ValidationError,
                401 | 403 => ExitCode::AuthenticationFailed,
                404 => ExitCode::NotFound,
                429 => ExitCode::RateLimited,
                502..=504 => ExitCode::ServiceUnavailable,
                _ => ExitCode::GeneralError,
            },
            // Only 429/502/503/504 responses are retried.
            ClientError::MaxRetriesExceeded(_) => ExitCode::ServiceUnavailable,

            ClientError::InvalidResponse(_)
            | ClientError::MalformedData { .. }
            | ClientError::JobFailed { .. }
            | ClientError::JobNotDone(_) => ExitCode::GeneralError,
        }
    }
}

/// Extension trait for anyhow::Error to extract exit codes.
pub trait ExitCodeExt {
    /// Returns `ExitCode::GeneralError` if no `ClientError` is in the chain.
    fn exit_code(&self) -> ExitCode;
}

impl ExitCodeExt for anyhow::Error {
    fn exit_code(&self) -> ExitCode {
        self.chain()
            .find_map(|cause| cause.downcast_ref::<ClientError>())
            .map(ExitCode::from)
            .unwrap_or(ExitCode::GeneralError)
    }
}
