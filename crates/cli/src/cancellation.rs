//! CLI cancellation utilities.
//!
//! Responsibilities:
//! - Wire Ctrl+C (SIGINT) into a `tokio_util` cancellation token shared with
//!   the search pipeline.
//! - Recognize user-initiated cancellation in `anyhow` error chains.
//! - Centralize the cancellation message and the Unix SIGINT exit code (130).
//!
//! Does NOT handle:
//! - Deciding *when* to observe cancellation; the controller's wait and
//!   snapshot loops do that.
//!
//! Invariants:
//! - Once cancelled, the token remains cancelled forever.

use splunk_search::ClientError;
use tokio_util::sync::CancellationToken;

/// Standard Unix exit code for SIGINT: 128 + 2.
pub const SIGINT_EXIT_CODE: u8 = 130;

/// Cancel `token` on the first Ctrl+C.
pub fn install_ctrl_c_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::debug!("Ctrl+C received; cancelling");
        token.cancel();
    });
}

/// Returns true if this anyhow error represents a cancellation.
pub fn is_cancelled_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ClientError>(),
            Some(ClientError::Cancelled)
        )
    })
}

/// Print standard cancellation message to stderr.
pub fn print_cancelled_message() {
    eprintln!("^C\nOperation cancelled by user");
}
