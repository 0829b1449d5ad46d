//! Streaming search results from the Splunk REST API.
//!
//! This crate submits searches, tracks the resulting jobs and reads their
//! XML result documents incrementally, so records are available while the
//! body is still arriving. It supports oneshot, blocking, normal (polled),
//! export and realtime (sliding window) execution.
//!
//! The pipeline:
//! - [`RecordDecoder`]: a push-style decoder over arbitrarily split byte chunks
//! - [`ResultStream`]: one response body bound to a decoder
//! - [`JobHandle`]: one search job (refresh, open results, cancel)
//! - [`SearchController`]: mode selection, polling and realtime snapshots
//! - [`Transport`]: the network seam, implemented by [`SplunkClient`]

mod auth;
pub mod client;
pub mod controller;
pub mod decoder;
pub mod endpoints;
pub mod error;
pub mod job;
pub mod metrics;
pub mod models;
pub mod record;
mod serde_helpers;
pub mod stream;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub use auth::AuthStrategy;
pub use client::SplunkClient;
pub use client::builder::SplunkClientBuilder;
pub use controller::{PollPolicy, RealtimeOptions, SearchController, SearchResults, Snapshot};
pub use decoder::{Decoded, DecoderState, MalformedData, RecordDecoder};
pub use error::{ClientError, Result};
pub use job::{JobGuard, JobHandle};
pub use metrics::{ErrorCategory, MetricsCollector};
pub use models::{
    DispatchState, JobStatus, MessageType, OutputMode, ResultKind, SearchMode, SearchRequest,
    SearchRequestBuilder, SplunkMessage, SplunkMessages,
};
pub use record::{FieldValue, Record, strip_markup};
pub use stream::ResultStream;
pub use transport::{Body, Namespace, ResponseBody, ResultsQuery, Transport};

/// Redact a search query for logging.
///
/// Search text routinely embeds credentials and personal data, so logs only
/// carry its length and a short hash that correlates repeated submissions.
pub fn redact_query(query: &str) -> String {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    format!("<{} chars, hash={:08x}>", query.len(), hasher.finish() as u32)
}
