//! Common test utilities for integration tests.
//!
//! Shared helpers and re-exports for the search pipeline tests. Integration
//! tests pull them in with `mod common; use common::*;`.
//!
//! # Invariants
//! - Fixtures are loaded from the `fixtures/` directory relative to the crate root
//!
//! # What this does NOT handle
//! - Mock server setup (use wiremock directly in tests)
//! - Test-specific assertions or test logic

use std::sync::Arc;
use std::time::Duration;

#[allow(unused_imports)]
pub use splunk_search::testing::{
    Call, ResultsDocument, ScriptedBody, ScriptedTransport, load_fixture, load_text_fixture,
};

#[allow(unused_imports)]
pub use splunk_search::{
    AuthStrategy, ClientError, Decoded, JobHandle, JobStatus, Namespace, PollPolicy,
    RealtimeOptions, Record, RecordDecoder, ResultKind, ResultStream, SearchController,
    SearchMode, SearchRequest, SplunkClient, Transport,
};
#[allow(unused_imports)]
pub use wiremock::{Mock, MockServer, ResponseTemplate};

/// A client for `server` authenticated with a fixed API token.
#[allow(dead_code)]
pub fn client_for(server: &MockServer, max_retries: usize) -> SplunkClient {
    SplunkClient::builder()
        .base_url(server.uri())
        .auth_strategy(AuthStrategy::ApiToken {
            token: secrecy::SecretString::new("test-token".to_string().into()),
        })
        .max_retries(max_retries)
        .build()
        .expect("client should build")
}

/// A controller over a scripted transport with short, deterministic intervals.
#[allow(dead_code)]
pub fn scripted_controller(transport: &Arc<ScriptedTransport>) -> SearchController {
    SearchController::new(transport.clone()).with_policy(PollPolicy {
        poll_interval: Duration::from_millis(100),
        realtime_interval: Duration::from_millis(200),
        max_wait: Some(Duration::from_secs(30)),
        read_timeout: None,
    })
}

/// Status of a running (not done) job.
#[allow(dead_code)]
pub fn running(sid: &str) -> JobStatus {
    JobStatus {
        sid: sid.to_string(),
        dispatch_state: splunk_search::DispatchState::Running,
        ..Default::default()
    }
}

/// Status of a done job with `count` results.
#[allow(dead_code)]
pub fn done(sid: &str, count: u64) -> JobStatus {
    JobStatus {
        sid: sid.to_string(),
        dispatch_state: splunk_search::DispatchState::Done,
        is_done: true,
        result_count: count,
        result_preview_count: count,
        ..Default::default()
    }
}

/// Decode every record of `xml` fed in chunks of the given sizes (cycled).
#[allow(dead_code)]
pub fn decode_all(xml: &[u8], chunk_sizes: &[usize]) -> Result<Vec<Record>, String> {
    let mut decoder = RecordDecoder::new();
    let mut records = Vec::new();
    let mut rest = xml;
    let mut sizes = chunk_sizes.iter().copied().cycle();

    loop {
        loop {
            match decoder.try_decode_next() {
                Decoded::Record(record) => records.push(record),
                Decoded::NeedMoreData | Decoded::EndOfStream => break,
                Decoded::Malformed(err) => return Err(err.message),
            }
        }
        if rest.is_empty() {
            return Ok(records);
        }
        let size = sizes.next().unwrap_or(rest.len()).clamp(1, rest.len());
        let (chunk, tail) = rest.split_at(size);
        decoder.feed(chunk);
        rest = tail;
    }
}

/// Advance Tokio's paused clock and yield so sleepers can observe the change.
#[allow(dead_code)]
pub async fn advance_and_yield(duration: Duration) {
    tokio::time::advance(duration).await;
    tokio::task::yield_now().await;
}
