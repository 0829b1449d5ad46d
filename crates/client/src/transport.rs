//! The transport seam between the search pipeline and HTTP.
//!
//! Responsibilities:
//! - Define the operations the pipeline needs from the service: create a job,
//!   run a oneshot or export search, read status, open a results body, delete.
//! - Define the streaming body abstraction that [`crate::ResultStream`] owns.
//! - Describe the namespace every call is scoped to.
//!
//! Does NOT handle:
//! - Authentication, retries or status classification; implementations do
//!   that (see [`crate::SplunkClient`]).
//!
//! Invariants:
//! - A `Body` is read by exactly one consumer; dropping it releases the connection.
//! - Errors follow the taxonomy in [`crate::error`]: `RequestRejected`,
//!   `Unauthorized`, `NotFound`, and connection-level failures.

use bytes::Bytes;
use futures::future::BoxFuture;
use std::fmt;

use crate::endpoints::encode_path_segment;
use crate::error::Result;
use crate::models::{JobStatus, OutputMode, ResultKind, SearchRequest};

/// A streaming response body read in chunks.
pub trait ResponseBody: Send {
    /// Read the next chunk; `Ok(None)` once the body is exhausted.
    fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>>>;
}

/// An owned, type-erased response body.
pub type Body = Box<dyn ResponseBody>;

impl ResponseBody for reqwest::Response {
    fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>>> {
        Box::pin(async move { Ok(self.chunk().await?) })
    }
}

/// Owner/app context of REST calls.
///
/// An empty namespace addresses the global `/services` endpoints; otherwise
/// calls go to `/servicesNS/{owner}/{app}` with `-` standing for "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    pub owner: Option<String>,
    pub app: Option<String>,
}

impl Namespace {
    /// The global namespace (`/services`).
    pub fn global() -> Self {
        Self::default()
    }

    pub fn new(owner: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            app: Some(app.into()),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    pub fn is_global(&self) -> bool {
        self.owner.is_none() && self.app.is_none()
    }

    /// URL path prefix for this namespace, segments percent-encoded.
    pub fn path_prefix(&self) -> String {
        if self.is_global() {
            return "/services".to_string();
        }
        let segment = |value: &Option<String>| match value.as_deref() {
            Some(v) if !v.is_empty() => encode_path_segment(v),
            _ => "-".to_string(),
        };
        format!("/servicesNS/{}/{}", segment(&self.owner), segment(&self.app))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_prefix())
    }
}

/// Which page of which result set to read, and in what format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultsQuery {
    pub kind: ResultKind,
    pub output_mode: OutputMode,
    /// Page size; `None` leaves the service default, `Some(0)` asks for everything.
    pub count: Option<u64>,
    pub offset: u64,
}

impl ResultsQuery {
    pub fn new(kind: ResultKind) -> Self {
        Self {
            kind,
            output_mode: OutputMode::Xml,
            // Export reads the whole set in one body.
            count: matches!(kind, ResultKind::Export).then_some(0),
            offset: 0,
        }
    }

    pub fn output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    pub fn page(mut self, offset: u64, count: u64) -> Self {
        self.offset = offset;
        self.count = Some(count);
        self
    }
}

/// Authenticated access to the search endpoints.
///
/// Implemented over HTTP by [`crate::SplunkClient`] and in memory by
/// `testing::ScriptedTransport`. Held as `Arc<dyn Transport>` so one
/// connection pool serves any number of concurrent jobs.
pub trait Transport: Send + Sync {
    /// Create a search job and return its sid.
    ///
    /// In blocking mode the call returns only once the job is done.
    fn create_job<'a>(
        &'a self,
        namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<String>>;

    /// Run a oneshot search; the body holds the results.
    fn oneshot<'a>(
        &'a self,
        namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<Body>>;

    /// Run an export search; results stream as they are produced.
    fn export<'a>(
        &'a self,
        namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<Body>>;

    /// Fetch the current status of a job.
    fn job_status<'a>(
        &'a self,
        namespace: &'a Namespace,
        sid: &'a str,
    ) -> BoxFuture<'a, Result<JobStatus>>;

    /// Open a results, preview or export body for a job.
    fn job_results<'a>(
        &'a self,
        namespace: &'a Namespace,
        sid: &'a str,
        query: &'a ResultsQuery,
    ) -> BoxFuture<'a, Result<Body>>;

    /// Cancel and delete a job.
    fn delete_job<'a>(&'a self, namespace: &'a Namespace, sid: &'a str)
    -> BoxFuture<'a, Result<()>>;
}
