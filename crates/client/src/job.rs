//! Handles to submitted search jobs.
//!
//! # What this module handles:
//! - Submitting a job and holding its sid, namespace and last known status
//! - Explicit status refresh
//! - Opening final, preview and export result streams
//! - Idempotent cancellation, and a drop guard for deferred cleanup
//!
//! # What this module does NOT handle:
//! - Polling cadence and mode selection (see [`crate::controller`])
//!
//! # Invariants
//! - Status only changes through [`JobHandle::refresh`]; nothing refreshes behind the caller's back.
//! - Mutating calls take `&mut self`, so one handle never has two refreshes or
//!   cancels in flight at once.
//! - Abandoning a handle does not cancel the job; use [`JobHandle::cancel`]
//!   or [`JobHandle::cancel_guard`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{DispatchState, JobStatus, OutputMode, ResultKind, SearchMode, SearchRequest};
use crate::redact_query;
use crate::stream::ResultStream;
use crate::transport::{Body, Namespace, ResultsQuery, Transport};

/// A submitted search job.
pub struct JobHandle {
    transport: Arc<dyn Transport>,
    namespace: Namespace,
    request: Option<SearchRequest>,
    sid: String,
    status: JobStatus,
    cancelled: bool,
    read_timeout: Option<Duration>,
    metrics: MetricsCollector,
}

impl fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobHandle")
            .field("sid", &self.sid)
            .field("namespace", &self.namespace)
            .field("dispatch_state", &self.status.dispatch_state)
            .field("is_done", &self.status.is_done)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl JobHandle {
    /// Create a job for `request`.
    ///
    /// A service rejection (bad search syntax) is returned as
    /// `RequestRejected` and no handle is produced. In blocking mode the
    /// handle starts out done.
    pub async fn submit(
        transport: Arc<dyn Transport>,
        namespace: Namespace,
        request: SearchRequest,
    ) -> Result<Self> {
        if !request.mode().creates_job() {
            return Err(ClientError::InvalidRequest(format!(
                "{} searches do not create a job",
                request.mode()
            )));
        }

        debug!(
            "Submitting {} search in {}: {}",
            request.mode(),
            namespace,
            redact_query(request.query())
        );
        let sid = transport.create_job(&namespace, &request).await?;
        debug!(sid = %sid, "Search job created");

        let status = match request.mode() {
            SearchMode::Blocking => JobStatus::completed(&sid),
            _ => JobStatus::submitted(&sid),
        };

        Ok(Self {
            transport,
            namespace,
            request: Some(request),
            sid,
            status,
            cancelled: false,
            read_timeout: None,
            metrics: MetricsCollector::disabled(),
        })
    }

    /// Attach to an existing job by sid. The status is unknown until the first refresh.
    pub fn attach(transport: Arc<dyn Transport>, namespace: Namespace, sid: impl Into<String>) -> Self {
        let sid = sid.into();
        Self {
            transport,
            namespace,
            request: None,
            status: JobStatus::submitted(&sid),
            sid,
            cancelled: false,
            read_timeout: None,
            metrics: MetricsCollector::disabled(),
        }
    }

    /// Bound each chunk read of streams opened from this handle.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The request this job was submitted with; `None` for attached jobs.
    pub fn request(&self) -> Option<&SearchRequest> {
        self.request.as_ref()
    }

    /// Status as of the last refresh (or submission).
    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.status.dispatch_state
    }

    /// Done as of the last refresh (or submission, for blocking jobs).
    pub fn is_done(&self) -> bool {
        self.status.is_done
    }

    pub fn is_failed(&self) -> bool {
        self.status.has_failed()
    }

    /// True once a cancel request has been accepted.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True for sliding-window jobs, which never become done.
    pub fn is_realtime(&self) -> bool {
        self.status.is_realtime
            || self
                .request
                .as_ref()
                .is_some_and(|request| request.mode() == SearchMode::Realtime)
    }

    /// Re-fetch the job status.
    pub async fn refresh(&mut self) -> Result<&JobStatus> {
        let mut status = self.transport.job_status(&self.namespace, &self.sid).await?;
        if status.sid.is_empty() {
            status.sid = self.sid.clone();
        }
        debug!(
            sid = %self.sid,
            state = %status.dispatch_state,
            done = status.is_done,
            progress = status.done_progress,
            results = status.advisory_result_count(),
            "Job status refreshed"
        );
        self.status = status;
        Ok(&self.status)
    }

    /// Open a result stream of the given kind.
    ///
    /// `FinalResults` requires the job to be done as of the last refresh.
    /// A `Preview` stream is final only when the last refresh saw the job done.
    pub async fn open_results(&self, kind: ResultKind) -> Result<ResultStream> {
        self.open_with(ResultsQuery::new(kind)).await
    }

    /// Open one page of a result set.
    pub async fn open_results_page(
        &self,
        kind: ResultKind,
        offset: u64,
        count: u64,
    ) -> Result<ResultStream> {
        self.open_with(ResultsQuery::new(kind).page(offset, count)).await
    }

    /// Open a result body in a non-XML output mode, unparsed.
    pub async fn open_raw(&self, kind: ResultKind, output_mode: OutputMode) -> Result<Body> {
        let query = ResultsQuery::new(kind).output_mode(output_mode);
        self.check_readable(kind)?;
        self.transport
            .job_results(&self.namespace, &self.sid, &query)
            .await
    }

    async fn open_with(&self, query: ResultsQuery) -> Result<ResultStream> {
        self.check_readable(query.kind)?;

        let is_final = match query.kind {
            ResultKind::FinalResults | ResultKind::Export => true,
            ResultKind::Preview => self.status.is_done,
        };
        debug!(sid = %self.sid, kind = %query.kind, is_final, "Opening result stream");

        let body = self
            .transport
            .job_results(&self.namespace, &self.sid, &query)
            .await?;
        let mut stream = ResultStream::new(body, query.kind, is_final)
            .with_expected_count(self.status.advisory_result_count())
            .with_metrics(self.metrics.clone());
        if let Some(timeout) = self.read_timeout {
            stream = stream.with_read_timeout(timeout);
        }
        Ok(stream)
    }

    fn check_readable(&self, kind: ResultKind) -> Result<()> {
        if kind == ResultKind::FinalResults && !self.status.is_done {
            return Err(ClientError::JobNotDone(self.sid.clone()));
        }
        Ok(())
    }

    /// Cancel the job. Calling it again, or on a finished job, is not an error.
    ///
    /// A job the service no longer knows (expired TTL, already deleted)
    /// counts as cancelled. Transport failures are returned and leave the
    /// handle cancellable.
    pub async fn cancel(&mut self) -> Result<()> {
        if self.cancelled {
            return Ok(());
        }
        match self.transport.delete_job(&self.namespace, &self.sid).await {
            Ok(()) => debug!(sid = %self.sid, "Search job cancelled"),
            Err(ClientError::NotFound(_)) => {
                debug!(sid = %self.sid, "Search job already gone")
            }
            Err(err) => return Err(err),
        }
        self.cancelled = true;
        Ok(())
    }

    /// A guard that cancels this job when dropped, unless disarmed.
    pub fn cancel_guard(&self) -> JobGuard {
        JobGuard {
            transport: Some(self.transport.clone()),
            namespace: self.namespace.clone(),
            sid: self.sid.clone(),
        }
    }
}

/// Cancels a job on drop.
///
/// The cancel request is spawned on the current tokio runtime; outside a
/// runtime nothing is sent and a warning is logged.
#[must_use = "the job is cancelled as soon as the guard is dropped"]
pub struct JobGuard {
    transport: Option<Arc<dyn Transport>>,
    namespace: Namespace,
    sid: String,
}

impl fmt::Debug for JobGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobGuard")
            .field("sid", &self.sid)
            .field("armed", &self.transport.is_some())
            .finish()
    }
}

impl JobGuard {
    /// Keep the job running.
    pub fn disarm(mut self) {
        self.transport = None;
    }

    /// Cancel now and wait for the answer.
    pub async fn cancel(mut self) -> Result<()> {
        let Some(transport) = self.transport.take() else {
            return Ok(());
        };
        match transport.delete_job(&self.namespace, &self.sid).await {
            Ok(()) | Err(ClientError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };
        let namespace = std::mem::take(&mut self.namespace);
        let sid = std::mem::take(&mut self.sid);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    match transport.delete_job(&namespace, &sid).await {
                        Ok(()) | Err(ClientError::NotFound(_)) => {
                            debug!(sid = %sid, "Search job cancelled by guard")
                        }
                        Err(err) => warn!(sid = %sid, error = %err, "Failed to cancel search job"),
                    }
                });
            }
            Err(_) => warn!(sid = %sid, "No tokio runtime; search job left running"),
        }
    }
}
