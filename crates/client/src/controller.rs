//! Search mode controller.
//!
//! Drives a search through its execution mode:
//!
//! - **Oneshot**: one request returns the results; no job, no polling.
//! - **Blocking**: the create call returns once the job is done; then one
//!   final results request.
//! - **Normal**: create, poll status on a fixed interval until done (bounded
//!   by an optional deadline), then one final results request.
//! - **Export**: stream `/search/jobs/export`; no job.
//! - **Realtime**: create, then repeatedly fetch a preview snapshot until the
//!   caller cancels. A realtime job is never done.
//!
//! Cancellation is cooperative. The token is checked between network calls,
//! and a request that has already been sent is allowed to finish.

use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::job::JobHandle;
use crate::metrics::MetricsCollector;
use crate::models::{ResultKind, SearchMode, SearchRequest, SplunkMessage};
use crate::record::Record;
use crate::stream::ResultStream;
use crate::transport::{Namespace, Transport};
use splunk_search_config::constants::{
    DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_REALTIME_INTERVAL_MS,
};

/// Polling cadence and deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Sleep between status refreshes of a normal job.
    pub poll_interval: Duration,
    /// Sleep between realtime snapshots.
    pub realtime_interval: Duration,
    /// Overall deadline for waiting on a normal job. `None` waits forever.
    pub max_wait: Option<Duration>,
    /// Bound on each chunk read of result streams.
    pub read_timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            realtime_interval: Duration::from_millis(DEFAULT_REALTIME_INTERVAL_MS),
            max_wait: Some(Duration::from_secs(DEFAULT_MAX_WAIT_SECS)),
            read_timeout: None,
        }
    }
}

impl PollPolicy {
    /// Build the policy from loaded configuration.
    pub fn from_config(config: &splunk_search_config::PollConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            realtime_interval: config.realtime_interval,
            max_wait: config.max_wait,
            read_timeout: config.read_timeout,
        }
    }
}

/// Options for a realtime snapshot loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RealtimeOptions {
    /// Stop after this many snapshots. `None` runs until cancelled.
    pub max_snapshots: Option<u64>,
    /// Override the policy's realtime interval.
    pub interval: Option<Duration>,
}

/// One preview snapshot of a running job.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Zero-based position in the snapshot loop.
    pub sequence: u64,
    pub field_names: Vec<String>,
    pub records: Vec<Record>,
    /// True when this snapshot holds the job's final results.
    pub is_final: bool,
    /// The number of fields differs from the previous snapshot.
    pub schema_changed: bool,
    pub messages: Vec<SplunkMessage>,
}

/// Results of a non-realtime run.
#[derive(Debug)]
pub struct SearchResults {
    /// The job behind the stream; `None` for oneshot and export runs.
    pub job: Option<JobHandle>,
    pub stream: ResultStream,
}

/// Runs searches through a [`Transport`] according to their mode.
#[derive(Clone)]
pub struct SearchController {
    transport: Arc<dyn Transport>,
    namespace: Namespace,
    policy: PollPolicy,
    metrics: MetricsCollector,
}

impl std::fmt::Debug for SearchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchController")
            .field("namespace", &self.namespace)
            .field("policy", &self.policy)
            .finish()
    }
}

impl SearchController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            namespace: Namespace::global(),
            policy: PollPolicy::default(),
            metrics: MetricsCollector::disabled(),
        }
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Create a job for `request` without waiting on it.
    pub async fn submit(&self, request: SearchRequest) -> Result<JobHandle> {
        let job = JobHandle::submit(self.transport.clone(), self.namespace.clone(), request).await?;
        Ok(job
            .with_read_timeout(self.policy.read_timeout)
            .with_metrics(self.metrics.clone()))
    }

    /// Attach to an existing job with this controller's settings.
    pub fn attach(&self, sid: impl Into<String>) -> JobHandle {
        JobHandle::attach(self.transport.clone(), self.namespace.clone(), sid)
            .with_read_timeout(self.policy.read_timeout)
            .with_metrics(self.metrics.clone())
    }

    /// Run a non-realtime search to its final results.
    ///
    /// Realtime searches have no final results; submit them and drive
    /// [`Self::snapshots`] instead.
    pub async fn run(
        &self,
        request: SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchResults> {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let mode = request.mode();
        match mode {
            SearchMode::Oneshot => {
                let body = self.transport.oneshot(&self.namespace, &request).await?;
                let stream = self.wrap(body, ResultKind::FinalResults, request.max_count());
                Ok(SearchResults { job: None, stream })
            }
            SearchMode::Export => {
                let body = self.transport.export(&self.namespace, &request).await?;
                let stream = self.wrap(body, ResultKind::Export, request.max_count());
                Ok(SearchResults { job: None, stream })
            }
            SearchMode::Blocking => {
                let job = self.submit(request).await?;
                let stream = job.open_results(ResultKind::FinalResults).await?;
                Ok(SearchResults {
                    job: Some(job),
                    stream,
                })
            }
            SearchMode::Normal => {
                let mut job = self.submit(request).await?;
                if let Err(err) = self.wait(&mut job, cancel).await {
                    if !matches!(err, ClientError::JobFailed { .. }) {
                        if let Err(cancel_err) = job.cancel().await {
                            warn!(
                                sid = %job.sid(),
                                error = %cancel_err,
                                "Failed to cancel abandoned search job"
                            );
                        }
                    }
                    return Err(err);
                }
                let stream = job.open_results(ResultKind::FinalResults).await?;
                Ok(SearchResults {
                    job: Some(job),
                    stream,
                })
            }
            SearchMode::Realtime => Err(ClientError::InvalidRequest(
                "realtime searches never finish; use snapshots".to_string(),
            )),
        }
    }

    /// Refresh `job` until it is done.
    ///
    /// Transient failures are retried within the deadline; without a
    /// deadline every failure is returned.
    pub async fn wait(&self, job: &mut JobHandle, cancel: &CancellationToken) -> Result<()> {
        let started = Instant::now();
        let deadline = self.policy.max_wait.map(|max| started + max);
        let mode = job
            .request()
            .map(SearchRequest::mode)
            .unwrap_or(SearchMode::Normal);
        let mut polls: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                debug!(sid = %job.sid(), polls, "Wait for job cancelled");
                return Err(ClientError::Cancelled);
            }

            polls += 1;
            self.metrics.record_poll_iteration(mode);
            match job.refresh().await {
                Ok(status) => {
                    if status.has_failed() {
                        let message = format!("dispatch state {}", status.dispatch_state);
                        return Err(ClientError::JobFailed {
                            sid: job.sid().to_string(),
                            message,
                        });
                    }
                    if status.is_done {
                        debug!(
                            sid = %job.sid(),
                            polls,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Search job done"
                        );
                        return Ok(());
                    }
                }
                Err(err) if err.is_retryable() && deadline.is_some() => {
                    warn!(sid = %job.sid(), error = %err, "Status refresh failed; retrying");
                }
                Err(err) => return Err(err),
            }

            let mut pause = self.policy.poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(ClientError::OperationTimeout {
                        operation: "wait_for_job",
                        timeout: self.policy.max_wait.unwrap_or_default(),
                    });
                }
                pause = pause.min(deadline - now);
            }

            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    /// Fetch preview snapshots of `job` on the realtime interval.
    ///
    /// The stream ends when `cancel` fires, after `max_snapshots`, or after a
    /// final snapshot (a non-realtime job that finished). An error is yielded
    /// once and ends the stream. Cancellation never interrupts a fetch that is
    /// already in flight.
    pub fn snapshots<'a>(
        &'a self,
        job: &'a mut JobHandle,
        options: RealtimeOptions,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Snapshot>> + Send + 'a {
        let state = SnapshotLoop {
            controller: self,
            interval: options.interval.unwrap_or(self.policy.realtime_interval),
            max_snapshots: options.max_snapshots,
            job,
            cancel,
            sequence: 0,
            previous_field_count: None,
            finished: false,
        };
        futures::stream::unfold(state, |mut state| async move {
            let item = state.next_snapshot().await?;
            Some((item, state))
        })
    }

    fn wrap(
        &self,
        body: crate::transport::Body,
        kind: ResultKind,
        limit: Option<u64>,
    ) -> ResultStream {
        let mut stream = ResultStream::new(body, kind, true).with_metrics(self.metrics.clone());
        if let Some(timeout) = self.policy.read_timeout {
            stream = stream.with_read_timeout(timeout);
        }
        if let Some(limit) = limit {
            stream = stream.with_record_limit(limit);
        }
        stream
    }
}

struct SnapshotLoop<'a> {
    controller: &'a SearchController,
    job: &'a mut JobHandle,
    cancel: CancellationToken,
    interval: Duration,
    max_snapshots: Option<u64>,
    sequence: u64,
    previous_field_count: Option<usize>,
    finished: bool,
}

impl SnapshotLoop<'_> {
    async fn next_snapshot(&mut self) -> Option<Result<Snapshot>> {
        if self.finished {
            return None;
        }
        if self.max_snapshots.is_some_and(|max| self.sequence >= max) {
            self.finished = true;
            return None;
        }

        if self.sequence > 0 {
            tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        if self.cancel.is_cancelled() {
            debug!(sid = %self.job.sid(), snapshots = self.sequence, "Snapshot loop cancelled");
            self.finished = true;
            return None;
        }

        match self.fetch().await {
            Ok(snapshot) => {
                self.sequence += 1;
                if snapshot.is_final {
                    self.finished = true;
                }
                Some(Ok(snapshot))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }

    async fn fetch(&mut self) -> Result<Snapshot> {
        let mode = if self.job.is_realtime() {
            SearchMode::Realtime
        } else {
            SearchMode::Normal
        };
        self.controller.metrics.record_poll_iteration(mode);

        // Realtime jobs never finish, so their status adds nothing to a snapshot.
        if !self.job.is_realtime() {
            self.job.refresh().await?;
        }

        let mut stream = self.job.open_results(ResultKind::Preview).await?;
        let field_names = stream.field_names().await?.to_vec();
        let records = stream.collect_records().await?;
        let messages = stream.messages().to_vec();
        let is_final = stream.is_final();
        stream.close();

        let schema_changed = self
            .previous_field_count
            .is_some_and(|previous| previous != field_names.len());
        if schema_changed {
            debug!(
                sid = %self.job.sid(),
                sequence = self.sequence,
                fields = field_names.len(),
                "Snapshot schema changed"
            );
        }
        self.previous_field_count = Some(field_names.len());

        Ok(Snapshot {
            sequence: self.sequence,
            field_names,
            records,
            is_final,
            schema_changed,
            messages,
        })
    }
}
