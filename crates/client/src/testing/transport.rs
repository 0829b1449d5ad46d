//! In-memory transport answering from scripted response queues.

use bytes::Bytes;
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::models::{JobStatus, ResultKind, SearchMode, SearchRequest};
use crate::transport::{Body, Namespace, ResponseBody, ResultsQuery, Transport};

/// A body that replays fixed bytes in fixed-size chunks.
#[derive(Debug, Clone)]
pub struct ScriptedBody {
    chunks: VecDeque<Bytes>,
    fail_after: Option<String>,
    chunk_delay: Option<Duration>,
}

impl ScriptedBody {
    /// The whole document as one chunk.
    pub fn whole(content: impl Into<String>) -> Self {
        Self::chunked(content, usize::MAX)
    }

    /// Split the document into chunks of `chunk_size` bytes (the last may be shorter).
    pub fn chunked(content: impl Into<String>, chunk_size: usize) -> Self {
        Self::from_chunks(
            content
                .into()
                .into_bytes()
                .chunks(chunk_size.max(1))
                .map(|c| c.to_vec()),
        )
    }

    /// Replay exactly these chunks.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks
                .into_iter()
                .map(|c| {
                    let bytes: Vec<u8> = c.into();
                    Bytes::from(bytes)
                })
                .collect(),
            fail_after: None,
            chunk_delay: None,
        }
    }

    /// After the scripted chunks, fail with a transport error instead of ending.
    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.fail_after = Some(message.into());
        self
    }

    /// Wait this long before every chunk (and before the end).
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub fn boxed(self) -> Body {
        Box::new(self)
    }
}

impl ResponseBody for ScriptedBody {
    fn next_chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>>> {
        Box::pin(async move {
            if let Some(delay) = self.chunk_delay {
                tokio::time::sleep(delay).await;
            }
            match self.chunks.pop_front() {
                Some(chunk) => Ok(Some(chunk)),
                None => match self.fail_after.take() {
                    Some(message) => Err(ClientError::Transport(message)),
                    None => Ok(None),
                },
            }
        })
    }
}

/// One call observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateJob { query: String, mode: SearchMode },
    Oneshot { query: String },
    Export { query: String },
    JobStatus { sid: String },
    JobResults {
        sid: String,
        kind: ResultKind,
        offset: u64,
        count: Option<u64>,
    },
    DeleteJob { sid: String },
}

#[derive(Default)]
struct Script {
    create: VecDeque<Result<String>>,
    oneshot: VecDeque<Result<ScriptedBody>>,
    export: VecDeque<Result<ScriptedBody>>,
    status: VecDeque<Result<JobStatus>>,
    last_status: Option<JobStatus>,
    results: VecDeque<Result<ScriptedBody>>,
    delete: VecDeque<Result<()>>,
    calls: Vec<Call>,
}

/// A [`Transport`] that answers each operation from its own queue, in call order.
///
/// - `job_status` repeats the last successful status once its queue runs dry.
/// - `delete_job` answers `Ok(())` once its queue runs dry.
/// - Any other empty queue answers a `Transport` error naming the operation.
///
/// Every call is logged and can be inspected with [`Self::calls`].
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
    results_delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every `job_results` call, to model a slow in-flight request.
    pub fn with_results_delay(mut self, delay: Duration) -> Self {
        self.results_delay = Some(delay);
        self
    }

    pub fn push_create(&self, response: Result<String>) -> &Self {
        self.lock().create.push_back(response);
        self
    }

    pub fn push_oneshot(&self, response: Result<ScriptedBody>) -> &Self {
        self.lock().oneshot.push_back(response);
        self
    }

    pub fn push_export(&self, response: Result<ScriptedBody>) -> &Self {
        self.lock().export.push_back(response);
        self
    }

    pub fn push_status(&self, response: Result<JobStatus>) -> &Self {
        self.lock().status.push_back(response);
        self
    }

    pub fn push_results(&self, response: Result<ScriptedBody>) -> &Self {
        self.lock().results.push_back(response);
        self
    }

    pub fn push_delete(&self, response: Result<()>) -> &Self {
        self.lock().delete.push_back(response);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::JobStatus { .. }))
    }

    pub fn results_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::JobResults { .. }))
    }

    pub fn delete_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::DeleteJob { .. }))
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // A panicking test thread must not hide the script from the others.
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn exhausted(operation: &str) -> ClientError {
    ClientError::Transport(format!("no scripted response for {operation}"))
}

impl Transport for ScriptedTransport {
    fn create_job<'a>(
        &'a self,
        _namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let mut script = self.lock();
            script.calls.push(Call::CreateJob {
                query: request.query().to_string(),
                mode: request.mode(),
            });
            script
                .create
                .pop_front()
                .unwrap_or_else(|| Err(exhausted("create_job")))
        })
    }

    fn oneshot<'a>(
        &'a self,
        _namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<Body>> {
        Box::pin(async move {
            let mut script = self.lock();
            script.calls.push(Call::Oneshot {
                query: request.query().to_string(),
            });
            script
                .oneshot
                .pop_front()
                .unwrap_or_else(|| Err(exhausted("oneshot")))
                .map(ScriptedBody::boxed)
        })
    }

    fn export<'a>(
        &'a self,
        _namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<Body>> {
        Box::pin(async move {
            let mut script = self.lock();
            script.calls.push(Call::Export {
                query: request.query().to_string(),
            });
            script
                .export
                .pop_front()
                .unwrap_or_else(|| Err(exhausted("export")))
                .map(ScriptedBody::boxed)
        })
    }

    fn job_status<'a>(
        &'a self,
        _namespace: &'a Namespace,
        sid: &'a str,
    ) -> BoxFuture<'a, Result<JobStatus>> {
        Box::pin(async move {
            let mut script = self.lock();
            script.calls.push(Call::JobStatus {
                sid: sid.to_string(),
            });
            let response = match script.status.pop_front() {
                Some(response) => response,
                None => script.last_status.clone().ok_or_else(|| exhausted("job_status")),
            };
            if let Ok(status) = &response {
                script.last_status = Some(status.clone());
            }
            response
        })
    }

    fn job_results<'a>(
        &'a self,
        _namespace: &'a Namespace,
        sid: &'a str,
        query: &'a ResultsQuery,
    ) -> BoxFuture<'a, Result<Body>> {
        Box::pin(async move {
            let response = {
                let mut script = self.lock();
                script.calls.push(Call::JobResults {
                    sid: sid.to_string(),
                    kind: query.kind,
                    offset: query.offset,
                    count: query.count,
                });
                script
                    .results
                    .pop_front()
                    .unwrap_or_else(|| Err(exhausted("job_results")))
            };
            if let Some(delay) = self.results_delay {
                tokio::time::sleep(delay).await;
            }
            response.map(ScriptedBody::boxed)
        })
    }

    fn delete_job<'a>(
        &'a self,
        _namespace: &'a Namespace,
        sid: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut script = self.lock();
            script.calls.push(Call::DeleteJob {
                sid: sid.to_string(),
            });
            script.delete.pop_front().unwrap_or(Ok(()))
        })
    }
}
