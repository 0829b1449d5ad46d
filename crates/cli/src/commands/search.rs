//! Search command implementation.
//!
//! Responsibilities:
//! - Build a `SearchRequest` from command-line options.
//! - Stream final results of oneshot, export, blocking and normal searches.
//! - Print realtime snapshots until the snapshot bound or Ctrl+C, then cancel the job.
//!
//! Does NOT handle:
//! - Polling or snapshot cadence (see `SearchController`).

use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use splunk_search::{
    ClientError, MessageType, RealtimeOptions, ResultStream, SearchController, SearchMode,
    SearchRequest, SplunkMessage, redact_query,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cancellation::is_cancelled_error;
use crate::commands::{emit, flush};
use crate::formatters::{Formatter, OutputFormat, get_formatter};

/// Options of the `search` subcommand.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub query: String,
    pub mode: SearchMode,
    pub earliest: Option<String>,
    pub latest: Option<String>,
    pub count: Option<u64>,
    pub window: Option<u64>,
    pub snapshots: Option<u64>,
    pub format: OutputFormat,
}

impl SearchOptions {
    fn request(&self) -> Result<SearchRequest> {
        let mut builder = SearchRequest::builder(&self.query).mode(self.mode);
        if let Some(earliest) = &self.earliest {
            builder = builder.earliest_time(earliest);
        }
        if let Some(latest) = &self.latest {
            builder = builder.latest_time(latest);
        }
        if let Some(count) = self.count {
            builder = builder.max_count(count);
        }
        if let Some(window) = self.window {
            builder = builder.realtime_window(Duration::from_secs(window));
        }
        Ok(builder.build()?)
    }
}

pub async fn run(
    controller: &SearchController,
    options: SearchOptions,
    cancel: &CancellationToken,
) -> Result<()> {
    let request = options.request()?;
    info!(
        mode = %request.mode(),
        query = %redact_query(request.query()),
        "Executing search"
    );

    let mut formatter = get_formatter(options.format);
    if request.mode() == SearchMode::Realtime {
        run_realtime(controller, request, options.snapshots, formatter.as_mut(), cancel).await
    } else {
        run_to_completion(controller, request, formatter.as_mut(), cancel).await
    }
}

async fn run_to_completion(
    controller: &SearchController,
    request: SearchRequest,
    formatter: &mut dyn Formatter,
    cancel: &CancellationToken,
) -> Result<()> {
    let results = controller.run(request, cancel).await?;
    let mut job = results.job;
    let mut stream = results.stream;

    let outcome = print_stream(&mut stream, formatter, cancel).await;
    report_messages(stream.messages());
    stream.close();

    if let (Err(err), Some(job)) = (&outcome, job.as_mut()) {
        if is_cancelled_error(err) {
            if let Err(cancel_err) = job.cancel().await {
                warn!(sid = %job.sid(), error = %cancel_err, "Failed to cancel search job");
            }
        }
    }
    outcome?;
    flush()
}

async fn print_stream(
    stream: &mut ResultStream,
    formatter: &mut dyn Formatter,
    cancel: &CancellationToken,
) -> Result<()> {
    let fields = stream.field_names().await?.to_vec();
    emit(&formatter.begin(&fields)?)?;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled.into()),
            next = stream.next_record() => next?,
        };
        let Some(record) = next else { break };
        emit(&formatter.format_record(&record)?)?;
    }

    emit(&formatter.finish()?)?;
    info!(records = stream.records_read(), "Search results printed");
    Ok(())
}

async fn run_realtime(
    controller: &SearchController,
    request: SearchRequest,
    max_snapshots: Option<u64>,
    formatter: &mut dyn Formatter,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut job = controller.submit(request).await?;
    let guard = job.cancel_guard();
    info!(sid = %job.sid(), "Realtime search started; press Ctrl+C to stop");

    let options = RealtimeOptions {
        max_snapshots,
        interval: None,
    };
    let outcome: Result<()> = async {
        let snapshots = controller.snapshots(&mut job, options, cancel.clone());
        futures::pin_mut!(snapshots);
        while let Some(snapshot) = snapshots.next().await {
            let snapshot = snapshot?;
            if snapshot.schema_changed {
                warn!(sequence = snapshot.sequence, "Result fields changed between snapshots");
            }
            report_messages(&snapshot.messages);
            emit(&formatter.format_snapshot(&snapshot)?)?;
            flush()?;
        }
        Ok(())
    }
    .await;

    // Realtime jobs run until cancelled; release the job on every path.
    let released = guard.cancel().await;
    outcome?;
    released?;

    if cancel.is_cancelled() {
        return Err(ClientError::Cancelled.into());
    }
    Ok(())
}

/// Surface warnings and errors the service attached to the results.
fn report_messages(messages: &[SplunkMessage]) {
    for message in messages {
        if message.message_type.is_error() || message.message_type == MessageType::Warn {
            eprintln!("{}: {}", message.message_type, message.text);
        }
    }
}
