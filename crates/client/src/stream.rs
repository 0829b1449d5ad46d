//! Result streams: a response body bound to a record decoder.
//!
//! Responsibilities:
//! - Own one response body and read it in chunks on demand.
//! - Surface the schema, the final/preview flag and search messages.
//! - End quietly when a live snapshot's body stops mid-record.
//! - Drop rows of `preview='1'` containers in export bodies, keeping only the
//!   final table.
//!
//! Does NOT handle:
//! - Retrying failed reads; a failed stream is discarded and a new one opened
//!   from the [`crate::JobHandle`].
//!
//! Invariants:
//! - Single reader: every read goes through `&mut self`.
//! - Finite and not restartable: after the end or an error, `next_record`
//!   keeps returning `Ok(None)`.
//! - The body is released as soon as the stream ends, fails or is dropped.

use futures::Stream;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::decoder::{Decoded, DecoderState, RecordDecoder};
use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{ResultKind, SplunkMessage};
use crate::record::Record;
use crate::transport::Body;

/// A single-pass sequence of records read from one response body.
pub struct ResultStream {
    body: Option<Body>,
    decoder: RecordDecoder,
    kind: ResultKind,
    final_by_status: bool,
    read_timeout: Option<Duration>,
    record_limit: Option<u64>,
    expected_count: Option<u64>,
    records_read: u64,
    preview_records_skipped: u64,
    finished: bool,
    metrics: MetricsCollector,
}

impl fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultStream")
            .field("kind", &self.kind)
            .field("is_final", &self.is_final())
            .field("records_read", &self.records_read)
            .field("state", &self.decoder.state())
            .field("finished", &self.finished)
            .finish()
    }
}

impl ResultStream {
    /// Wrap a body.
    ///
    /// `is_final` is what the caller knows from job status: true for export
    /// streams and results of a done job, false for previews of a running job.
    pub fn new(body: Body, kind: ResultKind, is_final: bool) -> Self {
        Self {
            body: Some(body),
            decoder: RecordDecoder::new(),
            kind,
            final_by_status: is_final,
            read_timeout: None,
            record_limit: None,
            expected_count: None,
            records_read: 0,
            preview_records_skipped: 0,
            finished: false,
            metrics: MetricsCollector::disabled(),
        }
    }

    /// Bound how long a single chunk read may wait on a stalled connection.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Stop after this many records even if the body carries more.
    pub fn with_record_limit(mut self, limit: u64) -> Self {
        self.record_limit = Some(limit);
        self
    }

    /// Result count advertised by job status; advisory only.
    pub fn with_expected_count(mut self, count: u64) -> Self {
        self.expected_count = Some(count);
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// False for a snapshot of a still-running job.
    ///
    /// Starts from the job status the stream was opened with; once the
    /// container header is read, a `preview='1'` attribute also makes it false.
    pub fn is_final(&self) -> bool {
        self.final_by_status && self.decoder.is_preview() != Some(true)
    }

    /// Advisory record count. A lower bound until [`Self::is_final`] is true.
    pub fn expected_count(&self) -> Option<u64> {
        self.expected_count
    }

    /// Records handed out so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Search messages seen in the body so far.
    pub fn messages(&self) -> &[SplunkMessage] {
        self.decoder.messages()
    }

    pub fn decoder_state(&self) -> DecoderState {
        self.decoder.state()
    }

    /// Field names of the result set, reading the header if needed.
    ///
    /// Reads only as many chunks as it takes to see the header. A body that
    /// ends before any header yields an empty list.
    pub async fn field_names(&mut self) -> Result<&[String]> {
        loop {
            match self.decoder.decode_header() {
                Ok(true) => break,
                Ok(false) => match self.read_chunk().await? {
                    Some(chunk) => self.decoder.feed(&chunk),
                    None => break,
                },
                Err(err) => {
                    self.metrics.record_malformed_stream(self.kind);
                    self.finish();
                    return Err(err.into());
                }
            }
        }
        Ok(self.decoder.field_names().unwrap_or(&[]))
    }

    /// Pull the next record, reading more of the body as needed.
    ///
    /// `Ok(None)` marks the end, including a snapshot cut inside a record.
    pub async fn next_record(&mut self) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }
        if let Some(limit) = self.record_limit {
            if self.records_read >= limit {
                self.finish();
                return Ok(None);
            }
        }

        loop {
            match self.decoder.try_decode_next() {
                // Export bodies of reporting searches repeat the table in
                // preview containers before the final one.
                Decoded::Record(_) if self.skips_preview_records() => {
                    self.preview_records_skipped += 1;
                }
                Decoded::Record(record) => {
                    self.records_read += 1;
                    self.metrics.record_records_decoded(self.kind, 1);
                    return Ok(Some(record));
                }
                Decoded::Malformed(err) => {
                    warn!(
                        kind = %self.kind,
                        offset = err.offset,
                        message = %err.message,
                        "Result stream is malformed"
                    );
                    self.metrics.record_malformed_stream(self.kind);
                    self.finish();
                    return Err(err.into());
                }
                Decoded::NeedMoreData | Decoded::EndOfStream => {
                    match self.read_chunk().await {
                        Ok(Some(chunk)) => self.decoder.feed(&chunk),
                        Ok(None) => {
                            if self.decoder.has_partial_input() {
                                debug!(
                                    kind = %self.kind,
                                    records = self.records_read,
                                    consumed = self.decoder.state().consumed,
                                    "Result body ended inside a partial document"
                                );
                                self.metrics.record_truncated_tail(self.kind);
                            }
                            if self.preview_records_skipped > 0 {
                                debug!(
                                    skipped = self.preview_records_skipped,
                                    "Dropped records of export preview containers"
                                );
                            }
                            self.finish();
                            return Ok(None);
                        }
                        Err(err) => {
                            self.finish();
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    fn skips_preview_records(&self) -> bool {
        self.kind == ResultKind::Export && self.decoder.is_preview() == Some(true)
    }

    /// Read every remaining record.
    pub async fn collect_records(&mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Convert into a `futures::Stream` of records.
    ///
    /// An error is yielded once and ends the stream.
    pub fn into_records(self) -> impl Stream<Item = Result<Record>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            match stream.next_record().await {
                Ok(Some(record)) => Some((Ok(record), stream)),
                Ok(None) => None,
                Err(err) => Some((Err(err), stream)),
            }
        })
    }

    /// Release the body. Valid at any point, including before the first read.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.finished = true;
        self.body = None;
    }

    async fn read_chunk(&mut self) -> Result<Option<bytes::Bytes>> {
        let Some(body) = self.body.as_mut() else {
            return Ok(None);
        };

        let chunk = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, body.next_chunk())
                .await
                .map_err(|_| ClientError::OperationTimeout {
                    operation: "stream_read",
                    timeout: limit,
                })
                .and_then(|chunk| chunk),
            None => body.next_chunk().await,
        };

        if !matches!(chunk, Ok(Some(_))) {
            self.body = None;
        }
        chunk
    }
}
