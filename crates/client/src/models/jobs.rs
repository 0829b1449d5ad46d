//! Search job status models.
//!
//! This module contains the typed status snapshot of a search job as reported
//! by `GET /search/jobs/{sid}`.
//!
//! # What this module handles:
//! - Job status fields needed by polling (done/failed flags, dispatch state, counts)
//! - Normalization of Splunk's string-or-number and string-or-bool encodings
//!
//! # What this module does NOT handle:
//! - Polling logic (see [`crate::controller`])
//! - HTTP transport (see [`crate::endpoints::search`])

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side dispatch state of a search job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchState {
    Queued,
    Parsing,
    Running,
    Paused,
    Finalizing,
    Failed,
    Done,
    #[serde(other)]
    #[default]
    Unknown,
}

impl DispatchState {
    /// True once the job will not produce any further results.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Parsing => "PARSING",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Finalizing => "FINALIZING",
            Self::Failed => "FAILED",
            Self::Done => "DONE",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Search job status snapshot.
///
/// Counts are advisory while the job is running: `result_preview_count` in
/// particular is a lower bound until `is_done` is true.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct JobStatus {
    #[serde(default)]
    pub sid: String,
    #[serde(rename = "dispatchState", default)]
    pub dispatch_state: DispatchState,
    #[serde(
        rename = "isDone",
        default,
        deserialize_with = "crate::serde_helpers::bool_from_any"
    )]
    pub is_done: bool,
    #[serde(
        rename = "isFailed",
        default,
        deserialize_with = "crate::serde_helpers::bool_from_any"
    )]
    pub is_failed: bool,
    #[serde(
        rename = "isFinalized",
        default,
        deserialize_with = "crate::serde_helpers::bool_from_any"
    )]
    pub is_finalized: bool,
    #[serde(
        rename = "isPaused",
        default,
        deserialize_with = "crate::serde_helpers::bool_from_any"
    )]
    pub is_paused: bool,
    #[serde(
        rename = "isRealTimeSearch",
        default,
        deserialize_with = "crate::serde_helpers::bool_from_any"
    )]
    pub is_realtime: bool,
    #[serde(
        rename = "doneProgress",
        default,
        deserialize_with = "crate::serde_helpers::f64_from_string_or_number"
    )]
    pub done_progress: f64,
    #[serde(
        rename = "runDuration",
        default,
        deserialize_with = "crate::serde_helpers::f64_from_string_or_number"
    )]
    pub run_duration: f64,
    #[serde(
        rename = "eventCount",
        default,
        deserialize_with = "crate::serde_helpers::u64_from_string_or_number"
    )]
    pub event_count: u64,
    #[serde(
        rename = "resultCount",
        default,
        deserialize_with = "crate::serde_helpers::u64_from_string_or_number"
    )]
    pub result_count: u64,
    #[serde(
        rename = "resultPreviewCount",
        default,
        deserialize_with = "crate::serde_helpers::u64_from_string_or_number"
    )]
    pub result_preview_count: u64,
    #[serde(
        rename = "scanCount",
        default,
        deserialize_with = "crate::serde_helpers::u64_from_string_or_number"
    )]
    pub scan_count: u64,
    #[serde(
        default,
        deserialize_with = "crate::serde_helpers::u64_from_string_or_number"
    )]
    pub ttl: u64,
}

impl JobStatus {
    /// Status of a job that was just created and has not been refreshed yet.
    pub fn submitted(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            dispatch_state: DispatchState::Queued,
            ..Default::default()
        }
    }

    /// Status of a job whose creation call only returned once it finished
    /// (blocking execution).
    pub fn completed(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            dispatch_state: DispatchState::Done,
            is_done: true,
            done_progress: 1.0,
            ..Default::default()
        }
    }

    /// True when the service reported the job as failed, by flag or by state.
    pub fn has_failed(&self) -> bool {
        self.is_failed || self.dispatch_state == DispatchState::Failed
    }

    /// Best known result count for the current snapshot.
    ///
    /// Uses the preview count while the job is still running.
    pub fn advisory_result_count(&self) -> u64 {
        if self.is_done {
            self.result_count
        } else {
            self.result_preview_count.max(self.result_count)
        }
    }
}
