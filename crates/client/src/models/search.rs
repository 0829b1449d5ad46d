//! Search request models.
//!
//! This module provides the immutable description of a search to submit and
//! the enums selecting execution mode, result kind and wire format.
//!
//! # What this module handles:
//! - `SearchRequest` construction and validation
//! - The explicit field-to-wire-name table used when submitting a search
//!
//! # What this module does NOT handle:
//! - Sending requests (see [`crate::endpoints::search`])
//! - Polling or streaming (see [`crate::controller`])

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// How a search is executed by the service and consumed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Submit returns immediately; the client polls until done.
    #[default]
    Normal,
    /// Submit blocks server-side until the job is done.
    Blocking,
    /// One round trip: submit, wait and results in a single response.
    Oneshot,
    /// Sliding time window; only preview snapshots, never done.
    Realtime,
    /// Results streamed as produced without creating a job handle.
    Export,
}

impl SearchMode {
    /// True when submitting in this mode yields a job id.
    pub fn creates_job(&self) -> bool {
        matches!(self, Self::Normal | Self::Blocking | Self::Realtime)
    }

    /// Value of the `exec_mode` parameter, when the mode uses the job endpoint.
    pub(crate) fn exec_mode(&self) -> Option<&'static str> {
        match self {
            Self::Normal | Self::Realtime => Some("normal"),
            Self::Blocking => Some("blocking"),
            Self::Oneshot => Some("oneshot"),
            Self::Export => None,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchMode::Normal => "normal",
            SearchMode::Blocking => "blocking",
            SearchMode::Oneshot => "oneshot",
            SearchMode::Realtime => "realtime",
            SearchMode::Export => "export",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for SearchMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "blocking" => Ok(Self::Blocking),
            "oneshot" => Ok(Self::Oneshot),
            "realtime" | "rt" => Ok(Self::Realtime),
            "export" => Ok(Self::Export),
            other => Err(ClientError::InvalidRequest(format!(
                "unknown search mode '{other}'"
            ))),
        }
    }
}

/// Which result set of a job to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// The completed result set of a done job.
    FinalResults,
    /// Whatever the running job has materialized so far.
    Preview,
    /// The full result set streamed in one response, without paging.
    Export,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResultKind::FinalResults => "results",
            ResultKind::Preview => "results_preview",
            ResultKind::Export => "export",
        };
        write!(f, "{}", s)
    }
}

/// Output format for search results.
///
/// Only `Xml` is decoded into records; the others are available as raw bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    Xml,
    Json,
    JsonCols,
    JsonRows,
    Csv,
    Raw,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputMode::Xml => "xml",
            OutputMode::Json => "json",
            OutputMode::JsonCols => "json_cols",
            OutputMode::JsonRows => "json_rows",
            OutputMode::Csv => "csv",
            OutputMode::Raw => "raw",
        };
        write!(f, "{}", s)
    }
}

/// An immutable description of a search to submit.
///
/// Build with [`SearchRequest::builder`]; once built the request is never
/// mutated, and a [`crate::JobHandle`] keeps the request it was submitted with.
///
/// # Invariants
/// - `query` is non-empty.
/// - Realtime requests always carry real-time time bounds (`rt...`), and
///   non-realtime requests never do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    mode: SearchMode,
    earliest_time: Option<String>,
    latest_time: Option<String>,
    max_count: Option<u64>,
    output_mode: OutputMode,
    auto_cancel: Option<u64>,
}

impl SearchRequest {
    /// Start building a request for the given SPL query.
    pub fn builder(query: impl Into<String>) -> SearchRequestBuilder {
        SearchRequestBuilder::new(query)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn earliest_time(&self) -> Option<&str> {
        self.earliest_time.as_deref()
    }

    pub fn latest_time(&self) -> Option<&str> {
        self.latest_time.as_deref()
    }

    /// Result-count cap; bounds how many records are materialized.
    pub fn max_count(&self) -> Option<u64> {
        self.max_count
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn auto_cancel(&self) -> Option<u64> {
        self.auto_cancel
    }

    /// Search-definition parameters in wire form.
    ///
    /// This is the single table mapping request fields to Splunk parameter
    /// names. `output_mode` is not included: the transport chooses it per call.
    pub fn form_params(&self) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = vec![("search", self.query.clone())];

        if let Some(exec_mode) = self.mode.exec_mode() {
            params.push(("exec_mode", exec_mode.to_string()));
        }
        if self.mode == SearchMode::Realtime {
            params.push(("search_mode", "realtime".to_string()));
        }
        if let Some(earliest) = &self.earliest_time {
            params.push(("earliest_time", earliest.clone()));
        }
        if let Some(latest) = &self.latest_time {
            params.push(("latest_time", latest.clone()));
        }
        if let Some(max_count) = self.max_count {
            match self.mode {
                // Oneshot and export answer with results directly; `count`
                // caps what the response carries.
                SearchMode::Oneshot | SearchMode::Export => {
                    params.push(("count", max_count.to_string()))
                }
                _ => params.push(("max_count", max_count.to_string())),
            }
        }
        if let Some(auto_cancel) = self.auto_cancel {
            params.push(("auto_cancel", auto_cancel.to_string()));
        }

        params
    }
}

/// Builder for [`SearchRequest`].
#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    query: String,
    mode: SearchMode,
    earliest_time: Option<String>,
    latest_time: Option<String>,
    realtime_window: Option<Duration>,
    max_count: Option<u64>,
    output_mode: OutputMode,
    auto_cancel: Option<u64>,
}

impl SearchRequestBuilder {
    fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: SearchMode::default(),
            earliest_time: None,
            latest_time: None,
            realtime_window: None,
            max_count: None,
            output_mode: OutputMode::default(),
            auto_cancel: None,
        }
    }

    pub fn mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the time bounds (absolute timestamps or relative tokens such as `-24h`, `now`, `rt-5m`).
    pub fn time_bounds(mut self, earliest: impl Into<String>, latest: impl Into<String>) -> Self {
        self.earliest_time = Some(earliest.into());
        self.latest_time = Some(latest.into());
        self
    }

    pub fn earliest_time(mut self, earliest: impl Into<String>) -> Self {
        self.earliest_time = Some(earliest.into());
        self
    }

    pub fn latest_time(mut self, latest: impl Into<String>) -> Self {
        self.latest_time = Some(latest.into());
        self
    }

    /// Sliding window for realtime searches ("last N seconds" to "now").
    ///
    /// Only used when no explicit realtime bounds are given.
    pub fn realtime_window(mut self, window: Duration) -> Self {
        self.realtime_window = Some(window);
        self
    }

    pub fn max_count(mut self, max: u64) -> Self {
        self.max_count = Some(max);
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Ask the service to cancel the job after this many seconds of inactivity.
    pub fn auto_cancel(mut self, seconds: u64) -> Self {
        self.auto_cancel = Some(seconds);
        self
    }

    /// Validate and build the request.
    pub fn build(self) -> Result<SearchRequest> {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return Err(ClientError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }

        // Empty bounds make Splunk answer 400, so they are treated as unset.
        let mut earliest_time = self.earliest_time.filter(|s| !s.trim().is_empty());
        let mut latest_time = self.latest_time.filter(|s| !s.trim().is_empty());

        if self.mode == SearchMode::Realtime {
            if earliest_time.is_none() {
                let secs = self
                    .realtime_window
                    .map(|w| w.as_secs().max(1))
                    .unwrap_or(DEFAULT_REALTIME_WINDOW_SECS);
                earliest_time = Some(format!("rt-{secs}s"));
            }
            if latest_time.is_none() {
                latest_time = Some("rt".to_string());
            }
            for bound in [&earliest_time, &latest_time].into_iter().flatten() {
                if !is_realtime_token(bound) {
                    return Err(ClientError::InvalidRequest(format!(
                        "realtime searches need real-time bounds, got '{bound}'"
                    )));
                }
            }
        } else {
            for bound in [&earliest_time, &latest_time].into_iter().flatten() {
                if is_realtime_token(bound) {
                    return Err(ClientError::InvalidRequest(format!(
                        "real-time bound '{bound}' requires realtime mode"
                    )));
                }
            }
        }

        Ok(SearchRequest {
            query,
            mode: self.mode,
            earliest_time,
            latest_time,
            max_count: self.max_count,
            output_mode: self.output_mode,
            auto_cancel: self.auto_cancel,
        })
    }
}

/// Window used when a realtime request names neither bounds nor a window.
const DEFAULT_REALTIME_WINDOW_SECS: u64 = 60;

/// True for Splunk real-time time modifiers: `rt`, `rt-5m`, `rtnow`, `rt@m`.
fn is_realtime_token(value: &str) -> bool {
    value.trim().to_ascii_lowercase().starts_with("rt")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_normal_request_params() {
        let request = SearchRequest::builder("search index=main")
            .time_bounds("-24h", "now")
            .max_count(1000)
            .auto_cancel(30)
            .build()
            .unwrap();
        let params = request.form_params();
        assert_eq!(param(&params, "search"), Some("search index=main"));
        assert_eq!(param(&params, "exec_mode"), Some("normal"));
        assert_eq!(param(&params, "earliest_time"), Some("-24h"));
        assert_eq!(param(&params, "latest_time"), Some("now"));
        assert_eq!(param(&params, "max_count"), Some("1000"));
        assert_eq!(param(&params, "auto_cancel"), Some("30"));
        assert_eq!(param(&params, "search_mode"), None);
    }

    #[test]
    fn test_oneshot_uses_count() {
        let request = SearchRequest::builder("search index=_internal | head 5")
            .mode(SearchMode::Oneshot)
            .max_count(5)
            .build()
            .unwrap();
        let params = request.form_params();
        assert_eq!(param(&params, "exec_mode"), Some("oneshot"));
        assert_eq!(param(&params, "count"), Some("5"));
        assert_eq!(param(&params, "max_count"), None);
    }

    #[test]
    fn test_export_has_no_exec_mode() {
        let request = SearchRequest::builder("search *")
            .mode(SearchMode::Export)
            .build()
            .unwrap();
        assert_eq!(param(&request.form_params(), "exec_mode"), None);
        assert!(!request.mode().creates_job());
    }

    #[test]
    fn test_realtime_defaults_window() {
        let request = SearchRequest::builder("search index=main")
            .mode(SearchMode::Realtime)
            .realtime_window(Duration::from_secs(30))
            .build()
            .unwrap();
        assert_eq!(request.earliest_time(), Some("rt-30s"));
        assert_eq!(request.latest_time(), Some("rt"));
        assert_eq!(param(&request.form_params(), "search_mode"), Some("realtime"));
    }

    #[test]
    fn test_realtime_rejects_historical_bounds() {
        let err = SearchRequest::builder("search index=main")
            .mode(SearchMode::Realtime)
            .time_bounds("-5m", "now")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn test_historical_rejects_realtime_bounds() {
        let err = SearchRequest::builder("search index=main")
            .time_bounds("rt-5m", "rt")
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn test_empty_query_rejected() {
        let err = SearchRequest::builder("   ").build().unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn test_empty_bounds_are_skipped() {
        let request = SearchRequest::builder("search *")
            .time_bounds("  ", "")
            .build()
            .unwrap();
        assert_eq!(request.earliest_time(), None);
        assert_eq!(param(&request.form_params(), "latest_time"), None);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Oneshot".parse::<SearchMode>().unwrap(), SearchMode::Oneshot);
        assert_eq!("rt".parse::<SearchMode>().unwrap(), SearchMode::Realtime);
        assert!("later".parse::<SearchMode>().is_err());
    }
}
