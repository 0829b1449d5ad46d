//! NDJSON formatter implementation.
//!
//! Responsibilities:
//! - Format each record as a single line of JSON.
//!
//! Invariants:
//! - Each line is a valid JSON object
//! - Suitable for streaming and log processing pipelines

use anyhow::Result;
use serde::Serialize;
use splunk_search::{JobStatus, Record};

use crate::formatters::Formatter;

/// NDJSON formatter.
pub struct NdjsonFormatter;

fn to_ndjson_line<T: Serialize>(item: &T) -> Result<String> {
    let line = serde_json::to_string(item)?;
    Ok(line + "\n")
}

impl Formatter for NdjsonFormatter {
    fn begin(&mut self, _field_names: &[String]) -> Result<String> {
        Ok(String::new())
    }

    fn format_record(&mut self, record: &Record) -> Result<String> {
        to_ndjson_line(record)
    }

    fn finish(&mut self) -> Result<String> {
        Ok(String::new())
    }

    fn format_job_status(&self, status: &JobStatus) -> Result<String> {
        to_ndjson_line(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::OutputFormat;
    use crate::formatters::tests::{records, render};
    use splunk_search::testing::ResultsDocument;
    use splunk_search::DispatchState;

    #[test]
    fn test_one_line_per_record() {
        let records = records(ResultsDocument::new(["n"]).numbered_records("n", 3));
        let output = render(OutputFormat::Ndjson, &["n"], &records);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines, ["{\"n\":\"0\"}", "{\"n\":\"1\"}", "{\"n\":\"2\"}"]);
    }

    #[test]
    fn test_multi_value_is_array() {
        let records = records(ResultsDocument::new(["tag"]).multi_record("tag", ["web", "prod"]));
        let output = render(OutputFormat::Ndjson, &["tag"], &records);
        assert_eq!(output, "{\"tag\":[\"web\",\"prod\"]}\n");
    }

    #[test]
    fn test_job_status_is_single_line() {
        let status = JobStatus {
            sid: "1700000000.42".to_string(),
            dispatch_state: DispatchState::Done,
            is_done: true,
            result_count: 5,
            ..Default::default()
        };
        let output = NdjsonFormatter.format_job_status(&status).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("\"dispatchState\":\"DONE\""));
    }
}
