//! JSON formatter implementation.
//!
//! Responsibilities:
//! - Stream records as one JSON array, element by element.
//! - Render realtime snapshots and job status as pretty-printed objects.
//!
//! Invariants:
//! - The concatenation of `begin`, every `format_record` and `finish` is one
//!   valid JSON array.

use anyhow::Result;
use serde::Serialize;
use splunk_search::{JobStatus, Record, Snapshot, SplunkMessage};

use crate::formatters::Formatter;

/// JSON formatter.
#[derive(Debug, Default)]
pub struct JsonFormatter {
    records_written: u64,
}

#[derive(Serialize)]
struct SnapshotOutput<'a> {
    sequence: u64,
    is_final: bool,
    schema_changed: bool,
    fields: &'a [String],
    records: &'a [Record],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    messages: &'a [SplunkMessage],
}

impl Formatter for JsonFormatter {
    fn begin(&mut self, _field_names: &[String]) -> Result<String> {
        self.records_written = 0;
        Ok("[".to_string())
    }

    fn format_record(&mut self, record: &Record) -> Result<String> {
        let separator = if self.records_written == 0 { "\n  " } else { ",\n  " };
        self.records_written += 1;
        Ok(format!("{}{}", separator, serde_json::to_string(record)?))
    }

    fn finish(&mut self) -> Result<String> {
        if self.records_written == 0 {
            Ok("]\n".to_string())
        } else {
            Ok("\n]\n".to_string())
        }
    }

    fn format_snapshot(&mut self, snapshot: &Snapshot) -> Result<String> {
        let output = SnapshotOutput {
            sequence: snapshot.sequence,
            is_final: snapshot.is_final,
            schema_changed: snapshot.schema_changed,
            fields: &snapshot.field_names,
            records: &snapshot.records,
            messages: &snapshot.messages,
        };
        Ok(serde_json::to_string_pretty(&output)? + "\n")
    }

    fn format_job_status(&self, status: &JobStatus) -> Result<String> {
        Ok(serde_json::to_string_pretty(status)? + "\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::OutputFormat;
    use crate::formatters::tests::{records, render};
    use splunk_search::testing::ResultsDocument;

    #[test]
    fn test_streamed_array_is_valid_json() {
        let records = records(
            ResultsDocument::new(["host", "count"])
                .record([("host", "web-01"), ("count", "1200")])
                .record([("host", "db-01"), ("count", "310")]),
        );
        let output = render(OutputFormat::Json, &["host", "count"], &records);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let array = parsed.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["host"], "web-01");
        assert_eq!(array[1]["count"], "310");
    }

    #[test]
    fn test_field_order_is_preserved() {
        let records = records(ResultsDocument::new(["z", "a"]).record([("z", "1"), ("a", "2")]));
        let output = render(OutputFormat::Json, &["z", "a"], &records);
        assert!(output.find("\"z\"").unwrap() < output.find("\"a\"").unwrap());
    }

    #[test]
    fn test_snapshot_object() {
        let snapshot = Snapshot {
            sequence: 3,
            field_names: vec!["n".to_string()],
            records: records(ResultsDocument::new(["n"]).numbered_records("n", 1)),
            is_final: false,
            schema_changed: true,
            messages: Vec::new(),
        };
        let output = JsonFormatter::default().format_snapshot(&snapshot).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["sequence"], 3);
        assert_eq!(parsed["schema_changed"], true);
        assert_eq!(parsed["records"][0]["n"], "0");
        assert!(parsed.get("messages").is_none());
    }
}
