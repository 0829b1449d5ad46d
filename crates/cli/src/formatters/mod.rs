//! Output formatters for search results and job status.
//!
//! Responsibilities:
//! - Provide JSON, NDJSON and CSV renderings of records, realtime snapshots
//!   and job status.
//! - Render incrementally: records are formatted one at a time as the stream
//!   delivers them, so large result sets are never buffered.
//!
//! Does NOT handle:
//! - Direct printing to stdout (returns formatted strings).
//!
//! ## Empty-State Handling
//!
//! | Format | Empty result set |
//! |--------|------------------|
//! | JSON | `[]` |
//! | NDJSON | nothing |
//! | CSV | header row only |
//!
//! ## Multi-valued fields
//!
//! JSON and NDJSON render multi-valued fields as arrays. CSV joins the values
//! with a newline inside one quoted cell, and leaves missing fields empty.

mod csv;
mod json;
mod ndjson;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::ndjson::NdjsonFormatter;

use anyhow::Result;
use clap::ValueEnum;
use splunk_search::{JobStatus, Record, Snapshot};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// A JSON array of records (one JSON object per realtime snapshot)
    Json,
    /// One JSON object per line
    Ndjson,
    /// RFC 4180 CSV with a header row
    Csv,
}

/// Incremental formatter for one command's output.
///
/// Call order is `begin`, any number of `format_record`, then `finish`.
pub trait Formatter {
    /// Text emitted before the first record.
    fn begin(&mut self, field_names: &[String]) -> Result<String>;

    fn format_record(&mut self, record: &Record) -> Result<String>;

    /// Text emitted after the last record.
    fn finish(&mut self) -> Result<String>;

    /// Render one realtime snapshot as a self-contained unit.
    fn format_snapshot(&mut self, snapshot: &Snapshot) -> Result<String> {
        let mut output = self.begin(&snapshot.field_names)?;
        for record in &snapshot.records {
            output.push_str(&self.format_record(record)?);
        }
        output.push_str(&self.finish()?);
        Ok(output)
    }

    fn format_job_status(&self, status: &JobStatus) -> Result<String>;
}

/// Get a fresh formatter for the given output format.
pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter::default()),
        OutputFormat::Ndjson => Box::new(NdjsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter::default()),
    }
}
