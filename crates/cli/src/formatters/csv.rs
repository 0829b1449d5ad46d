//! CSV formatter implementation.
//!
//! Responsibilities:
//! - Format records as RFC 4180 compliant CSV in the stream's field order.
//! - Repeat the header row only when a realtime snapshot changes the schema.

use anyhow::Result;
use splunk_search::{JobStatus, Record, Snapshot};

use crate::formatters::Formatter;

/// CSV formatter.
#[derive(Debug, Default)]
pub struct CsvFormatter {
    columns: Vec<String>,
    header_written: bool,
}

/// Encode one CSV row, quoting as needed.
fn csv_row<I, S>(cells: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(cells)?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

impl Formatter for CsvFormatter {
    fn begin(&mut self, field_names: &[String]) -> Result<String> {
        if self.header_written && self.columns == field_names {
            return Ok(String::new());
        }
        self.columns = field_names.to_vec();
        self.header_written = true;
        csv_row(&self.columns)
    }

    fn format_record(&mut self, record: &Record) -> Result<String> {
        let cells = self
            .columns
            .iter()
            .map(|column| record.get_all(column).join("\n"));
        csv_row(cells)
    }

    fn finish(&mut self) -> Result<String> {
        Ok(String::new())
    }

    fn format_snapshot(&mut self, snapshot: &Snapshot) -> Result<String> {
        if snapshot.schema_changed {
            self.header_written = false;
        }
        let mut output = self.begin(&snapshot.field_names)?;
        for record in &snapshot.records {
            output.push_str(&self.format_record(record)?);
        }
        Ok(output)
    }

    fn format_job_status(&self, status: &JobStatus) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(status)?;
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}
