//! Job status command implementation.

use anyhow::Result;
use splunk_search::SearchController;
use tracing::info;

use crate::commands::{emit, flush};
use crate::formatters::{OutputFormat, get_formatter};

pub async fn run(controller: &SearchController, sid: &str, format: OutputFormat) -> Result<()> {
    info!(sid, "Fetching search job status");
    let mut job = controller.attach(sid);
    let status = job.refresh().await?;

    emit(&get_formatter(format).format_job_status(status)?)?;
    flush()
}
