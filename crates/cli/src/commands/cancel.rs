//! Job cancellation command implementation.

use anyhow::Result;
use splunk_search::SearchController;
use tracing::info;

use crate::commands::{emit, flush};

/// Cancel a job by sid. A job the server no longer knows counts as cancelled.
pub async fn run(controller: &SearchController, sid: &str) -> Result<()> {
    info!(sid, "Cancelling search job");
    let mut job = controller.attach(sid);
    job.cancel().await?;

    emit(&format!("Search job {} cancelled\n", job.sid()))?;
    flush()
}
