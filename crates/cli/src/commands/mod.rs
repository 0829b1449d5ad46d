//! Command implementations.
//!
//! Each command receives a ready [`SearchController`] and the shared
//! cancellation token; connection setup happens once in [`controller_for`].

pub mod cancel;
pub mod search;
pub mod status;

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use splunk_search::{MetricsCollector, Namespace, PollPolicy, SearchController, SplunkClient};
use splunk_search_config::Config;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::args::Commands;

/// Build the HTTP client and controller for a loaded configuration.
pub fn controller_for(config: &Config) -> Result<SearchController> {
    let metrics = MetricsCollector::new();
    let client = SplunkClient::builder()
        .from_config(config)
        .metrics(metrics.clone())
        .build()?;
    info!("Connecting to {}", client.base_url());

    Ok(SearchController::new(Arc::new(client))
        .with_namespace(Namespace::from(&config.namespace))
        .with_policy(PollPolicy::from_config(&config.poll))
        .with_metrics(metrics))
}

/// Run one parsed command to completion.
pub async fn run_command(
    command: Commands,
    config: Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let controller = controller_for(&config)?;
    match command {
        Commands::Search {
            query,
            mode,
            earliest,
            latest,
            count,
            window,
            snapshots,
            format,
        } => {
            let options = search::SearchOptions {
                query,
                mode,
                earliest,
                latest,
                count,
                window,
                snapshots,
                format,
            };
            search::run(&controller, options, cancel).await
        }
        Commands::Status { sid, format } => status::run(&controller, &sid, format).await,
        Commands::Cancel { sid } => cancel::run(&controller, &sid).await,
    }
}

/// Write formatted output to stdout.
///
/// A closed pipe surfaces as an error instead of a panic.
pub(crate) fn emit(text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    Ok(())
}

pub(crate) fn flush() -> Result<()> {
    std::io::stdout().flush()?;
    Ok(())
}
