//! CLI argument definitions and parsing.
//!
//! Responsibilities:
//! - Define the CLI structure using clap derive macros.
//! - Parse command-line arguments and environment variables.
//!
//! Non-responsibilities:
//! - Does not execute commands (see `commands` module).
//! - Does not validate connection settings (see `splunk_search_config::ConfigLoader`).

use clap::{Parser, Subcommand};
use splunk_search::SearchMode;

use crate::formatters::OutputFormat;

#[derive(Parser)]
#[command(name = "splunk-search")]
#[command(about = "Run Splunk searches and stream their results", long_about = None)]
#[command(version)]
#[command(
    after_help = "Examples:\n  splunk-search search 'search index=_internal | head 10'\n  splunk-search search 'search index=main' --mode oneshot --format csv\n  splunk-search search 'search index=main' --mode realtime --window 30 --snapshots 5\n  splunk-search status 1700000000.42\n  splunk-search cancel 1700000000.42\n"
)]
pub struct Cli {
    /// Base URL of the Splunk server (e.g., https://localhost:8089)
    #[arg(short, long, global = true, env = "SPLUNK_BASE_URL")]
    pub base_url: Option<String>,

    /// API token for authentication
    #[arg(short, long, global = true, env = "SPLUNK_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Session key from an earlier login (used when no API token is given)
    #[arg(long, global = true, env = "SPLUNK_SESSION_KEY", hide_env_values = true)]
    pub session_key: Option<String>,

    /// Connection timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum number of retries for rate-limited or unavailable responses
    #[arg(long, global = true)]
    pub max_retries: Option<usize>,

    /// Skip TLS certificate verification (for self-signed certificates)
    #[arg(long, global = true)]
    pub skip_verify: bool,

    /// Namespace owner (user) searches run as
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Namespace app searches run in
    #[arg(long, global = true)]
    pub app: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a search query and print its results
    Search {
        /// The search query (e.g., 'search index=main | head 10')
        query: String,

        /// Execution mode: normal, blocking, oneshot, export or realtime
        #[arg(short, long, default_value = "normal", value_parser = parse_mode)]
        mode: SearchMode,

        /// Earliest time bound (e.g., -24h, 2024-01-01T00:00:00)
        #[arg(short, long)]
        earliest: Option<String>,

        /// Latest time bound (e.g., now)
        #[arg(short, long)]
        latest: Option<String>,

        /// Maximum number of results to return
        #[arg(short, long)]
        count: Option<u64>,

        /// Realtime window in seconds (realtime mode only)
        #[arg(long, value_name = "SECS")]
        window: Option<u64>,

        /// Stop after this many realtime snapshots (runs until Ctrl+C when omitted)
        #[arg(long, value_name = "N")]
        snapshots: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Ndjson)]
        format: OutputFormat,
    },

    /// Show the status of an existing search job
    Status {
        /// The search job ID
        sid: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Cancel an existing search job
    Cancel {
        /// The search job ID
        sid: String,
    },
}

fn parse_mode(value: &str) -> Result<SearchMode, String> {
    value.parse().map_err(|e: splunk_search::ClientError| e.to_string())
}
