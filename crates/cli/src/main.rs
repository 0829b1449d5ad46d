//! splunk-search - run Splunk searches from the command line.
//!
//! Responsibilities:
//! - Parse command-line arguments and environment variables.
//! - Run searches in any execution mode and print their records as they stream in.
//! - Map failures onto structured exit codes.
//!
//! Does NOT handle:
//! - REST API or streaming implementation (see `crates/client`).
//!
//! Invariants:
//! - `load_dotenv()` is called BEFORE CLI parsing to allow `.env` to provide clap defaults.
//! - Logs go to stderr; stdout carries only formatted results.

mod args;
mod cancellation;
mod commands;
mod error;
mod formatters;

use std::time::Duration;

use args::Cli;
use cancellation::{install_ctrl_c_handler, is_cancelled_error, print_cancelled_message};
use clap::Parser;
use commands::run_command;
use error::{ExitCode, ExitCodeExt};
use splunk_search_config::{Config, ConfigError, ConfigLoader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    // Load .env file BEFORE CLI parsing so clap env defaults can read .env values
    if let Err(e) = ConfigLoader::new().load_dotenv() {
        eprintln!("Failed to load environment: {}", e);
        std::process::exit(ExitCode::GeneralError.as_i32());
    }

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    let cancel = CancellationToken::new();
    install_ctrl_c_handler(cancel.clone());

    let exit_code = match run_command(cli.command, config, &cancel).await {
        Ok(()) => ExitCode::Success,
        Err(e) if is_cancelled_error(&e) => {
            print_cancelled_message();
            ExitCode::Interrupted
        }
        Err(e) => {
            eprintln!("{:#}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// Environment first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut loader = ConfigLoader::new().from_env()?;

    if let Some(url) = &cli.base_url {
        loader = loader.with_base_url(url.clone());
    }
    if let Some(token) = &cli.api_token {
        loader = loader.with_api_token(token.clone());
    }
    if let Some(key) = &cli.session_key {
        loader = loader.with_session_key(key.clone());
    }
    if let Some(timeout) = cli.timeout {
        loader = loader.with_timeout(Duration::from_secs(timeout));
    }
    if let Some(retries) = cli.max_retries {
        loader = loader.with_max_retries(retries);
    }
    if cli.skip_verify {
        loader = loader.with_skip_verify(true);
    }
    if let Some(owner) = &cli.owner {
        loader = loader.with_owner(owner.clone());
    }
    if let Some(app) = &cli.app {
        loader = loader.with_app(app.clone());
    }

    loader.build()
}
