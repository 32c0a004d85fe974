//! Zowe CLI
//!
//! Resolves the connection session a command would use and manages team
//! configuration.
//!
//! ```bash
//! zowe session resolve --host lpar1.example.com --user alice
//! zowe config list
//! zowe config set profiles.base.properties.host lpar1.example.com
//! ```
//!
//! Log output goes to stderr. The level comes from
//! `ZOWE_IMPERATIVE_LOG_LEVEL`, then `RUST_LOG`, and defaults to `warn`.

mod args;
mod commands;
mod console;
mod router;

use args::Cli;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_LEVEL_VAR: &str = "ZOWE_IMPERATIVE_LOG_LEVEL";

fn log_filter() -> EnvFilter {
    std::env::var(LOG_LEVEL_VAR)
        .ok()
        .and_then(|level| EnvFilter::try_new(level.to_lowercase()).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match router::route(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
