/// FileTriage CLI: command-line frontend.
///
/// This crate parses arguments, sets up logging and drives
/// `filetriage-core`. No analysis logic lives here.
pub mod cli;
pub mod commands;
pub mod output;

pub use cli::Cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the log filter before `RUST_LOG`.
pub const LOG_ENV: &str = "FILETRIAGE_LOG";

/// Build the log filter: `--debug` wins, then `FILETRIAGE_LOG`, then
/// `RUST_LOG`, then `info`.
pub fn log_filter(debug: bool) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// findings.
pub fn init_logging(debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(debug))
        .with_writer(std::io::stderr)
        .init();
}

/// Parse the process arguments, initialise logging and run the command.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "FileTriage starting");
    commands::dispatch(cli)
}
