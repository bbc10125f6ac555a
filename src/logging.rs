//! Tracing subscriber setup
//!
//! Logs go to stderr so stdout only carries tables and API responses.

use crate::config::LoggingConfig;
use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `verbose` forces debug; otherwise `RUST_LOG`
/// wins over the configured level.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let directives = filter_directives(config, verbose, std::env::var("RUST_LOG").ok());
    let filter =
        EnvFilter::try_new(&directives).map_err(|e| anyhow!("Invalid log filter '{directives}': {e}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };

    installed.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

fn filter_directives(config: &LoggingConfig, verbose: bool, rust_log: Option<String>) -> String {
    if verbose {
        return "cityweather=debug,warn".to_string();
    }

    match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives,
        _ => format!("cityweather={},warn", config.level),
    }
}
