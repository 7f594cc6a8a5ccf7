//! Geoflow CLI - Command-line interface
//!
//! Runs profile and print jobs against the remote services and exposes the
//! scale and reference-system math for inspection.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod output;
mod output_types;
mod progress;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(commands::execute(cli)));

    if let Err(e) = result {
        errors::from_anyhow(e).display();
        std::process::exit(1);
    }
}
