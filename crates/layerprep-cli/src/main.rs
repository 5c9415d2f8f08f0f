//! layerprep CLI - Command-line interface
//!
//! Thin adapter over the ingest pipeline for checking and preparing
//! zipped shapefiles from a terminal.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod output;
mod output_types;

use clap::Parser;
use cli::Cli;
use errors::CliError;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let json = cli.json;

    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let error = match error.downcast::<CliError>() {
                Ok(cli_error) => cli_error,
                Err(other) => errors::from_anyhow(other),
            };
            if json {
                error.display_json();
            } else {
                error.display();
            }
            ExitCode::FAILURE
        }
    }
}
