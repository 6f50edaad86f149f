//! CLI command implementations
//!
//! This module contains the business logic for CLI commands,
//! extracted from main.rs for testability.

#![allow(clippy::missing_errors_doc)]

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::config::AnalysisConfig;
use crate::error::Result;

pub mod handlers;
pub use handlers::{Cli, Commands, Overrides};

/// Main CLI entrypoint - loads configuration and dispatches commands
pub fn entrypoint(cli: Cli) -> Result<()> {
    let base = AnalysisConfig::load(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Means {
            control,
            test,
            column,
            overrides,
        } => handlers::handle_means(&control, &test, &column, &overrides.apply(base)?)?,
        Commands::Ratios {
            successes,
            observations,
            value,
            overrides,
        } => handlers::handle_ratios(&successes, &observations, value, &overrides.apply(base)?)?,
        Commands::Check {
            input,
            column,
            overrides,
        } => handlers::handle_check(&input, &column, &overrides.apply(base)?)?,
    };

    println!("{output}");
    Ok(())
}

/// Run a parsed command line and map the outcome to an exit status
///
/// Errors are printed to stderr and give status 1.
pub fn run(cli: Cli) -> ExitCode {
    match entrypoint(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over the verbosity flag when set.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
