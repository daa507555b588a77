//! # LiDAR Viewer CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Session configuration loading and validation
//! - Session orchestration with guaranteed actor teardown
//! - Graceful shutdown on Ctrl-C / SIGTERM

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_session, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "LiDAR viewer CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Map verbosity flags onto the observability settings
fn init_logging(cli: &Cli) -> Result<()> {
    let (level, force_level) = match (cli.quiet, cli.verbose) {
        (true, _) => ("warn", true),
        (false, 0) => ("info", false),
        (false, 1) => ("debug", false),
        (false, _) => ("trace", false),
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: level.to_string(),
        force_level,
    })
}
