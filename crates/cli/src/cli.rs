//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::SensorModality;
use std::path::PathBuf;

/// LiDAR Viewer - live colorized point clouds from a CARLA LiDAR
#[derive(Parser, Debug)]
#[command(
    name = "lidar-viewer",
    author,
    version,
    about = "Live colorized point-cloud viewer for CARLA LiDAR sensors",
    long_about = "Connects to CARLA, spawns a vehicle with a LiDAR attached, and renders \n\
                  the returns as a live point cloud colored by intensity or by semantic \n\
                  class. Spawned actors are destroyed on every exit path."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LIDAR_VIEWER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LIDAR_VIEWER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a viewer session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "session.toml",
        env = "LIDAR_VIEWER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override CARLA server host from configuration
    #[arg(long, env = "LIDAR_VIEWER_HOST")]
    pub host: Option<String>,

    /// Override CARLA server port from configuration
    #[arg(long, env = "LIDAR_VIEWER_PORT")]
    pub port: Option<u16>,

    /// Override the LiDAR modality from configuration
    #[arg(long, value_enum, env = "LIDAR_VIEWER_MODALITY")]
    pub modality: Option<ModalityArg>,

    /// Stop after this many rendered frames (0 = keep configured value)
    #[arg(long, default_value = "0", env = "LIDAR_VIEWER_MAX_FRAMES")]
    pub max_frames: u64,

    /// Session timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "LIDAR_VIEWER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Viewer backend
    #[arg(long, value_enum, default_value = "headless", env = "LIDAR_VIEWER_BACKEND")]
    pub viewer: ViewerKind,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "LIDAR_VIEWER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "session.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "session.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show LiDAR and vehicle blueprint attributes
    #[arg(long)]
    pub attributes: bool,
}

/// LiDAR modality override
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalityArg {
    /// Raw intensity returns
    Intensity,
    /// Semantically-labeled returns
    Semantic,
}

impl From<ModalityArg> for SensorModality {
    fn from(arg: ModalityArg) -> Self {
        match arg {
            ModalityArg::Intensity => SensorModality::Intensity,
            ModalityArg::Semantic => SensorModality::Semantic,
        }
    }
}

/// Viewer backend selection
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewerKind {
    /// Log frame summaries, no display
    #[default]
    Headless,
    /// Stream to a spawned Rerun viewer (feature `rerun`)
    Rerun,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from([
            "lidar-viewer",
            "run",
            "--config",
            "town03.toml",
            "--modality",
            "semantic",
            "--max-frames",
            "50",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("town03.toml"));
        assert_eq!(args.modality.map(SensorModality::from), Some(SensorModality::Semantic));
        assert_eq!(args.max_frames, 50);
        assert_eq!(args.viewer, ViewerKind::Headless);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["lidar-viewer", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
