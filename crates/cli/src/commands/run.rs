//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{SensorModality, SessionBlueprint, ShutdownSignal};
use std::time::Duration;
use tracing::{info, warn};
use viewer::{HeadlessViewer, Viewer};

use crate::cli::{RunArgs, ViewerKind};
use crate::error::CliError;
use crate::pipeline::Session;

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after applying CLI overrides")?;

    info!(
        host = %blueprint.world.carla_host,
        port = blueprint.world.carla_port,
        vehicle = %blueprint.vehicle.blueprint,
        lidar = %blueprint.lidar.id,
        modality = %blueprint.lidar.modality,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let viewer = build_viewer(args.viewer)?;
    let shutdown = ShutdownSignal::new();

    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            warn!("Received shutdown signal, stopping session...");
            shutdown.request();
        })
    };
    let timeout_task = (args.timeout > 0).then(|| {
        let shutdown = shutdown.clone();
        let timeout = Duration::from_secs(args.timeout);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            info!(timeout_secs = timeout.as_secs(), "Session timeout reached");
            shutdown.request();
        })
    });

    info!(viewer = viewer.name(), "Starting session...");

    #[cfg(feature = "real-carla")]
    let client = actor_factory::RealCarlaClient::new();
    #[cfg(not(feature = "real-carla"))]
    let client = {
        info!("Running in MOCK mode (no CARLA server required)");
        actor_factory::MockCarlaClient::new()
    };

    let result = Session::new(blueprint, client, viewer, shutdown).run().await;

    signal_task.abort();
    if let Some(task) = timeout_task {
        task.abort();
    }

    let stats = result.context("Session failed")?;
    info!(
        frames_rendered = stats.render.frames_rendered,
        clouds_published = stats.ingestion.clouds_published,
        ticks_skipped = stats.ingestion.ticks_skipped,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Session completed"
    );
    stats.print_summary();

    info!("LiDAR viewer finished");
    Ok(())
}

/// Apply CLI overrides on top of the loaded configuration
fn apply_overrides(blueprint: &mut SessionBlueprint, args: &RunArgs) {
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding CARLA host from CLI");
        blueprint.world.carla_host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding CARLA port from CLI");
        blueprint.world.carla_port = port;
    }
    if let Some(modality) = args.modality {
        let modality = SensorModality::from(modality);
        info!(%modality, "Overriding LiDAR modality from CLI");
        blueprint.lidar.modality = modality;
        // A configured blueprint of the other modality would deliver undecodable sweeps
        let mismatched = blueprint
            .lidar
            .blueprint
            .as_deref()
            .is_some_and(|custom| SensorModality::of_blueprint(custom) != modality);
        if mismatched {
            warn!(
                blueprint = ?blueprint.lidar.blueprint,
                replacement = modality.blueprint(),
                "Dropping LiDAR blueprint that does not match the overridden modality"
            );
            blueprint.lidar.blueprint = None;
        }
    }
    if args.max_frames > 0 {
        info!(max_frames = args.max_frames, "Overriding frame limit from CLI");
        blueprint.viewer.max_frames = Some(args.max_frames);
    }
}

fn build_viewer(kind: ViewerKind) -> Result<Box<dyn Viewer>> {
    match kind {
        ViewerKind::Headless => Ok(Box::new(HeadlessViewer::new())),
        #[cfg(feature = "rerun")]
        ViewerKind::Rerun => Ok(Box::new(viewer::RerunViewer::new("lidar-viewer"))),
        #[cfg(not(feature = "rerun"))]
        ViewerKind::Rerun => Err(CliError::ViewerUnavailable {
            backend: "rerun",
            feature: "rerun",
        }
        .into()),
    }
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never fires.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &SessionBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("World:");
    println!("  Map: {}", blueprint.world.map.as_deref().unwrap_or("(current)"));
    println!(
        "  CARLA: {}:{} (timeout {}s)",
        blueprint.world.carla_host, blueprint.world.carla_port, blueprint.world.timeout_sec
    );
    println!("\nVehicle:");
    println!(
        "  {} ({}){}",
        blueprint.vehicle.id,
        blueprint.vehicle.blueprint,
        if blueprint.vehicle.autopilot {
            " - autopilot"
        } else {
            ""
        }
    );
    println!("\nLiDAR:");
    println!(
        "  {} ({}, {}) at {} Hz",
        blueprint.lidar.id,
        blueprint.lidar.blueprint(),
        blueprint.lidar.modality,
        blueprint.lidar.frequency_hz
    );
    println!("\nViewer:");
    println!(
        "  {} {}x{}, tick {} ms, max frames: {}",
        blueprint.viewer.window_name,
        blueprint.viewer.width,
        blueprint.viewer.height,
        blueprint.viewer.tick_interval_ms,
        blueprint
            .viewer
            .max_frames
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ModalityArg;
    use std::path::PathBuf;

    const SESSION_TOML: &str = r#"
[world]
carla_port = 2000

[vehicle]
id = "ego"

[lidar]
id = "roof_lidar"
modality = "intensity"

[viewer]
tick_interval_ms = 1
max_frames = 5
"#;

    fn run_args(config: PathBuf) -> RunArgs {
        RunArgs {
            config,
            host: None,
            port: None,
            modality: None,
            max_frames: 0,
            timeout: 0,
            dry_run: false,
            viewer: ViewerKind::Headless,
            metrics_port: 0,
        }
    }

    fn write_config(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("session.toml");
        std::fs::write(&path, SESSION_TOML).unwrap();
        path
    }

    #[test]
    fn test_apply_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir);
        let mut blueprint = config_loader::ConfigLoader::load_from_path(&path).unwrap();

        let args = RunArgs {
            host: Some("10.0.0.7".into()),
            port: Some(3000),
            modality: Some(ModalityArg::Semantic),
            max_frames: 42,
            ..run_args(path)
        };
        apply_overrides(&mut blueprint, &args);

        assert_eq!(blueprint.world.carla_host, "10.0.0.7");
        assert_eq!(blueprint.world.carla_port, 3000);
        assert_eq!(blueprint.lidar.modality, SensorModality::Semantic);
        assert_eq!(blueprint.lidar.blueprint(), "sensor.lidar.ray_cast_semantic");
        assert_eq!(blueprint.viewer.max_frames, Some(42));
    }

    #[test]
    fn test_modality_override_drops_mismatched_blueprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir);
        let mut blueprint = config_loader::ConfigLoader::load_from_path(&path).unwrap();
        blueprint.lidar.blueprint = Some("sensor.lidar.ray_cast".into());

        let args = RunArgs {
            modality: Some(ModalityArg::Semantic),
            ..run_args(path.clone())
        };
        apply_overrides(&mut blueprint, &args);
        assert_eq!(blueprint.lidar.blueprint, None);
        assert_eq!(blueprint.lidar.blueprint(), "sensor.lidar.ray_cast_semantic");
        assert!(config_loader::ConfigLoader::validate(&blueprint).is_ok());

        // A matching override is kept
        blueprint.lidar.blueprint = Some("sensor.lidar.ray_cast_semantic".into());
        apply_overrides(&mut blueprint, &args);
        assert_eq!(
            blueprint.lidar.blueprint.as_deref(),
            Some("sensor.lidar.ray_cast_semantic")
        );
    }

    #[test]
    fn test_mismatched_blueprint_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(
            &path,
            SESSION_TOML.replace(
                "modality = \"intensity\"",
                "modality = \"semantic\"\nblueprint = \"sensor.lidar.ray_cast\"",
            ),
        )
        .unwrap();

        let err = config_loader::ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("lidar.blueprint"), "got: {err}");
    }

    #[test]
    fn test_zero_max_frames_keeps_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir);
        let mut blueprint = config_loader::ConfigLoader::load_from_path(&path).unwrap();

        apply_overrides(&mut blueprint, &run_args(path));
        assert_eq!(blueprint.viewer.max_frames, Some(5));
    }

    #[tokio::test]
    async fn test_missing_config() {
        let args = run_args(PathBuf::from("/nonexistent/session.toml"));
        let err = run_session(&args).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            dry_run: true,
            ..run_args(write_config(&dir))
        };
        assert!(run_session(&args).await.is_ok());
    }

    #[cfg(not(feature = "real-carla"))]
    #[tokio::test]
    async fn test_mock_session_to_frame_limit() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(write_config(&dir));
        assert!(run_session(&args).await.is_ok());
    }

    #[cfg(not(feature = "rerun"))]
    #[test]
    fn test_rerun_requires_feature() {
        let err = build_viewer(ViewerKind::Rerun).err().unwrap();
        assert!(err.to_string().contains("--features rerun"));
    }
}
