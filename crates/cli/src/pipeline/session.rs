//! Viewer session - owns every resource acquired for one run.
//!
//! Startup order: connect, configure world, spawn vehicle, spawn and attach
//! the LiDAR, register the acquisition callback, open the viewer window with
//! an empty cloud, run the render loop. Whatever happens in between (error,
//! panic, quit signal), `finalize` runs exactly once: stop the sensor
//! stream, destroy actors in reverse spawn order, close the window.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use actor_factory::{ActorFactory, CarlaClient, TeardownReport};
use anyhow::{Context, Result};
use colorizer::ColorScheme;
use contracts::{SensorSource, SessionBlueprint, ShutdownSignal};
use futures::FutureExt;
use ingestion::{AcquisitionCallback, IngestionMetrics};
use point_store::{PointCloud, PointCloudStore};
use tracing::{debug, error, info, warn};
use viewer::{RenderLoop, RenderLoopConfig, RenderStats, Viewer, WindowOptions};

use super::SessionStats;
use crate::error::CliError;

/// One viewer session
pub struct Session<C: CarlaClient, V: Viewer> {
    blueprint: SessionBlueprint,
    factory: ActorFactory<C>,
    viewer: V,
    shutdown: ShutdownSignal,
    store: Arc<PointCloudStore>,
    sensor: Option<Box<dyn SensorSource>>,
    ingestion: Option<Arc<IngestionMetrics>>,
}

impl<C: CarlaClient, V: Viewer> Session<C, V> {
    pub fn new(blueprint: SessionBlueprint, client: C, viewer: V, shutdown: ShutdownSignal) -> Self {
        Self {
            blueprint,
            factory: ActorFactory::new(client),
            viewer,
            shutdown,
            store: Arc::new(PointCloudStore::new()),
            sensor: None,
            ingestion: None,
        }
    }

    /// Run the session to completion
    ///
    /// Teardown has already happened when this returns, on success and on
    /// failure alike. A failure reported through the shutdown signal is
    /// surfaced as an error even though the render loop exited normally.
    pub async fn run(mut self) -> Result<SessionStats> {
        let started = Instant::now();

        let outcome = AssertUnwindSafe(self.drive()).catch_unwind().await;
        let teardown = self.finalize().await;

        let render = match outcome {
            Ok(Ok(render)) => render,
            Ok(Err(e)) => return Err(e),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(%message, "session panicked, actors were torn down");
                return Err(CliError::session_panicked(message).into());
            }
        };

        if let Some(reason) = self.shutdown.failure() {
            return Err(CliError::session_aborted(reason).into());
        }

        Ok(SessionStats {
            duration: started.elapsed(),
            render,
            ingestion: self
                .ingestion
                .as_ref()
                .map(|m| m.snapshot())
                .unwrap_or_default(),
            teardown,
        })
    }

    async fn drive(&mut self) -> Result<RenderStats> {
        let bp = &self.blueprint;

        // Built before connecting so a broken palette costs no actors
        let scheme = Arc::new(
            ColorScheme::from_config(&bp.colorization).context("Failed to build color scheme")?,
        );

        info!(
            host = %bp.world.carla_host,
            port = bp.world.carla_port,
            "Connecting to CARLA server..."
        );
        self.factory.connect(&bp.world).await.with_context(|| {
            format!(
                "Failed to connect to CARLA at {}:{}",
                bp.world.carla_host, bp.world.carla_port
            )
        })?;
        self.factory
            .configure_world(&bp.world)
            .await
            .context("Failed to configure world")?;

        let vehicle_id = self
            .factory
            .spawn_vehicle(&bp.vehicle)
            .await
            .context("Failed to spawn vehicle")?;
        let lidar_id = self
            .factory
            .spawn_lidar(&bp.lidar, vehicle_id)
            .await
            .context("Failed to spawn lidar")?;

        let sensor = self
            .factory
            .sensor_source(lidar_id, &bp.lidar)
            .context("Failed to open lidar stream")?;
        let callback = AcquisitionCallback::new(
            bp.lidar.id.as_str().into(),
            bp.lidar.modality,
            scheme,
            Arc::clone(&self.store),
            self.shutdown.clone(),
        );
        self.ingestion = Some(callback.metrics());
        sensor.listen(callback.into_callback());
        // Stored before anything else can fail so finalize stops it
        self.sensor = Some(sensor);
        info!(
            sensor_id = %bp.lidar.id,
            modality = %bp.lidar.modality,
            "LiDAR stream registered"
        );

        self.viewer
            .create_window(&WindowOptions::from(&bp.viewer))
            .context("Failed to create viewer window")?;
        self.viewer
            .add_geometry(&PointCloud::empty())
            .context("Failed to register point cloud geometry")?;

        let mut render_loop = RenderLoop::new(
            Arc::clone(&self.store),
            self.shutdown.clone(),
            RenderLoopConfig::from(&bp.viewer),
        );
        let stats = render_loop
            .run(&mut self.viewer)
            .await
            .context("Render loop failed")?;
        Ok(stats)
    }

    /// Release everything acquired by `drive`
    async fn finalize(&mut self) -> TeardownReport {
        if let Some(sensor) = self.sensor.take() {
            sensor.stop();
            debug!(sensor_id = sensor.sensor_id(), "LiDAR stream stopped");
        }

        let report = self.factory.teardown().await;
        if !report.is_clean() {
            warn!(failed = ?report.failed, "Some actors could not be destroyed");
        }

        if self.viewer.is_open() {
            match self.viewer.destroy_window() {
                Ok(()) => debug!(viewer = self.viewer.name(), "Viewer window destroyed"),
                Err(e) => warn!(error = %e, "Failed to destroy viewer window"),
            }
        }

        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
