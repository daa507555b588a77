//! Rerun viewer backend
//!
//! Streams the cloud to a spawned Rerun viewer. Rerun owns its own window,
//! so closing it is not observable here; the session quits via the signal.

use point_store::PointCloud;
use rerun::{Arrows3D, Color, Points3D, RecordingStream, RecordingStreamBuilder};
use tracing::{debug, info};

use crate::{Result, Viewer, ViewerError, WindowOptions};

const CLOUD_ENTITY: &str = "world/lidar";
const AXES_ENTITY: &str = "world/axes";

fn backend_error(message: &str, err: rerun::RecordingStreamError) -> ViewerError {
    ViewerError::Backend {
        message: format!("{message}: {err}"),
        source: Some(Box::new(err)),
    }
}

/// Viewer backed by a Rerun recording stream
pub struct RerunViewer {
    application_id: String,
    rec: Option<RecordingStream>,
    point_radius: f32,
    frame: i64,
}

impl RerunViewer {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            rec: None,
            point_radius: 0.05,
            frame: 0,
        }
    }

    fn rec(&self) -> Result<&RecordingStream> {
        self.rec.as_ref().ok_or(ViewerError::WindowNotOpen)
    }

    fn log_cloud(&mut self, cloud: &PointCloud) -> Result<()> {
        let frame = self.frame;
        let radius = self.point_radius;
        let rec = self.rec()?;
        rec.set_time_sequence("frame", frame);

        let colors = cloud.colors().iter().map(|c| {
            let [r, g, b] = c.to_rgb8();
            Color::from_rgb(r, g, b)
        });
        let points = Points3D::new(cloud.positions().iter().copied())
            .with_colors(colors)
            .with_radii([radius]);
        rec.log(CLOUD_ENTITY, &points)
            .map_err(|e| backend_error("failed to log point cloud", e))?;

        self.frame += 1;
        Ok(())
    }
}

impl Viewer for RerunViewer {
    fn name(&self) -> &'static str {
        "rerun"
    }

    fn create_window(&mut self, options: &WindowOptions) -> Result<()> {
        if self.rec.is_some() {
            return Err(ViewerError::WindowAlreadyOpen {
                name: options.name.clone(),
            });
        }

        let rec = RecordingStreamBuilder::new(self.application_id.as_str())
            .spawn()
            .map_err(|e| ViewerError::Backend {
                message: format!("failed to spawn rerun viewer: {e}"),
                source: Some(Box::new(e)),
            })?;

        rec.log_static("world", &rerun::ViewCoordinates::RIGHT_HAND_Z_UP())
            .map_err(|e| backend_error("failed to log view coordinates", e))?;

        if options.show_axes {
            let axes = Arrows3D::from_vectors([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
                .with_colors([
                    Color::from_rgb(255, 0, 0),
                    Color::from_rgb(0, 255, 0),
                    Color::from_rgb(0, 0, 255),
                ]);
            rec.log_static(AXES_ENTITY, &axes)
                .map_err(|e| backend_error("failed to log axes", e))?;
        }

        // Rerun sizes points in world units; one viewer pixel maps to ~5 cm.
        self.point_radius = 0.05 * options.point_size;
        self.rec = Some(rec);
        info!(
            application_id = %self.application_id,
            window = %options.name,
            "Rerun viewer spawned"
        );
        Ok(())
    }

    fn add_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        self.log_cloud(cloud)
    }

    fn update_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        self.log_cloud(cloud)
    }

    fn poll_events(&mut self) -> bool {
        self.rec.is_some()
    }

    fn update_renderer(&mut self) -> Result<()> {
        self.rec().map(|_| ())
    }

    fn destroy_window(&mut self) -> Result<()> {
        // Dropping the stream flushes pending data.
        self.rec.take().ok_or(ViewerError::WindowNotOpen)?;
        debug!(frames = self.frame, "Rerun recording closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.rec.is_some()
    }
}
