//! Headless viewer: no window, periodic frame summaries in the log

use point_store::PointCloud;
use tracing::{debug, info};

use crate::{Result, Viewer, ViewerError, WindowOptions};

const DEFAULT_LOG_EVERY: u64 = 200;

/// Viewer for machines without a display
#[derive(Debug)]
pub struct HeadlessViewer {
    window: Option<WindowOptions>,
    frames: u64,
    points: usize,
    bounds: Option<([f32; 3], [f32; 3])>,
    log_every: u64,
}

impl HeadlessViewer {
    pub fn new() -> Self {
        Self::with_log_interval(DEFAULT_LOG_EVERY)
    }

    /// Log a summary every `frames` rendered frames
    pub fn with_log_interval(frames: u64) -> Self {
        Self {
            window: None,
            frames: 0,
            points: 0,
            bounds: None,
            log_every: frames.max(1),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn points(&self) -> usize {
        self.points
    }

    fn ensure_open(&self) -> Result<()> {
        self.window
            .as_ref()
            .map(|_| ())
            .ok_or(ViewerError::WindowNotOpen)
    }

    fn set_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        self.ensure_open()?;
        self.points = cloud.len();
        self.bounds = cloud.bounds();
        Ok(())
    }
}

impl Default for HeadlessViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewer for HeadlessViewer {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_window(&mut self, options: &WindowOptions) -> Result<()> {
        if self.window.is_some() {
            return Err(ViewerError::WindowAlreadyOpen {
                name: options.name.clone(),
            });
        }
        info!(
            window = %options.name,
            width = options.width,
            height = options.height,
            show_axes = options.show_axes,
            "Headless viewer window created"
        );
        self.window = Some(options.clone());
        Ok(())
    }

    fn add_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        self.set_geometry(cloud)
    }

    fn update_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        self.set_geometry(cloud)
    }

    fn poll_events(&mut self) -> bool {
        self.window.is_some()
    }

    fn update_renderer(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.frames += 1;
        if self.frames % self.log_every == 0 {
            info!(
                frames = self.frames,
                points = self.points,
                bounds = ?self.bounds,
                "Frame summary"
            );
        }
        Ok(())
    }

    fn destroy_window(&mut self) -> Result<()> {
        let window = self.window.take().ok_or(ViewerError::WindowNotOpen)?;
        debug!(window = %window.name, frames = self.frames, "Headless viewer window destroyed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.window.is_some()
    }
}
