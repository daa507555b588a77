//! Viewer contract

use contracts::ViewerConfig;
use point_store::PointCloud;

use crate::Result;

/// Window creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct WindowOptions {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    /// Background RGB, channels in [0, 1]
    pub background: [f32; 3],
    pub point_size: f32,
    /// Draw a unit axis triad at the origin
    pub show_axes: bool,
}

impl From<&ViewerConfig> for WindowOptions {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            name: config.window_name.clone(),
            width: config.width,
            height: config.height,
            left: config.left,
            top: config.top,
            background: config.background,
            point_size: config.point_size,
            show_axes: config.show_axes,
        }
    }
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

/// A 3D viewer displaying one point cloud geometry
///
/// Implementations are driven from a single render task. Only the session
/// that created the window may destroy it.
pub trait Viewer: Send {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    fn create_window(&mut self, options: &WindowOptions) -> Result<()>;

    /// Register the displayed geometry
    fn add_geometry(&mut self, cloud: &PointCloud) -> Result<()>;

    /// Replace the displayed geometry's contents
    fn update_geometry(&mut self, cloud: &PointCloud) -> Result<()>;

    /// Process window events
    ///
    /// Returns `false` once the user asked to close the window.
    fn poll_events(&mut self) -> bool;

    /// Redraw
    fn update_renderer(&mut self) -> Result<()>;

    fn destroy_window(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;
}

impl<V: Viewer + ?Sized> Viewer for Box<V> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn create_window(&mut self, options: &WindowOptions) -> Result<()> {
        (**self).create_window(options)
    }

    fn add_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        (**self).add_geometry(cloud)
    }

    fn update_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        (**self).update_geometry(cloud)
    }

    fn poll_events(&mut self) -> bool {
        (**self).poll_events()
    }

    fn update_renderer(&mut self) -> Result<()> {
        (**self).update_renderer()
    }

    fn destroy_window(&mut self) -> Result<()> {
        (**self).destroy_window()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
