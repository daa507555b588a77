//! # Viewer
//!
//! The [`Viewer`] contract, the [`RenderLoop`] state machine that drives it
//! from the shared point cloud store, and the available backends:
//!
//! - [`HeadlessViewer`]: logs frame summaries, no display needed
//! - [`RecordingViewer`]: records calls for tests
//! - `RerunViewer` (feature `rerun`): streams to a spawned Rerun viewer

mod backends;
mod error;
mod render_loop;
mod viewer;

pub use backends::{HeadlessViewer, RecordingViewer, ViewerCall};
#[cfg(feature = "rerun")]
pub use backends::RerunViewer;
pub use error::{Result, ViewerError};
pub use render_loop::{RenderLoop, RenderLoopConfig, RenderState, RenderStats, TerminationReason};
pub use viewer::{Viewer, WindowOptions};
