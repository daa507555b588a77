mod headless;
mod recording;
#[cfg(feature = "rerun")]
mod rerun_viewer;

pub use headless::HeadlessViewer;
pub use recording::{RecordingViewer, ViewerCall};
#[cfg(feature = "rerun")]
pub use rerun_viewer::RerunViewer;
