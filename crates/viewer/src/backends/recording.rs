//! Recording viewer: a test double that logs every call

use std::sync::{Arc, Mutex, PoisonError};

use point_store::PointCloud;

use crate::{Result, Viewer, ViewerError, WindowOptions};

/// One recorded viewer call
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCall {
    CreateWindow { name: String },
    AddGeometry { points: usize },
    UpdateGeometry { points: usize },
    PollEvents,
    UpdateRenderer,
    DestroyWindow,
}

/// Viewer that records calls into a shared log
///
/// Clones share the log, so a test can keep one handle while the session
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingViewer {
    calls: Arc<Mutex<Vec<ViewerCall>>>,
    open: bool,
    polls: u64,
    close_after_polls: Option<u64>,
}

impl RecordingViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the window closed after `n` successful polls
    pub fn close_after_polls(mut self, n: u64) -> Self {
        self.close_after_polls = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<ViewerCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded calls matching `pred`
    pub fn count(&self, pred: impl Fn(&ViewerCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| pred(call))
            .count()
    }

    fn record(&self, call: ViewerCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(ViewerError::WindowNotOpen)
        }
    }
}

impl Viewer for RecordingViewer {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn create_window(&mut self, options: &WindowOptions) -> Result<()> {
        if self.open {
            return Err(ViewerError::WindowAlreadyOpen {
                name: options.name.clone(),
            });
        }
        self.open = true;
        self.record(ViewerCall::CreateWindow {
            name: options.name.clone(),
        });
        Ok(())
    }

    fn add_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        self.ensure_open()?;
        self.record(ViewerCall::AddGeometry {
            points: cloud.len(),
        });
        Ok(())
    }

    fn update_geometry(&mut self, cloud: &PointCloud) -> Result<()> {
        self.ensure_open()?;
        self.record(ViewerCall::UpdateGeometry {
            points: cloud.len(),
        });
        Ok(())
    }

    fn poll_events(&mut self) -> bool {
        self.record(ViewerCall::PollEvents);
        if !self.open {
            return false;
        }
        if self.close_after_polls.is_some_and(|n| self.polls >= n) {
            return false;
        }
        self.polls += 1;
        true
    }

    fn update_renderer(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.record(ViewerCall::UpdateRenderer);
        Ok(())
    }

    fn destroy_window(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.open = false;
        self.record(ViewerCall::DestroyWindow);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let handle = RecordingViewer::new();
        let mut viewer = handle.clone();

        viewer.create_window(&WindowOptions::default()).unwrap();
        viewer.add_geometry(&PointCloud::empty()).unwrap();
        viewer.destroy_window().unwrap();

        assert_eq!(
            handle.calls(),
            vec![
                ViewerCall::CreateWindow {
                    name: "Carla Lidar".into()
                },
                ViewerCall::AddGeometry { points: 0 },
                ViewerCall::DestroyWindow,
            ]
        );
    }

    #[test]
    fn test_requires_open_window() {
        let mut viewer = RecordingViewer::new();
        assert!(matches!(
            viewer.update_renderer(),
            Err(ViewerError::WindowNotOpen)
        ));
        assert!(!viewer.poll_events());

        viewer.create_window(&WindowOptions::default()).unwrap();
        assert!(matches!(
            viewer.create_window(&WindowOptions::default()),
            Err(ViewerError::WindowAlreadyOpen { .. })
        ));
    }
}
