//! Render loop state machine
//!
//! ```text
//! Idle ──first store write──▶ Polling ──┐
//!  │                            ▲       │ tick
//!  │                            └───────┘
//!  └──── quit / window closed / frame limit ────▶ Terminating
//! ```
//!
//! The loop never renders before the store's first write and sleeps for
//! the tick interval after every iteration.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{ShutdownSignal, ViewerConfig};
use observability::{RunningStats, StatsSummary};
use point_store::PointCloudStore;
use tracing::{debug, info};

use crate::{Result, Viewer};

/// Render loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Waiting for the first cloud
    Idle,
    /// Refreshing the viewer every tick
    Polling,
    /// Done; no further store reads
    Terminating,
}

/// Why the loop entered `Terminating`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Session shutdown signal was set
    QuitSignal,
    /// The viewer reported the window closed
    WindowClosed,
    /// `max_frames` frames were rendered
    FrameLimit,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::QuitSignal => "quit signal",
            Self::WindowClosed => "window closed",
            Self::FrameLimit => "frame limit reached",
        })
    }
}

/// Render loop tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLoopConfig {
    /// Sleep after every iteration
    pub tick_interval: Duration,
    /// Stop after this many rendered frames
    pub max_frames: Option<u64>,
}

impl Default for RenderLoopConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(5),
            max_frames: None,
        }
    }
}

impl From<&ViewerConfig> for RenderLoopConfig {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            max_frames: config.max_frames,
        }
    }
}

/// What the loop did
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    /// Iterations spent in `Idle`
    pub idle_iterations: u64,
    /// Frames drawn in `Polling`
    pub frames_rendered: u64,
    /// Frames that pushed a new cloud to the viewer
    pub geometry_updates: u64,
    /// Points in the last pushed cloud
    pub last_points: usize,
    pub termination: Option<TerminationReason>,
    /// Per-frame wall time (ms), excluding the tick sleep
    pub frame_ms: StatsSummary,
}

/// Cooperative render loop reading from a [`PointCloudStore`]
pub struct RenderLoop {
    store: Arc<PointCloudStore>,
    shutdown: ShutdownSignal,
    config: RenderLoopConfig,
    state: RenderState,
    shown_generation: u64,
    stats: RenderStats,
    frame_times: RunningStats,
}

impl RenderLoop {
    pub fn new(
        store: Arc<PointCloudStore>,
        shutdown: ShutdownSignal,
        config: RenderLoopConfig,
    ) -> Self {
        Self {
            store,
            shutdown,
            config,
            state: RenderState::Idle,
            shown_generation: 0,
            stats: RenderStats::default(),
            frame_times: RunningStats::default(),
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            frame_ms: StatsSummary::from(&self.frame_times),
            ..self.stats.clone()
        }
    }

    /// One iteration, without the trailing sleep
    ///
    /// The quit signal is checked once, at the start.
    pub fn step<V: Viewer + ?Sized>(&mut self, viewer: &mut V) -> Result<RenderState> {
        if self.state == RenderState::Terminating {
            return Ok(self.state);
        }
        if self.shutdown.is_requested() {
            self.terminate(TerminationReason::QuitSignal);
            return Ok(self.state);
        }

        if self.state == RenderState::Idle {
            if !self.store.has_data() {
                self.stats.idle_iterations += 1;
                if !viewer.poll_events() {
                    self.terminate(TerminationReason::WindowClosed);
                }
                return Ok(self.state);
            }
            debug!(
                idle_iterations = self.stats.idle_iterations,
                "First point cloud received, starting to render"
            );
            self.state = RenderState::Polling;
        }

        self.render_frame(viewer)?;
        Ok(self.state)
    }

    fn render_frame<V: Viewer + ?Sized>(&mut self, viewer: &mut V) -> Result<()> {
        let started = Instant::now();

        let snapshot = self.store.snapshot();
        let updated = snapshot.generation != self.shown_generation;
        if updated {
            viewer.update_geometry(&snapshot.cloud)?;
            self.shown_generation = snapshot.generation;
            self.stats.geometry_updates += 1;
            self.stats.last_points = snapshot.cloud.len();
        }

        if !viewer.poll_events() {
            self.terminate(TerminationReason::WindowClosed);
            return Ok(());
        }
        viewer.update_renderer()?;

        let frame_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.frame_times.push(frame_ms);
        self.stats.frames_rendered += 1;
        observability::record_render_frame(frame_ms, updated);

        if self
            .config
            .max_frames
            .is_some_and(|max| self.stats.frames_rendered >= max)
        {
            self.terminate(TerminationReason::FrameLimit);
        }
        Ok(())
    }

    fn terminate(&mut self, reason: TerminationReason) {
        self.state = RenderState::Terminating;
        self.stats.termination = Some(reason);
        info!(
            %reason,
            frames_rendered = self.stats.frames_rendered,
            geometry_updates = self.stats.geometry_updates,
            "Render loop terminating"
        );
    }

    /// Run until `Terminating`
    ///
    /// Viewer errors end the loop and are returned to the caller.
    pub async fn run<V: Viewer + ?Sized>(&mut self, viewer: &mut V) -> Result<RenderStats> {
        debug!(
            viewer = viewer.name(),
            tick_ms = self.config.tick_interval.as_millis() as u64,
            max_frames = ?self.config.max_frames,
            "Render loop started"
        );

        while self.step(viewer)? != RenderState::Terminating {
            tokio::time::sleep(self.config.tick_interval).await;
        }
        Ok(self.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordingViewer, ViewerCall, WindowOptions};
    use contracts::ColorTriple;

    fn setup(max_frames: Option<u64>) -> (Arc<PointCloudStore>, ShutdownSignal, RenderLoop) {
        let store = Arc::new(PointCloudStore::new());
        let shutdown = ShutdownSignal::new();
        let render_loop = RenderLoop::new(
            Arc::clone(&store),
            shutdown.clone(),
            RenderLoopConfig {
                tick_interval: Duration::from_millis(1),
                max_frames,
            },
        );
        (store, shutdown, render_loop)
    }

    fn open_viewer() -> RecordingViewer {
        let mut viewer = RecordingViewer::new();
        viewer.create_window(&WindowOptions::default()).unwrap();
        viewer
    }

    #[test]
    fn test_idle_until_first_write() {
        let (store, _shutdown, mut render_loop) = setup(None);
        let mut viewer = open_viewer();

        for _ in 0..3 {
            assert_eq!(render_loop.step(&mut viewer).unwrap(), RenderState::Idle);
        }
        assert_eq!(viewer.count(|c| matches!(c, ViewerCall::UpdateGeometry { .. })), 0);
        assert_eq!(viewer.count(|c| matches!(c, ViewerCall::UpdateRenderer)), 0);

        store
            .write(vec![[1.0, 2.0, 3.0]], vec![ColorTriple::default()])
            .unwrap();
        assert_eq!(render_loop.step(&mut viewer).unwrap(), RenderState::Polling);
        assert_eq!(
            viewer.count(|c| matches!(c, ViewerCall::UpdateGeometry { points: 1 })),
            1
        );
        assert_eq!(render_loop.stats().idle_iterations, 3);
    }

    #[test]
    fn test_geometry_pushed_only_on_new_generation() {
        let (store, _shutdown, mut render_loop) = setup(None);
        let mut viewer = open_viewer();
        store.write(vec![], vec![]).unwrap();

        for _ in 0..4 {
            render_loop.step(&mut viewer).unwrap();
        }
        store
            .write(vec![[0.0; 3]; 2], vec![ColorTriple::default(); 2])
            .unwrap();
        render_loop.step(&mut viewer).unwrap();

        let stats = render_loop.stats();
        assert_eq!(stats.frames_rendered, 5);
        assert_eq!(stats.geometry_updates, 2);
        assert_eq!(stats.last_points, 2);
    }

    #[test]
    fn test_quit_signal_terminates_from_any_state() {
        let (_store, shutdown, mut render_loop) = setup(None);
        let mut viewer = open_viewer();

        shutdown.request();
        assert_eq!(
            render_loop.step(&mut viewer).unwrap(),
            RenderState::Terminating
        );
        assert_eq!(
            render_loop.stats().termination,
            Some(TerminationReason::QuitSignal)
        );
        // No reads or viewer calls once terminating
        let calls = viewer.calls().len();
        render_loop.step(&mut viewer).unwrap();
        assert_eq!(viewer.calls().len(), calls);
    }

    #[test]
    fn test_window_close_terminates() {
        let (store, _shutdown, mut render_loop) = setup(None);
        let mut viewer = RecordingViewer::new().close_after_polls(2);
        viewer.create_window(&WindowOptions::default()).unwrap();
        store.write(vec![], vec![]).unwrap();

        assert_eq!(render_loop.step(&mut viewer).unwrap(), RenderState::Polling);
        assert_eq!(render_loop.step(&mut viewer).unwrap(), RenderState::Polling);
        assert_eq!(
            render_loop.step(&mut viewer).unwrap(),
            RenderState::Terminating
        );
        assert_eq!(
            render_loop.stats().termination,
            Some(TerminationReason::WindowClosed)
        );
    }

    #[tokio::test]
    async fn test_run_until_frame_limit() {
        let (store, _shutdown, mut render_loop) = setup(Some(5));
        let mut viewer = open_viewer();
        store
            .write(vec![[0.0; 3]; 3], vec![ColorTriple::default(); 3])
            .unwrap();

        let stats = render_loop.run(&mut viewer).await.unwrap();
        assert_eq!(stats.frames_rendered, 5);
        assert_eq!(stats.termination, Some(TerminationReason::FrameLimit));
        assert_eq!(stats.frame_ms.count, 5);
        assert_eq!(render_loop.state(), RenderState::Terminating);
    }

    #[tokio::test]
    async fn test_run_stops_on_signal_while_idle() {
        let (_store, shutdown, mut render_loop) = setup(None);
        let mut viewer = open_viewer();

        let trigger = shutdown.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.request();
        });

        let stats = render_loop.run(&mut viewer).await.unwrap();
        handle.await.unwrap();
        assert_eq!(stats.frames_rendered, 0);
        assert!(stats.idle_iterations > 0);
        assert_eq!(stats.termination, Some(TerminationReason::QuitSignal));
    }
}
