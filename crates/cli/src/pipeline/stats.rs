//! Session statistics.

use std::time::Duration;

use actor_factory::TeardownReport;
use ingestion::MetricsSnapshot;
use viewer::RenderStats;

/// Statistics from a completed session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Wall time from session start to the end of teardown
    pub duration: Duration,

    /// Render loop counters and frame timing
    pub render: RenderStats,

    /// Acquisition counters (buffers received, clouds published, ticks skipped)
    pub ingestion: MetricsSnapshot,

    /// Actors destroyed during teardown
    pub teardown: TeardownReport,
}

impl SessionStats {
    /// Rendered frames per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.render.frames_rendered as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Skipped ticks as a percentage of received buffers
    pub fn skip_rate(&self) -> f64 {
        if self.ingestion.buffers_received > 0 {
            (self.ingestion.ticks_skipped as f64 / self.ingestion.buffers_received as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Session Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!(
            "   ├─ Termination: {}",
            self.render
                .termination
                .map(|reason| reason.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        println!("   └─ FPS: {:.2}", self.fps());

        println!("\nAcquisition");
        println!("   ├─ Buffers received: {}", self.ingestion.buffers_received);
        println!("   ├─ Clouds published: {}", self.ingestion.clouds_published);
        println!(
            "   ├─ Ticks skipped: {} ({:.2}%)",
            self.ingestion.ticks_skipped,
            self.skip_rate()
        );
        println!("   └─ Last cloud: {} points", self.ingestion.last_points);

        let frame_ms = &self.render.frame_ms;
        println!("\nRendering");
        println!("   ├─ Idle iterations: {}", self.render.idle_iterations);
        println!("   ├─ Frames rendered: {}", self.render.frames_rendered);
        println!("   ├─ Geometry updates: {}", self.render.geometry_updates);
        println!(
            "   └─ Frame time (ms): mean {:.3}, min {:.3}, max {:.3}, std {:.3}",
            frame_ms.mean, frame_ms.min, frame_ms.max, frame_ms.std_dev
        );

        println!("\nTeardown");
        println!("   ├─ Actors destroyed: {}", self.teardown.destroyed);
        if self.teardown.is_clean() {
            println!("   └─ Failures: none");
        } else {
            println!("   └─ Failures: {:?}", self.teardown.failed);
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let mut stats = SessionStats {
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        stats.render.frames_rendered = 120;
        stats.ingestion.buffers_received = 40;
        stats.ingestion.ticks_skipped = 10;

        assert!((stats.fps() - 60.0).abs() < 1e-9);
        assert!((stats.skip_rate() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_without_data() {
        let stats = SessionStats::default();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.skip_rate(), 0.0);
    }
}
