//! Viewer pipeline metrics
//!
//! Thin wrappers over the `metrics` facade so metric names and labels are
//! defined in one place. With no recorder installed every call is a no-op.

use metrics::{counter, gauge, histogram};

/// Raw LiDAR buffer delivered by the sensor
pub fn record_buffer_received(sensor_id: &str, modality: &str, bytes: usize) {
    counter!(
        "lidar_viewer_buffers_received_total",
        "sensor_id" => sensor_id.to_string(),
        "modality" => modality.to_string()
    )
    .increment(1);
    histogram!("lidar_viewer_buffer_bytes", "sensor_id" => sensor_id.to_string())
        .record(bytes as f64);
}

/// Colored cloud written to the store
pub fn record_cloud_published(sensor_id: &str, points: usize, process_ms: f64) {
    counter!(
        "lidar_viewer_clouds_published_total",
        "sensor_id" => sensor_id.to_string()
    )
    .increment(1);
    gauge!("lidar_viewer_cloud_points", "sensor_id" => sensor_id.to_string()).set(points as f64);
    histogram!(
        "lidar_viewer_tick_process_ms",
        "sensor_id" => sensor_id.to_string()
    )
    .record(process_ms);
}

/// Sensor tick dropped without updating the store
pub fn record_tick_skipped(sensor_id: &str, reason: &'static str) {
    counter!(
        "lidar_viewer_ticks_skipped_total",
        "sensor_id" => sensor_id.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// One render loop iteration
pub fn record_render_frame(frame_ms: f64, geometry_updated: bool) {
    counter!("lidar_viewer_render_frames_total").increment(1);
    if geometry_updated {
        counter!("lidar_viewer_geometry_updates_total").increment(1);
    }
    histogram!("lidar_viewer_render_frame_ms").record(frame_ms);
}

/// Simulation actor spawned
pub fn record_actor_spawned(role: &'static str) {
    counter!("lidar_viewer_actors_spawned_total", "role" => role).increment(1);
    gauge!("lidar_viewer_actors_alive").increment(1.0);
}

/// Simulation actor destroy attempt
pub fn record_actor_destroyed(role: &'static str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "lidar_viewer_actors_destroyed_total",
        "role" => role,
        "status" => status
    )
    .increment(1);
    gauge!("lidar_viewer_actors_alive").decrement(1.0);
}

/// Frozen view of a [`RunningStats`], printed in the session summary.
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        let (min, max) = stats.range.unwrap_or_default();
        Self {
            count: stats.count,
            min,
            max,
            mean: stats.mean,
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return f.write_str("N/A");
        }
        write!(
            f,
            "{:.3} ms avg over {} frames ({:.3}..{:.3}, sd {:.3})",
            self.mean, self.count, self.min, self.max, self.std_dev
        )
    }
}

/// Streaming mean and sample deviation of render frame times (Welford update).
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    range: Option<(f64, f64)>,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.range = Some(match self.range {
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
            None => (value, value),
        });
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }
}
