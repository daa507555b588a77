//! Acquisition counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Per-callback counters, readable from any thread
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Buffers delivered by the sensor
    pub buffers_received: AtomicU64,

    /// Clouds written to the store
    pub clouds_published: AtomicU64,

    /// Ticks dropped because of a per-tick error
    pub ticks_skipped: AtomicU64,

    /// Points in the most recently published cloud
    pub last_points: AtomicUsize,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.buffers_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self, points: usize) {
        self.clouds_published.fetch_add(1, Ordering::Relaxed);
        self.last_points.store(points, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            buffers_received: self.buffers_received.load(Ordering::Relaxed),
            clouds_published: self.clouds_published.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            last_points: self.last_points.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub buffers_received: u64,
    pub clouds_published: u64,
    pub ticks_skipped: u64,
    pub last_points: usize,
}
