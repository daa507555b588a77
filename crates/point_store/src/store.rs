//! Latest-wins point cloud store

use std::sync::{Arc, PoisonError, RwLock};

use contracts::ColorTriple;
use tracing::trace;

use crate::{PointCloud, Result};

/// One published cloud and the write that produced it
#[derive(Debug, Clone, Default)]
pub struct CloudSnapshot {
    /// Number of successful writes so far; 0 means never written
    pub generation: u64,
    pub cloud: Arc<PointCloud>,
}

/// Shared point cloud with replace-by-swap writes
///
/// A write builds the complete cloud first and then swaps the shared
/// pointer, so readers only ever see a fully formed pair. The lock is held
/// just long enough to clone or replace an `Arc`; concurrent writers are
/// serialized by it and the last one wins.
#[derive(Debug, Default)]
pub struct PointCloudStore {
    current: RwLock<CloudSnapshot>,
}

impl PointCloudStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored cloud
    ///
    /// Returns the new generation.
    ///
    /// # Errors
    /// `LengthMismatch` if the sequences differ in length; the stored cloud
    /// is left untouched.
    pub fn write(&self, positions: Vec<[f32; 3]>, colors: Vec<ColorTriple>) -> Result<u64> {
        let cloud = Arc::new(PointCloud::try_new(positions, colors)?);
        let points = cloud.len();

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let generation = current.generation + 1;
        *current = CloudSnapshot { generation, cloud };
        drop(current);

        trace!(generation, points, "Point cloud published");
        Ok(generation)
    }

    /// Current cloud
    pub fn read(&self) -> Arc<PointCloud> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner).cloud)
    }

    /// Current cloud together with its generation
    pub fn snapshot(&self) -> CloudSnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn generation(&self) -> u64 {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Whether at least one write has succeeded
    pub fn has_data(&self) -> bool {
        self.generation() > 0
    }
}
