//! Coordinate normalizer
//!
//! CARLA reports positions in a left-handed frame (x forward, y right,
//! z up); the viewer is right-handed. Flipping y reconciles the two.

use contracts::LidarRecord;

#[inline]
pub fn to_right_handed([x, y, z]: [f32; 3]) -> [f32; 3] {
    [x, -y, z]
}

/// Right-handed positions, index-aligned with `points`
pub fn normalize_positions<P: LidarRecord>(points: &[P]) -> Vec<[f32; 3]> {
    points
        .iter()
        .map(|p| to_right_handed(p.position()))
        .collect()
}
