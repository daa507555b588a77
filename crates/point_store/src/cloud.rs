//! Index-aligned positions and colors

use contracts::ColorTriple;

use crate::{Result, StoreError};

/// A colored point set
///
/// `positions[i]` and `colors[i]` always describe the same return; the
/// constructor rejects unequal lengths and the fields are never exposed
/// mutably.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    positions: Vec<[f32; 3]>,
    colors: Vec<ColorTriple>,
}

impl PointCloud {
    pub fn try_new(positions: Vec<[f32; 3]>, colors: Vec<ColorTriple>) -> Result<Self> {
        if positions.len() != colors.len() {
            return Err(StoreError::LengthMismatch {
                positions: positions.len(),
                colors: colors.len(),
            });
        }
        Ok(Self { positions, colors })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[ColorTriple] {
        &self.colors
    }

    /// Iterate `(position, color)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&[f32; 3], &ColorTriple)> {
        self.positions.iter().zip(self.colors.iter())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Axis-aligned bounds `(min, max)`, `None` for an empty cloud
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(mut lo, mut hi), p| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
            (lo, hi)
        }))
    }

    pub fn into_parts(self) -> (Vec<[f32; 3]>, Vec<ColorTriple>) {
        (self.positions, self.colors)
    }
}
