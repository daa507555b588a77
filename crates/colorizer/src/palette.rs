//! Piecewise-linear color palette

use contracts::ColorTriple;

use crate::{ColorizeError, Result};

/// Matplotlib "plasma", sampled at ten evenly spaced stops
const PLASMA_STOPS: [[u8; 3]; 10] = [
    [13, 8, 135],
    [70, 3, 159],
    [114, 1, 168],
    [156, 23, 158],
    [189, 55, 134],
    [216, 87, 107],
    [237, 121, 83],
    [251, 159, 58],
    [253, 202, 38],
    [240, 249, 33],
];

/// Ordered color control points at strictly increasing positions in [0, 1]
///
/// Lookups between two stops interpolate each channel linearly; lookups
/// outside `[positions[0], positions[n-1]]` clamp to the boundary color.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<ColorTriple>,
    positions: Vec<f32>,
}

impl Palette {
    /// Build a palette from explicit stops
    ///
    /// # Errors
    /// `InvalidPalette` if there are fewer than two stops, the lengths
    /// differ, or positions are not strictly increasing within [0, 1].
    pub fn new(colors: Vec<ColorTriple>, positions: Vec<f32>) -> Result<Self> {
        if colors.len() < 2 {
            return Err(ColorizeError::invalid_palette(format!(
                "need at least 2 control points, got {}",
                colors.len()
            )));
        }
        if colors.len() != positions.len() {
            return Err(ColorizeError::invalid_palette(format!(
                "{} colors but {} positions",
                colors.len(),
                positions.len()
            )));
        }
        if let Some(p) = positions.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ColorizeError::invalid_palette(format!(
                "position {p} outside [0, 1]"
            )));
        }
        if positions.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ColorizeError::invalid_palette(
                "positions must be strictly increasing",
            ));
        }

        Ok(Self { colors, positions })
    }

    /// Evenly spaced stops from 0 to 1
    pub fn uniform(colors: Vec<ColorTriple>) -> Result<Self> {
        let n = colors.len();
        let last = n.saturating_sub(1).max(1) as f32;
        let positions = (0..n).map(|i| i as f32 / last).collect();
        Self::new(colors, positions)
    }

    /// Evenly spaced stops from 8-bit RGB
    pub fn from_rgb8(stops: &[[u8; 3]]) -> Result<Self> {
        Self::uniform(stops.iter().copied().map(ColorTriple::from_rgb8).collect())
    }

    /// Default intensity palette
    pub fn plasma() -> Self {
        let colors = PLASMA_STOPS.iter().copied().map(ColorTriple::from_rgb8).collect();
        let last = (PLASMA_STOPS.len() - 1) as f32;
        let positions = (0..PLASMA_STOPS.len()).map(|i| i as f32 / last).collect();
        Self { colors, positions }
    }

    pub fn colors(&self) -> &[ColorTriple] {
        &self.colors
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Interpolated color at `c`
    ///
    /// NaN samples the first stop.
    pub fn sample(&self, c: f32) -> ColorTriple {
        let last = self.colors.len() - 1;
        if c.is_nan() || c <= self.positions[0] {
            return self.colors[0];
        }
        if c >= self.positions[last] {
            return self.colors[last];
        }

        // First stop strictly above c; in 1..=last given the checks above.
        let hi = self.positions.partition_point(|&p| p <= c);
        let lo = hi - 1;
        let t = (c - self.positions[lo]) / (self.positions[hi] - self.positions[lo]);

        let (a, b) = (self.colors[lo], self.colors[hi]);
        ColorTriple::new(lerp(a.r, b.r, t), lerp(a.g, b.g, t), lerp(a.b, b.b, t))
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let v = a + (b - a) * t;
    v.clamp(a.min(b), a.max(b))
}
