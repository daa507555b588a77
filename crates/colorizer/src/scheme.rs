//! Strategy selection by record type

use contracts::{ColorTriple, ColorizationConfig, IntensityPoint, LidarRecord, SemanticPoint};
use tracing::debug;

use crate::{AttenuationModel, IntensityColorizer, Palette, Result, SemanticColorizer};

/// A color strategy for one record type
pub trait Colorize<P: LidarRecord> {
    fn colorize(&self, point: &P) -> Result<ColorTriple>;

    /// Colors for a whole scan, index-aligned with `points`
    ///
    /// Fails on the first point that cannot be colored.
    fn colorize_all(&self, points: &[P]) -> Result<Vec<ColorTriple>> {
        points.iter().map(|p| self.colorize(p)).collect()
    }
}

impl Colorize<IntensityPoint> for IntensityColorizer {
    #[inline]
    fn colorize(&self, point: &IntensityPoint) -> Result<ColorTriple> {
        self.color(point.intensity)
    }
}

impl Colorize<SemanticPoint> for SemanticColorizer {
    #[inline]
    fn colorize(&self, point: &SemanticPoint) -> Result<ColorTriple> {
        self.color(point)
    }
}

/// Both strategies, built once per session
///
/// Built eagerly so a broken palette or class table fails at startup
/// regardless of the active modality.
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub intensity: IntensityColorizer,
    pub semantic: SemanticColorizer,
}

impl ColorScheme {
    pub fn from_config(config: &ColorizationConfig) -> Result<Self> {
        let intensity = IntensityColorizer::from_config(config)?;
        let semantic = SemanticColorizer::from_config(config)?;
        debug!(
            palette_stops = intensity.palette().len(),
            class_entries = semantic.table().len(),
            policy = ?intensity.policy(),
            shade_by_incidence = config.shade_by_incidence,
            "Color scheme built"
        );
        Ok(Self {
            intensity,
            semantic,
        })
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            intensity: IntensityColorizer::new(
                Palette::plasma(),
                AttenuationModel::default(),
                Default::default(),
            ),
            semantic: SemanticColorizer::default(),
        }
    }
}
