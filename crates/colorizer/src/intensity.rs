//! Intensity pseudocolor strategy

use contracts::{ColorTriple, ColorizationConfig, InvalidIntensityPolicy};

use crate::{ColorizeError, Palette, Result};

/// Intensity substituted for non-positive returns under [`InvalidIntensityPolicy::Clamp`]
pub const MIN_INTENSITY: f32 = 1e-6;

/// Calibration of the LiDAR intensity falloff
///
/// CARLA attenuates intensity as `exp(-k * d)`. Normalizing by the value at
/// the reference distance maps returns onto the palette axis:
///
/// `c = 1 - ln(I) / ln(exp(-k * d))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttenuationModel {
    /// Attenuation coefficient `k`
    pub coefficient: f64,
    /// Reference distance `d`
    pub reference_distance: f64,
}

impl Default for AttenuationModel {
    fn default() -> Self {
        Self {
            coefficient: 0.004,
            reference_distance: 100.0,
        }
    }
}

impl AttenuationModel {
    /// `ln(exp(-k * d))`
    fn log_reference(&self) -> f64 {
        -self.coefficient * self.reference_distance
    }

    /// Palette coordinate for a positive intensity, clamped to [0, 1]
    pub fn normalize(&self, intensity: f32) -> f32 {
        let c = 1.0 - f64::from(intensity).ln() / self.log_reference();
        if c.is_nan() {
            return 0.0;
        }
        c.clamp(0.0, 1.0) as f32
    }
}

/// Maps intensity returns to palette colors
#[derive(Debug, Clone)]
pub struct IntensityColorizer {
    palette: Palette,
    model: AttenuationModel,
    policy: InvalidIntensityPolicy,
}

impl IntensityColorizer {
    pub fn new(palette: Palette, model: AttenuationModel, policy: InvalidIntensityPolicy) -> Self {
        Self {
            palette,
            model,
            policy,
        }
    }

    /// Build from session configuration
    ///
    /// Uses the plasma palette unless a custom one is configured.
    pub fn from_config(config: &ColorizationConfig) -> Result<Self> {
        let palette = match &config.palette {
            Some(stops) => Palette::from_rgb8(stops)?,
            None => Palette::plasma(),
        };
        let model = AttenuationModel {
            coefficient: config.attenuation_coefficient,
            reference_distance: config.reference_distance,
        };
        Ok(Self::new(palette, model, config.invalid_intensity))
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn model(&self) -> &AttenuationModel {
        &self.model
    }

    pub fn policy(&self) -> InvalidIntensityPolicy {
        self.policy
    }

    /// Color for one intensity value
    ///
    /// # Errors
    /// `InvalidIntensity` for `I <= 0` or NaN when the policy is `Reject`.
    pub fn color(&self, intensity: f32) -> Result<ColorTriple> {
        let intensity = if intensity > 0.0 {
            intensity
        } else {
            match self.policy {
                InvalidIntensityPolicy::Clamp => MIN_INTENSITY,
                InvalidIntensityPolicy::Reject => {
                    return Err(ColorizeError::InvalidIntensity { value: intensity })
                }
            }
        };
        Ok(self.palette.sample(self.model.normalize(intensity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colorizer(policy: InvalidIntensityPolicy) -> IntensityColorizer {
        IntensityColorizer::new(Palette::plasma(), AttenuationModel::default(), policy)
    }

    #[test]
    fn test_normalize_reference_points() {
        let model = AttenuationModel::default();
        // Full-strength return sits at the top of the axis.
        assert_eq!(model.normalize(1.0), 1.0);
        // Return attenuated over exactly the reference distance sits at the bottom.
        assert!(model.normalize((-0.4f64).exp() as f32).abs() < 1e-5);
        // Halfway along the log axis.
        assert!((model.normalize((-0.2f64).exp() as f32) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_strong_return_clamps_to_last_stop() {
        let colorizer = colorizer(InvalidIntensityPolicy::Reject);
        let last = *colorizer.palette().colors().last().unwrap();
        // c = 1 - ln(50) / -0.4 is far above 1
        assert_eq!(colorizer.color(50.0).unwrap(), last);
    }

    #[test]
    fn test_invalid_intensity_policies() {
        let clamp = colorizer(InvalidIntensityPolicy::Clamp);
        let first = clamp.palette().colors()[0];
        assert_eq!(clamp.color(0.0).unwrap(), first);
        assert_eq!(clamp.color(-2.5).unwrap(), first);
        assert_eq!(clamp.color(f32::NAN).unwrap(), first);

        let reject = colorizer(InvalidIntensityPolicy::Reject);
        assert_eq!(
            reject.color(0.0),
            Err(ColorizeError::InvalidIntensity { value: 0.0 })
        );
        assert!(reject.color(f32::NAN).is_err());
    }

    #[test]
    fn test_from_config_custom_palette() {
        let config = ColorizationConfig {
            palette: Some(vec![[0, 0, 0], [255, 255, 255]]),
            ..Default::default()
        };
        let colorizer = IntensityColorizer::from_config(&config).unwrap();
        assert_eq!(colorizer.palette().len(), 2);
        assert_eq!(colorizer.color(1.0).unwrap(), ColorTriple::new(1.0, 1.0, 1.0));

        let bad = ColorizationConfig {
            palette: Some(vec![[0, 0, 0]]),
            ..Default::default()
        };
        assert!(IntensityColorizer::from_config(&bad).is_err());
    }
}
