//! SessionBlueprint - Config Loader output
//!
//! Describes one viewer session: simulator connection, the ego vehicle, the
//! LiDAR mounted on it, the viewer window and the colorization calibration.
//! Field ranges are declared with `validator`; cross-field rules live in
//! `config_loader`.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::SensorModality;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete session blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Simulator connection and world settings
    #[validate(nested)]
    pub world: WorldConfig,

    /// Ego vehicle
    #[validate(nested)]
    pub vehicle: VehicleConfig,

    /// LiDAR attached to the ego vehicle
    #[validate(nested)]
    pub lidar: LidarConfig,

    /// Viewer window and render loop
    #[serde(default)]
    #[validate(nested)]
    pub viewer: ViewerConfig,

    /// Colorization calibration
    #[serde(default)]
    #[validate(nested)]
    pub colorization: ColorizationConfig,
}

/// World configuration: connection, map, weather
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorldConfig {
    /// CARLA server address
    #[serde(default = "default_carla_host")]
    #[validate(length(min = 1, message = "carla_host cannot be empty"))]
    pub carla_host: String,

    /// CARLA server port
    #[serde(default = "default_carla_port")]
    #[validate(range(min = 1, message = "carla_port must be > 0"))]
    pub carla_port: u16,

    /// Connection timeout (seconds)
    #[serde(default = "default_timeout_sec")]
    #[validate(range(exclusive_min = 0.0, message = "timeout_sec must be > 0"))]
    pub timeout_sec: f64,

    /// Run the world in synchronous mode (the viewer normally runs async)
    #[serde(default)]
    pub synchronous_mode: bool,

    /// Map to load; the current map is kept when absent
    #[serde(default)]
    pub map: Option<String>,

    /// Weather preset (optional)
    #[serde(default)]
    pub weather: Option<WeatherPreset>,
}

impl WorldConfig {
    /// Connect timeout; the default when `timeout_sec` is not a valid duration
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_sec)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout_sec()))
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            carla_host: default_carla_host(),
            carla_port: default_carla_port(),
            timeout_sec: default_timeout_sec(),
            synchronous_mode: false,
            map: None,
            weather: None,
        }
    }
}

fn default_carla_host() -> String {
    "localhost".to_string()
}

fn default_carla_port() -> u16 {
    2000
}

fn default_timeout_sec() -> f64 {
    10.0
}

/// Weather preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherPreset {
    ClearNoon,
    CloudyNoon,
    WetNoon,
    RainyNoon,
    ClearSunset,
    Custom(WeatherParams),
}

impl WeatherPreset {
    /// Concrete parameters applied to the world
    pub fn params(&self) -> WeatherParams {
        let (cloudiness, precipitation, sun_altitude_angle, wetness) = match self {
            Self::ClearNoon => (5.0, 0.0, 45.0, 0.0),
            Self::CloudyNoon => (60.0, 0.0, 45.0, 0.0),
            Self::WetNoon => (5.0, 0.0, 45.0, 50.0),
            Self::RainyNoon => (60.0, 60.0, 45.0, 60.0),
            Self::ClearSunset => (5.0, 0.0, 15.0, 0.0),
            Self::Custom(params) => return params.clone(),
        };
        WeatherParams {
            cloudiness,
            precipitation,
            sun_altitude_angle,
            wetness,
        }
    }
}

/// Custom weather parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherParams {
    pub cloudiness: f32,
    pub precipitation: f32,
    pub sun_altitude_angle: f32,
    /// Road wetness, 0 to 100
    #[serde(default)]
    pub wetness: f32,
}

/// 3D transform: location + rotation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Location (x, y, z) in meters
    pub location: Location,

    /// Rotation (pitch, yaw, roll) in degrees
    #[serde(default)]
    pub rotation: Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// Ego vehicle configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VehicleConfig {
    /// Unique identifier
    #[validate(length(min = 1, message = "vehicle id cannot be empty"))]
    pub id: String,

    /// Blueprint name (e.g., "vehicle.tesla.model3")
    #[serde(default = "default_vehicle_blueprint")]
    #[validate(length(min = 1, message = "vehicle blueprint cannot be empty"))]
    pub blueprint: String,

    /// Spawn pose; the backend picks one when absent
    #[serde(default)]
    pub spawn_point: Option<Transform>,

    /// Blueprint attributes (role_name, color, ...)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Hand the vehicle to the traffic manager after spawning
    #[serde(default)]
    pub autopilot: bool,

    #[serde(default = "default_true")]
    pub simulate_physics: bool,
}

fn default_vehicle_blueprint() -> String {
    "vehicle.tesla.model3".to_string()
}

fn default_true() -> bool {
    true
}

/// LiDAR configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LidarConfig {
    /// Unique identifier
    #[validate(length(min = 1, message = "lidar id cannot be empty"))]
    pub id: String,

    /// Return modality, selects blueprint, record layout and colorizer
    #[serde(default)]
    pub modality: SensorModality,

    /// Mount pose relative to the vehicle
    #[serde(default = "default_lidar_transform")]
    pub transform: Transform,

    /// Rotation frequency (Hz), must be > 0
    #[serde(default = "default_frequency_hz")]
    #[validate(range(exclusive_min = 0.0, message = "frequency_hz must be > 0"))]
    pub frequency_hz: f64,

    /// Blueprint override; derived from `modality` when absent
    #[serde(default)]
    pub blueprint: Option<String>,

    /// Sensor attributes (channels, range, points_per_second, ...)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl LidarConfig {
    /// Blueprint to spawn
    pub fn blueprint(&self) -> &str {
        self.blueprint
            .as_deref()
            .unwrap_or_else(|| self.modality.blueprint())
    }

    /// Expected interval between sensor ticks
    pub fn tick_period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.frequency_hz)
            .unwrap_or_else(|_| Duration::from_secs_f64(1.0 / default_frequency_hz()))
    }
}

fn default_lidar_transform() -> Transform {
    Transform {
        location: Location {
            x: 0.5,
            y: 0.0,
            z: 3.0,
        },
        rotation: Rotation::default(),
    }
}

fn default_frequency_hz() -> f64 {
    10.0
}

/// Viewer window and render loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ViewerConfig {
    #[validate(length(min = 1, message = "window_name cannot be empty"))]
    pub window_name: String,

    #[validate(range(min = 1, message = "width must be > 0"))]
    pub width: u32,

    #[validate(range(min = 1, message = "height must be > 0"))]
    pub height: u32,

    /// Window position (pixels from the left screen edge)
    pub left: i32,

    /// Window position (pixels from the top screen edge)
    pub top: i32,

    /// Background RGB, channels in [0, 1]
    pub background: [f32; 3],

    #[validate(range(exclusive_min = 0.0, message = "point_size must be > 0"))]
    pub point_size: f32,

    /// Draw a unit axis triad at the origin
    pub show_axes: bool,

    /// Sleep between render iterations
    #[validate(range(min = 1, max = 1000, message = "tick_interval_ms must be in 1..=1000"))]
    pub tick_interval_ms: u64,

    /// Stop after this many rendered frames
    #[validate(range(min = 1, message = "max_frames must be > 0"))]
    pub max_frames: Option<u64>,
}

impl ViewerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_name: "Carla Lidar".to_string(),
            width: 960,
            height: 540,
            left: 480,
            top: 270,
            background: [0.05; 3],
            point_size: 1.0,
            show_axes: true,
            tick_interval_ms: 5,
            max_frames: None,
        }
    }
}

/// What to do with a non-positive (or NaN) intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidIntensityPolicy {
    /// Substitute a minimum epsilon intensity
    #[default]
    Clamp,
    /// Fail the tick
    Reject,
}

/// Colorization configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ColorizationConfig {
    /// Assumed attenuation coefficient of the intensity model
    #[validate(range(exclusive_min = 0.0, message = "attenuation_coefficient must be > 0"))]
    pub attenuation_coefficient: f64,

    /// Reference distance of the intensity model
    #[validate(range(exclusive_min = 0.0, message = "reference_distance must be > 0"))]
    pub reference_distance: f64,

    pub invalid_intensity: InvalidIntensityPolicy,

    /// Custom palette stops (8-bit RGB, evenly spaced); plasma when absent
    #[validate(length(min = 2, message = "palette needs at least 2 stops"))]
    pub palette: Option<Vec<[u8; 3]>>,

    /// Darken semantic colors by the incidence cosine
    pub shade_by_incidence: bool,

    /// Custom class color table (8-bit RGB, one entry per class tag)
    #[validate(length(equal = 34, message = "class_colors must have exactly 34 entries"))]
    pub class_colors: Option<Vec<[u8; 3]>>,
}

impl Default for ColorizationConfig {
    fn default() -> Self {
        Self {
            attenuation_coefficient: 0.004,
            reference_distance: 100.0,
            invalid_intensity: InvalidIntensityPolicy::Clamp,
            palette: None,
            shade_by_incidence: false,
            class_colors: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blueprint() -> SessionBlueprint {
        SessionBlueprint {
            version: ConfigVersion::V1,
            world: WorldConfig::default(),
            vehicle: VehicleConfig {
                id: "ego".into(),
                blueprint: default_vehicle_blueprint(),
                spawn_point: None,
                attributes: HashMap::new(),
                autopilot: false,
                simulate_physics: true,
            },
            lidar: LidarConfig {
                id: "roof_lidar".into(),
                modality: SensorModality::Semantic,
                transform: default_lidar_transform(),
                frequency_hz: 10.0,
                blueprint: None,
                attributes: HashMap::new(),
            },
            viewer: ViewerConfig::default(),
            colorization: ColorizationConfig::default(),
        }
    }

    #[test]
    fn lidar_blueprint_follows_modality() {
        let mut blueprint = sample_blueprint();
        assert_eq!(blueprint.lidar.blueprint(), "sensor.lidar.ray_cast_semantic");

        blueprint.lidar.blueprint = Some("sensor.lidar.custom".into());
        assert_eq!(blueprint.lidar.blueprint(), "sensor.lidar.custom");
    }

    #[test]
    fn field_ranges_are_validated() {
        let blueprint = sample_blueprint();
        assert!(blueprint.validate().is_ok());

        let mut bad = sample_blueprint();
        bad.viewer.tick_interval_ms = 0;
        assert!(bad.validate().is_err());

        let mut bad = sample_blueprint();
        bad.colorization.class_colors = Some(vec![[0, 0, 0]; 33]);
        assert!(bad.validate().is_err());

        let mut bad = sample_blueprint();
        bad.lidar.frequency_hz = 0.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn weather_presets_are_distinct() {
        let clear = WeatherPreset::ClearNoon.params();
        let wet = WeatherPreset::WetNoon.params();
        assert_ne!(wet, clear);
        assert_eq!(clear.wetness, 0.0);
        assert!(wet.wetness > 0.0);
        assert_eq!(wet.precipitation, 0.0);

        let custom: WeatherPreset = serde_json::from_str(
            r#"{"custom": {"cloudiness": 10.0, "precipitation": 0.0, "sun_altitude_angle": 30.0}}"#,
        )
        .unwrap();
        assert_eq!(custom.params().wetness, 0.0);
    }

    #[test]
    fn durations() {
        let blueprint = sample_blueprint();
        assert_eq!(blueprint.viewer.tick_interval(), Duration::from_millis(5));
        assert_eq!(blueprint.lidar.tick_period(), Duration::from_millis(100));
        assert_eq!(blueprint.world.timeout(), Duration::from_secs(10));
    }
}
