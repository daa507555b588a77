//! SensorPacket and LiDAR record layouts
//!
//! One `SensorPacket` is delivered per sensor tick. Its payload is the raw
//! detection array exactly as CARLA lays it out in memory.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::SensorId;

/// LiDAR return modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorModality {
    /// `sensor.lidar.ray_cast`: x, y, z, intensity
    #[default]
    Intensity,
    /// `sensor.lidar.ray_cast_semantic`: x, y, z, cos_angle, object index, object tag
    Semantic,
}

impl SensorModality {
    /// Size in bytes of one record for this modality
    pub fn record_size(self) -> usize {
        match self {
            Self::Intensity => IntensityPoint::RECORD_SIZE,
            Self::Semantic => SemanticPoint::RECORD_SIZE,
        }
    }

    /// CARLA blueprint id of the sensor producing this modality
    pub fn blueprint(self) -> &'static str {
        match self {
            Self::Intensity => "sensor.lidar.ray_cast",
            Self::Semantic => "sensor.lidar.ray_cast_semantic",
        }
    }

    /// Modality delivered by a lidar blueprint: `*_semantic` blueprints
    /// emit semantic records, every other lidar emits intensity records.
    pub fn of_blueprint(blueprint: &str) -> Self {
        if blueprint.ends_with("_semantic") {
            Self::Semantic
        } else {
            Self::Intensity
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intensity => "intensity",
            Self::Semantic => "semantic",
        }
    }
}

impl fmt::Display for SensorModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-size LiDAR record that can be reinterpreted from raw bytes.
pub trait LidarRecord: Pod {
    /// Bytes per record
    const RECORD_SIZE: usize = std::mem::size_of::<Self>();

    /// Modality whose buffers hold this record type
    const MODALITY: SensorModality;

    /// Position in sensor (left-handed) coordinates
    fn position(&self) -> [f32; 3];
}

/// Plain ray-cast return, 16 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct IntensityPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Attenuated return intensity, nominally in (0, 1]
    pub intensity: f32,
}

impl LidarRecord for IntensityPoint {
    const MODALITY: SensorModality = SensorModality::Intensity;

    #[inline]
    fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Semantic ray-cast return, 24 bytes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SemanticPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Cosine of the incidence angle between ray and hit surface normal
    pub cos_angle: f32,
    /// Index of the actor that was hit
    pub object_index: u32,
    /// Semantic class tag, see [`crate::SemanticClass`]
    pub object_tag: u32,
}

impl LidarRecord for SemanticPoint {
    const MODALITY: SensorModality = SensorModality::Semantic;

    #[inline]
    fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// RGB color, each channel in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorTriple {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorTriple {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channels (divided by 255)
    pub fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    /// Quantize to 8-bit channels, clamping out-of-range values
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Multiply every channel by `factor`
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
        }
    }
}

/// Sensor packet
///
/// Raw buffer received from a LiDAR callback, plus delivery metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorPacket {
    /// Sensor ID
    pub sensor_id: SensorId,

    /// Record layout of `payload`
    pub modality: SensorModality,

    /// CARLA simulation timestamp (seconds)
    pub timestamp: f64,

    /// Optional frame number (ordering/diagnostics)
    pub frame_id: Option<u64>,

    /// Raw detection array
    pub payload: Bytes,
}

impl SensorPacket {
    /// Number of whole records in the payload
    pub fn record_count(&self) -> usize {
        self.payload.len() / self.modality.record_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(IntensityPoint::RECORD_SIZE, 16);
        assert_eq!(SemanticPoint::RECORD_SIZE, 24);
        assert_eq!(SensorModality::Intensity.record_size(), 16);
        assert_eq!(SensorModality::Semantic.record_size(), 24);
    }

    #[test]
    fn test_color_rgb8() {
        let road = ColorTriple::from_rgb8([128, 64, 128]);
        assert_eq!(road.r, 128.0 / 255.0);
        assert_eq!(road.to_rgb8(), [128, 64, 128]);
        assert_eq!(ColorTriple::new(2.0, -1.0, 0.5).to_rgb8(), [255, 0, 128]);
    }

    #[test]
    fn test_modality_serde() {
        let json = serde_json::to_string(&SensorModality::Semantic).unwrap();
        assert_eq!(json, "\"semantic\"");
        assert_eq!(SensorModality::Semantic.blueprint(), "sensor.lidar.ray_cast_semantic");
    }

    #[test]
    fn test_modality_of_blueprint() {
        for modality in [SensorModality::Intensity, SensorModality::Semantic] {
            assert_eq!(SensorModality::of_blueprint(modality.blueprint()), modality);
        }
        assert_eq!(
            SensorModality::of_blueprint("sensor.lidar.custom"),
            SensorModality::Intensity
        );
    }
}
