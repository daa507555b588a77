//! CARLA LiDAR measurement conversion
//!
//! Copies the native detection array of a `LidarMeasurement` or
//! `SemanticLidarMeasurement` into a `SensorPacket` payload, byte for byte.
//! Only compiled when `real-carla` feature is enabled.

use bytes::Bytes;
use carla::sensor::data::{LidarMeasurement, SemanticLidarMeasurement};
use carla::sensor::{SensorData, SensorDataBase};
use contracts::{SensorModality, SensorPacket};

/// Copy a detection slice into an owned byte buffer
///
/// Returns `None` when the detection type is not the expected record size.
fn detections_to_bytes<T>(slice: &[T], modality: SensorModality) -> Option<Bytes> {
    if std::mem::size_of::<T>() != modality.record_size() {
        return None;
    }
    let len = std::mem::size_of_val(slice);
    // SAFETY: CARLA detections are plain `repr(C)` float/u32 structs with no
    // padding; viewing `len` initialized bytes of the slice as `u8` is sound.
    let raw = unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, len) };
    Some(Bytes::copy_from_slice(raw))
}

/// Convert CARLA sensor data into a `SensorPacket`
///
/// Returns `None` if the data is not a measurement of `modality`.
pub fn convert_lidar_data(
    sensor_id: &str,
    modality: SensorModality,
    data: &SensorData,
) -> Option<SensorPacket> {
    let timestamp = data.timestamp();
    let frame_id = data.frame() as u64;

    let payload = match modality {
        SensorModality::Intensity => {
            let lidar = LidarMeasurement::try_from(data.clone()).ok()?;
            detections_to_bytes(lidar.as_slice(), modality)?
        }
        SensorModality::Semantic => {
            let lidar = SemanticLidarMeasurement::try_from(data.clone()).ok()?;
            detections_to_bytes(lidar.as_slice(), modality)?
        }
    };

    Some(SensorPacket {
        sensor_id: sensor_id.into(),
        modality,
        timestamp,
        frame_id: Some(frame_id),
        payload,
    })
}
