//! Mock LiDAR implementation
//!
//! Implements `SensorSource` trait, synthesizing deterministic rotating scans
//! of either modality. Used for testing and development without CARLA.

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    IntensityPoint, SemanticPoint, SensorDataCallback, SensorModality, SensorPacket, SensorSource,
};
use tracing::{debug, trace, warn};

/// Attenuation used to derive synthetic intensities from range
const SYNTHETIC_ATTENUATION: f32 = 0.004;

const MIN_FREQUENCY_HZ: f64 = 0.1;

/// Mock LiDAR configuration
///
/// Field names follow the CARLA ray-cast LiDAR attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct MockSensorConfig {
    /// Scans per second (Hz)
    pub frequency_hz: f64,
    /// Points in one full rotation
    pub points_per_scan: u32,
    /// Number of lasers
    pub channels: u32,
    /// Maximum range (m)
    pub range: f32,
    /// Elevation of the highest laser (degrees)
    pub upper_fov: f32,
    /// Elevation of the lowest laser (degrees)
    pub lower_fov: f32,
}

impl Default for MockSensorConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 10.0,
            points_per_scan: 3600,
            channels: 16,
            range: 100.0,
            upper_fov: 25.0,
            lower_fov: -25.0,
        }
    }
}

impl MockSensorConfig {
    /// Build from LiDAR blueprint attributes
    ///
    /// Recognized keys: `rotation_frequency`, `points_per_second`, `channels`,
    /// `range`, `upper_fov`, `lower_fov`. Unknown keys are ignored, unparsable
    /// values fall back to the default with a warning.
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let frequency_hz = parse_attr(attributes, "rotation_frequency", defaults.frequency_hz)
            .max(MIN_FREQUENCY_HZ);
        let points_per_second = parse_attr(
            attributes,
            "points_per_second",
            defaults.points_per_scan as f64 * defaults.frequency_hz,
        );

        Self {
            frequency_hz,
            points_per_scan: (points_per_second / frequency_hz).round().max(1.0) as u32,
            channels: parse_attr(attributes, "channels", defaults.channels).max(1),
            range: parse_attr(attributes, "range", defaults.range),
            upper_fov: parse_attr(attributes, "upper_fov", defaults.upper_fov),
            lower_fov: parse_attr(attributes, "lower_fov", defaults.lower_fov),
        }
    }

    fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency_hz.max(MIN_FREQUENCY_HZ))
    }
}

fn parse_attr<T: std::str::FromStr + Copy>(
    attributes: &HashMap<String, String>,
    key: &str,
    default: T,
) -> T {
    match attributes.get(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparsable sensor attribute, using default");
            default
        }),
    }
}

/// Ray geometry of one synthetic return
struct Ray {
    channel: u32,
    column: u32,
    azimuth: f32,
    elevation: f32,
    distance: f32,
}

impl Ray {
    fn position(&self) -> [f32; 3] {
        let horizontal = self.distance * self.elevation.cos();
        [
            horizontal * self.azimuth.cos(),
            horizontal * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
        ]
    }
}

fn rays(config: &MockSensorConfig, frame_id: u64) -> impl Iterator<Item = Ray> + '_ {
    let channels = config.channels.max(1);
    let columns = (config.points_per_scan / channels).max(1);
    let phase = (frame_id % 360) as f32 * TAU / 360.0;
    let fov = config.upper_fov - config.lower_fov;
    let channel_step = if channels > 1 {
        fov / (channels - 1) as f32
    } else {
        0.0
    };

    (0..config.points_per_scan).map(move |i| {
        let channel = i % channels;
        let column = (i / channels) % columns;
        let azimuth = phase + TAU * column as f32 / columns as f32;
        let elevation = (config.lower_fov + channel_step * channel as f32).to_radians();
        // Lower lasers see nearby ground, upper lasers see a wavy far wall
        let shape = 0.3 + 0.2 * (3.0 * azimuth).sin().abs() + 0.4 * channel as f32 / channels as f32;
        Ray {
            channel,
            column,
            azimuth,
            elevation,
            distance: config.range * shape.min(1.0),
        }
    })
}

/// Class tag by laser band and sector
fn synthetic_tag(ray: &Ray, channels: u32) -> u32 {
    let band = ray.channel * 4 / channels.max(1);
    let sector = (ray.azimuth.rem_euclid(TAU) / TAU * 8.0) as u32;
    match (band, sector % 4) {
        (0, 0) => 6,     // road line
        (0, _) => 7,     // road
        (1, 0) => 10,    // vehicles
        (1, 1) => 5,     // pole
        (1, _) => 8,     // sidewalk
        (2, 3) => 9,     // vegetation
        (2, _) => 1,     // building
        (_, 0 | 1) => 9, // vegetation
        _ => 1,          // building
    }
}

/// Synthesize one full rotation as a raw buffer of `modality` records
pub fn synthesize_scan(config: &MockSensorConfig, modality: SensorModality, frame_id: u64) -> Bytes {
    match modality {
        SensorModality::Intensity => {
            let points: Vec<IntensityPoint> = rays(config, frame_id)
                .map(|ray| {
                    let [x, y, z] = ray.position();
                    IntensityPoint {
                        x,
                        y,
                        z,
                        intensity: (-SYNTHETIC_ATTENUATION * ray.distance).exp(),
                    }
                })
                .collect();
            Bytes::copy_from_slice(bytemuck::cast_slice(&points))
        }
        SensorModality::Semantic => {
            let points: Vec<SemanticPoint> = rays(config, frame_id)
                .map(|ray| {
                    let [x, y, z] = ray.position();
                    let object_tag = synthetic_tag(&ray, config.channels);
                    SemanticPoint {
                        x,
                        y,
                        z,
                        cos_angle: ray.elevation.cos().abs(),
                        object_index: object_tag * 1000 + ray.column / 16,
                        object_tag,
                    }
                })
                .collect();
            Bytes::copy_from_slice(bytemuck::cast_slice(&points))
        }
    }
}

/// Mock LiDAR
///
/// Delivers scans from a background thread at `frequency_hz`, like the real
/// CARLA sensor delivers from its own thread.
pub struct MockSensor {
    sensor_id: String,
    modality: SensorModality,
    config: MockSensorConfig,
    listening: Arc<AtomicBool>,
    /// Bumped on every `listen`, retires threads from earlier sessions
    epoch: Arc<AtomicU64>,
    /// Held while a callback runs; `stop` takes it to wait out in-flight ticks
    delivery: Arc<Mutex<()>>,
}

impl MockSensor {
    /// Create new Mock sensor
    pub fn new(sensor_id: String, modality: SensorModality, config: MockSensorConfig) -> Self {
        Self {
            sensor_id,
            modality,
            config,
            listening: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
            delivery: Arc::new(Mutex::new(())),
        }
    }

    /// Create Mock sensor with default configuration
    pub fn with_defaults(sensor_id: String, modality: SensorModality) -> Self {
        Self::new(sensor_id, modality, MockSensorConfig::default())
    }

    pub fn config(&self) -> &MockSensorConfig {
        &self.config
    }
}

impl SensorSource for MockSensor {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn modality(&self) -> SensorModality {
        self.modality
    }

    fn listen(&self, callback: SensorDataCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        let my_epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let sensor_id = self.sensor_id.clone();
        let modality = self.modality;
        let config = self.config.clone();
        let listening = Arc::clone(&self.listening);
        let epoch = Arc::clone(&self.epoch);
        let delivery = Arc::clone(&self.delivery);
        let interval = config.interval();

        thread::spawn(move || {
            let active = || listening.load(Ordering::SeqCst) && epoch.load(Ordering::SeqCst) == my_epoch;
            let mut frame_id: u64 = 0;
            let start_time = Instant::now();

            debug!(
                sensor_id = %sensor_id,
                modality = %modality,
                frequency_hz = config.frequency_hz,
                points_per_scan = config.points_per_scan,
                "mock lidar started"
            );

            while active() {
                frame_id += 1;
                let packet = SensorPacket {
                    sensor_id: sensor_id.as_str().into(),
                    modality,
                    timestamp: start_time.elapsed().as_secs_f64(),
                    frame_id: Some(frame_id),
                    payload: synthesize_scan(&config, modality, frame_id),
                };

                {
                    let _gate = delivery.lock().unwrap_or_else(PoisonError::into_inner);
                    if !active() {
                        break;
                    }
                    callback(packet);
                }

                trace!(sensor_id = %sensor_id, frame_id, "mock scan sent");
                thread::sleep(interval);
            }

            debug!(sensor_id = %sensor_id, frames = frame_id, "mock lidar stopped");
        });
    }

    /// Stop delivery
    ///
    /// Waits for an in-flight callback to finish, so it must not be called
    /// from inside the callback itself.
    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            let _gate = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
            debug!(sensor_id = %self.sensor_id, "stopping mock lidar");
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

impl Drop for MockSensor {
    fn drop(&mut self) {
        self.listening.store(false, Ordering::SeqCst);
    }
}
