//! [`SensorSource`] over a spawned CARLA LiDAR actor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use carla::client::Sensor;
use contracts::{SensorDataCallback, SensorModality, SensorSource};
use tracing::{debug, trace, warn};

use crate::sensor_data_converter::convert_lidar_data;

/// The `listening` flag is shared with the carla stream closure so sweeps
/// racing with `stop` are dropped.
pub struct CarlaSensorSource {
    sensor_id: String,
    modality: SensorModality,
    sensor: Sensor,
    listening: Arc<AtomicBool>,
}

impl CarlaSensorSource {
    pub fn new(sensor_id: String, modality: SensorModality, sensor: Sensor) -> Self {
        Self {
            sensor_id,
            modality,
            sensor,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SensorSource for CarlaSensorSource {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn modality(&self) -> SensorModality {
        self.modality
    }

    fn listen(&self, callback: SensorDataCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(sensor_id = %self.sensor_id, "listen called twice, keeping first callback");
            return;
        }

        let sensor_id = self.sensor_id.clone();
        let modality = self.modality;
        let listening = self.listening.clone();

        debug!(%sensor_id, %modality, "subscribing to lidar stream");

        self.sensor.listen(move |sensor_data| {
            if !listening.load(Ordering::SeqCst) {
                return;
            }

            let Some(packet) = convert_lidar_data(&sensor_id, modality, &sensor_data) else {
                warn!(%sensor_id, %modality, "sweep is not a lidar measurement of this modality");
                return;
            };
            trace!(frame_id = packet.frame_id, bytes = packet.payload.len(), "lidar sweep");
            callback(packet);
        });
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(sensor_id = %self.sensor_id, "unsubscribing from lidar stream");
            // Blocks until the client has detached the stream callback
            self.sensor.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}
