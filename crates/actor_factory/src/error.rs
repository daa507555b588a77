//! Failures while preparing or releasing simulator actors.

use contracts::ActorId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActorFactoryError {
    #[error("failed to connect to CARLA: {message}")]
    ConnectionFailed { message: String },

    /// The simulator did not answer within the configured timeout
    #[error("timed out connecting to CARLA at {host}:{port} after {timeout_ms} ms")]
    ConnectionTimeout {
        host: String,
        port: u16,
        timeout_ms: u64,
    },

    #[error("failed to configure world: {message}")]
    WorldConfigFailed { message: String },

    #[error("failed to spawn vehicle '{vehicle_id}': {message}")]
    VehicleSpawnFailed { vehicle_id: String, message: String },

    /// Spawning or attaching the LiDAR failed. The vehicle may already exist.
    #[error("failed to spawn sensor '{sensor_id}' on vehicle '{vehicle_id}': {message}")]
    SensorSpawnFailed {
        sensor_id: String,
        vehicle_id: String,
        message: String,
    },

    #[error("sensor '{sensor_id}' (actor {actor_id}) has no data source")]
    SensorSourceUnavailable { sensor_id: String, actor_id: ActorId },

    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: ActorId, message: String },
}

impl ActorFactoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    pub fn vehicle_spawn(vehicle_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VehicleSpawnFailed {
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    pub fn sensor_spawn(
        sensor_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SensorSpawnFailed {
            sensor_id: sensor_id.into(),
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    /// True when the simulator could not be reached at all
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ConnectionTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ActorFactoryError>;
