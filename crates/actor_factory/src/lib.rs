//! # Actor Factory
//!
//! Simulator-side resources for a viewing session.
//!
//! Responsibilities:
//! - Connect to the simulator with a bounded timeout
//! - Spawn the ego vehicle and attach the LiDAR
//! - Enroll every spawned actor for teardown, destroyed once in reverse order
//! - Provide the `SensorSource` for the attached LiDAR (mock or real)
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod factory;
pub mod mock_client;
pub mod mock_sensor;

#[cfg(feature = "real-carla")]
pub mod carla_client;
#[cfg(feature = "real-carla")]
pub mod carla_sensor_source;
#[cfg(feature = "real-carla")]
pub mod sensor_data_converter;

pub use client::CarlaClient;
pub use contracts::{ActorId, SensorSource, SpawnedActor};
pub use error::{ActorFactoryError, Result};
pub use factory::{ActorFactory, TeardownReport};
pub use mock_client::{MockCarlaClient, MockConfig};
pub use mock_sensor::{MockSensor, MockSensorConfig};

#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
#[cfg(feature = "real-carla")]
pub use carla_sensor_source::CarlaSensorSource;
