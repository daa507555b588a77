//! Simulator operations a viewing session depends on.
//!
//! `RealCarlaClient` talks to a CARLA server; `MockCarlaClient` records calls
//! for tests and offline runs.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use contracts::{ActorId, SensorModality, SensorSource, Transform, WorldConfig};

use crate::error::Result;

/// Connection and actor lifecycle against one simulator.
pub trait CarlaClient: Send + Sync {
    /// Open the connection. The factory races this against `timeout` too,
    /// so a backend without its own deadline is acceptable.
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Load the map if one is named, then apply weather and sync settings.
    fn configure_world(&self, world: &WorldConfig) -> impl Future<Output = Result<()>> + Send;

    /// Spawn a vehicle from `blueprint` (e.g. `vehicle.tesla.model3`).
    ///
    /// With no `transform` the backend chooses a free spawn point.
    fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Option<Transform>,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    fn configure_vehicle(
        &self,
        actor_id: ActorId,
        autopilot: bool,
        simulate_physics: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Spawn a sensor rigidly attached to `parent_id`; `transform` is in the
    /// parent's frame.
    fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Destroying an actor that is already gone succeeds.
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    fn actor_exists(&self, actor_id: ActorId) -> impl Future<Output = Result<bool>> + Send;

    /// Data stream of a spawned LiDAR, decoded as `modality` records.
    ///
    /// `None` when `actor_id` is not a live sensor of this client.
    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        modality: SensorModality,
    ) -> Option<Box<dyn SensorSource>>;
}
