//! Mock CARLA client
//!
//! In-memory simulator for tests and offline runs, with failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{ActorId, SensorModality, SensorSource, Transform, WorldConfig};
use tracing::{debug, instrument, warn};

use crate::client::CarlaClient;
use crate::error::{ActorFactoryError, Result};
use crate::mock_sensor::{MockSensor, MockSensorConfig};

/// Mock client configuration
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// Refuse the connection
    pub fail_connect: bool,
    /// Delay before `connect` answers
    pub connect_delay: Option<Duration>,
    /// Vehicle blueprints whose spawn fails
    pub fail_vehicles: Vec<String>,
    /// Sensor blueprints whose spawn fails
    pub fail_sensors: Vec<String>,
    /// Actor IDs whose destroy fails
    pub fail_destroy: Vec<ActorId>,
    /// Sensor stream settings; derived from the spawn attributes when `None`
    pub sensor: Option<MockSensorConfig>,
}

#[derive(Debug, Clone)]
struct MockActor {
    blueprint: String,
    parent: Option<ActorId>,
    attributes: HashMap<String, String>,
    autopilot: bool,
}

#[derive(Debug)]
struct MockState {
    next_actor_id: AtomicU32,
    connected: AtomicBool,
    actors: Mutex<HashMap<ActorId, MockActor>>,
    world: Mutex<Option<WorldConfig>>,
    destroy_log: Mutex<Vec<ActorId>>,
}

/// Mock CARLA client
///
/// Clones share the same simulated world, so a test can keep a handle for
/// inspection after moving the client into an [`ActorFactory`](crate::ActorFactory).
#[derive(Debug, Clone)]
pub struct MockCarlaClient {
    config: Arc<MockConfig>,
    state: Arc<MockState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockCarlaClient {
    /// Create default mock client
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create mock client with injected behavior
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(MockState {
                // Start at 1000 to tell actor IDs apart from indices in logs
                next_actor_id: AtomicU32::new(1000),
                connected: AtomicBool::new(false),
                actors: Mutex::new(HashMap::new()),
                world: Mutex::new(None),
                destroy_log: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    /// Number of live actors
    pub fn actor_count(&self) -> usize {
        lock(&self.state.actors).len()
    }

    /// IDs of all live actors, ascending
    pub fn all_actor_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<_> = lock(&self.state.actors).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Every `destroy_actor` call, in call order
    pub fn destroy_log(&self) -> Vec<ActorId> {
        lock(&self.state.destroy_log).clone()
    }

    /// Number of `destroy_actor` calls for one actor
    pub fn destroy_count(&self, actor_id: ActorId) -> usize {
        lock(&self.state.destroy_log)
            .iter()
            .filter(|&&id| id == actor_id)
            .count()
    }

    /// Last applied world settings
    pub fn world_config(&self) -> Option<WorldConfig> {
        lock(&self.state.world).clone()
    }

    /// Parent of an attached actor
    pub fn parent_of(&self, actor_id: ActorId) -> Option<ActorId> {
        lock(&self.state.actors)
            .get(&actor_id)
            .and_then(|actor| actor.parent)
    }

    pub fn autopilot_enabled(&self, actor_id: ActorId) -> bool {
        lock(&self.state.actors)
            .get(&actor_id)
            .is_some_and(|actor| actor.autopilot)
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.state.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ActorFactoryError::connection("not connected"))
        }
    }

    fn insert_actor(&self, actor: MockActor) -> ActorId {
        let actor_id = self.allocate_actor_id();
        lock(&self.state.actors).insert(actor_id, actor);
        actor_id
    }
}

impl Default for MockCarlaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CarlaClient for MockCarlaClient {
    #[instrument(name = "mock_carla_connect", skip(self, timeout), fields(host = %host, port = port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let _ = timeout;
        if let Some(delay) = self.config.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.config.fail_connect {
            return Err(ActorFactoryError::connection(format!(
                "connection refused by {host}:{port} (mock)"
            )));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    #[instrument(name = "mock_carla_configure_world", skip(self, world), fields(map = ?world.map))]
    async fn configure_world(&self, world: &WorldConfig) -> Result<()> {
        self.ensure_connected()?;
        *lock(&self.state.world) = Some(world.clone());
        Ok(())
    }

    #[instrument(
        name = "mock_carla_spawn_vehicle",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint, has_transform = transform.is_some())
    )]
    async fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Option<Transform>,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        if self.config.fail_vehicles.iter().any(|b| b == blueprint) {
            return Err(ActorFactoryError::vehicle_spawn(blueprint, "mock failure"));
        }

        Ok(self.insert_actor(MockActor {
            blueprint: blueprint.to_string(),
            parent: None,
            attributes: attributes.clone(),
            autopilot: false,
        }))
    }

    #[instrument(name = "mock_carla_configure_vehicle", skip(self), fields(actor_id = actor_id))]
    async fn configure_vehicle(
        &self,
        actor_id: ActorId,
        autopilot: bool,
        simulate_physics: bool,
    ) -> Result<()> {
        self.ensure_connected()?;
        let mut actors = lock(&self.state.actors);
        let actor = actors.get_mut(&actor_id).ok_or_else(|| {
            ActorFactoryError::vehicle_spawn(format!("actor_{actor_id}"), "vehicle not found")
        })?;
        actor.autopilot = autopilot;
        debug!(actor_id, autopilot, simulate_physics, "mock vehicle configured");
        Ok(())
    }

    #[instrument(
        name = "mock_carla_spawn_sensor",
        skip(self, _transform, attributes),
        fields(blueprint = %blueprint, parent_id = parent_id)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        _transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        // Verify parent exists
        if !lock(&self.state.actors).contains_key(&parent_id) {
            return Err(ActorFactoryError::sensor_spawn(
                blueprint,
                format!("actor_{parent_id}"),
                "parent actor not found",
            ));
        }

        if self.config.fail_sensors.iter().any(|b| b == blueprint) {
            return Err(ActorFactoryError::sensor_spawn(
                blueprint,
                format!("actor_{parent_id}"),
                "mock failure",
            ));
        }

        Ok(self.insert_actor(MockActor {
            blueprint: blueprint.to_string(),
            parent: Some(parent_id),
            attributes: attributes.clone(),
            autopilot: false,
        }))
    }

    #[instrument(name = "mock_carla_destroy_actor", skip(self), fields(actor_id = actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        lock(&self.state.destroy_log).push(actor_id);

        if self.config.fail_destroy.contains(&actor_id) {
            return Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // Idempotent: Ok even if the actor doesn't exist
        lock(&self.state.actors).remove(&actor_id);
        Ok(())
    }

    #[instrument(name = "mock_carla_actor_exists", skip(self), fields(actor_id = actor_id))]
    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(lock(&self.state.actors).contains_key(&actor_id))
    }

    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        modality: SensorModality,
    ) -> Option<Box<dyn SensorSource>> {
        let actors = lock(&self.state.actors);
        let actor = actors.get(&actor_id).filter(|a| a.blueprint.starts_with("sensor."))?;
        let delivered = SensorModality::of_blueprint(&actor.blueprint);
        if delivered != modality {
            warn!(
                actor_id,
                blueprint = %actor.blueprint,
                requested = %modality,
                "sensor does not deliver the requested modality"
            );
            return None;
        }
        let config = self
            .config
            .sensor
            .clone()
            .unwrap_or_else(|| MockSensorConfig::from_attributes(&actor.attributes));
        Some(Box::new(MockSensor::new(sensor_id, modality, config)))
    }
}
