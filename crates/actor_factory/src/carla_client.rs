//! `CarlaClient` over the `carla` crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use carla::client::{ActorBase, ActorBlueprint, Client, Sensor, Vehicle, World};
use carla::geom::{Location, Rotation, Transform as CarlaTransform};
use contracts::{ActorId, SensorModality, SensorSource, Transform, WorldConfig};
use tracing::{debug, info, instrument, warn};

use crate::carla_sensor_source::CarlaSensorSource;
use crate::client::CarlaClient;
use crate::error::{ActorFactoryError, Result};

/// Client backed by a live CARLA server.
///
/// The carla handles are not `Sync`-friendly through `&self`, so each lives
/// behind its own mutex. Clones share the same connection.
#[derive(Default, Clone)]
pub struct RealCarlaClient {
    client: Arc<Mutex<Option<Client>>>,
    world: Arc<Mutex<Option<World>>>,
    handles: Arc<Mutex<HashMap<ActorId, Handle>>>,
}

/// Live actor kept so it can be stopped and destroyed later.
#[derive(Clone)]
enum Handle {
    Vehicle(Vehicle),
    Lidar(Sensor),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_connected() -> ActorFactoryError {
    ActorFactoryError::connection("not connected to CARLA server")
}

impl RealCarlaClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn in_world<R>(&self, f: impl FnOnce(&mut World) -> Result<R>) -> Result<R> {
        let mut guard = lock(&self.world);
        f(guard.as_mut().ok_or_else(not_connected)?)
    }

    fn vehicle(&self, actor_id: ActorId) -> Option<Vehicle> {
        match lock(&self.handles).get(&actor_id) {
            Some(Handle::Vehicle(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn lidar(&self, actor_id: ActorId) -> Option<Sensor> {
        match lock(&self.handles).get(&actor_id) {
            Some(Handle::Lidar(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Look up `blueprint` and apply `attributes`; unknown attributes are logged and skipped.
    fn prepared_blueprint(
        world: &World,
        blueprint: &str,
        attributes: &HashMap<String, String>,
    ) -> Option<ActorBlueprint> {
        let mut bp = world.blueprint_library().find(blueprint)?;
        for (key, value) in attributes {
            if !bp.set_attribute(key, value) {
                warn!(blueprint, key, value, "blueprint rejected attribute");
            }
        }
        Some(bp)
    }

    fn spawn_point(world: &World, transform: Option<Transform>) -> Option<CarlaTransform> {
        match transform {
            Some(t) => Some(to_carla_transform(t)),
            None => {
                let point = world.map().recommended_spawn_points().get(0).cloned()?;
                info!(location = ?point.location, "using first recommended spawn point");
                Some(point)
            }
        }
    }
}

/// Convert internal Transform to CARLA Transform
fn to_carla_transform(transform: Transform) -> CarlaTransform {
    CarlaTransform {
        location: Location {
            x: transform.location.x as f32,
            y: transform.location.y as f32,
            z: transform.location.z as f32,
        },
        rotation: Rotation {
            pitch: transform.rotation.pitch as f32,
            yaw: transform.rotation.yaw as f32,
            roll: transform.rotation.roll as f32,
        },
    }
}

impl CarlaClient for RealCarlaClient {
    #[instrument(name = "real_carla_connect", skip(self, timeout), fields(host = %host, port = port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let host_owned = host.to_string();
        // The carla client blocks while handshaking; keep it off the runtime threads
        let (client, world) = tokio::task::spawn_blocking(move || {
            let mut client = Client::connect(&host_owned, port, None);
            client.set_timeout(timeout);
            let world = client.world();
            (client, world)
        })
        .await
        .map_err(|e| ActorFactoryError::connection(format!("connect task failed: {e}")))?;

        info!(map = %world.map().name(), "connected to CARLA server");

        *lock(&self.client) = Some(client);
        *lock(&self.world) = Some(world);
        Ok(())
    }

    #[instrument(name = "real_carla_configure_world", skip(self, config), fields(map = ?config.map))]
    async fn configure_world(&self, config: &WorldConfig) -> Result<()> {
        if let Some(map) = &config.map {
            let mut client_guard = lock(&self.client);
            let client = client_guard.as_mut().ok_or_else(not_connected)?;
            let world = client.load_world(map);
            let loaded = world.map().name().to_string();
            if !loaded.ends_with(map.as_str()) {
                return Err(ActorFactoryError::WorldConfigFailed {
                    message: format!("requested map '{map}' but server loaded '{loaded}'"),
                });
            }
            info!(map = %loaded, "map loaded");
            *lock(&self.world) = Some(world);
        }

        self.in_world(|world| {
            let mut settings = world.settings();
            if settings.synchronous_mode != config.synchronous_mode {
                settings.synchronous_mode = config.synchronous_mode;
                world.apply_settings(&settings, Duration::from_secs(2));
                debug!(synchronous_mode = config.synchronous_mode, "world settings applied");
            }

            if let Some(preset) = &config.weather {
                let params = preset.params();
                let mut weather = world.weather();
                weather.cloudiness = params.cloudiness;
                weather.precipitation = params.precipitation;
                weather.sun_altitude_angle = params.sun_altitude_angle;
                weather.wetness = params.wetness;
                world.set_weather(&weather);
                debug!(?preset, "weather applied");
            }
            Ok(())
        })
    }

    #[instrument(
        name = "real_carla_spawn_vehicle",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint)
    )]
    async fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Option<Transform>,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        let vehicle = self.in_world(|world| {
            let bp = Self::prepared_blueprint(world, blueprint, attributes).ok_or_else(|| {
                ActorFactoryError::vehicle_spawn(blueprint, "blueprint not found")
            })?;
            let point = Self::spawn_point(world, transform).ok_or_else(|| {
                ActorFactoryError::vehicle_spawn(blueprint, "map has no recommended spawn points")
            })?;
            let actor = world
                .spawn_actor(&bp, &point)
                .map_err(|e| ActorFactoryError::vehicle_spawn(blueprint, e.to_string()))?;
            Vehicle::try_from(actor).map_err(|_| {
                ActorFactoryError::vehicle_spawn(blueprint, "spawned actor is not a vehicle")
            })
        })?;

        let actor_id = vehicle.id();
        debug!(actor_id, "vehicle spawned");
        lock(&self.handles).insert(actor_id, Handle::Vehicle(vehicle));
        Ok(actor_id)
    }

    #[instrument(name = "real_carla_configure_vehicle", skip(self), fields(actor_id = actor_id))]
    async fn configure_vehicle(
        &self,
        actor_id: ActorId,
        autopilot: bool,
        simulate_physics: bool,
    ) -> Result<()> {
        let vehicle = self.vehicle(actor_id).ok_or_else(|| {
            ActorFactoryError::vehicle_spawn(format!("actor_{actor_id}"), "vehicle not found")
        })?;
        vehicle.set_simulate_physics(simulate_physics);
        vehicle.set_autopilot(autopilot);
        info!(actor_id, autopilot, simulate_physics, "vehicle configured");
        Ok(())
    }

    #[instrument(
        name = "real_carla_spawn_sensor",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint, parent_id = parent_id)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        let parent = format!("actor_{parent_id}");
        let vehicle = self
            .vehicle(parent_id)
            .ok_or_else(|| ActorFactoryError::sensor_spawn(blueprint, &parent, "parent not found"))?;

        let lidar = self.in_world(|world| {
            let bp = Self::prepared_blueprint(world, blueprint, attributes).ok_or_else(|| {
                ActorFactoryError::sensor_spawn(blueprint, &parent, "blueprint not found")
            })?;
            let actor = world
                .spawn_actor_attached(&bp, &to_carla_transform(transform), &vehicle, None)
                .map_err(|e| ActorFactoryError::sensor_spawn(blueprint, &parent, e.to_string()))?;
            Sensor::try_from(actor).map_err(|_| {
                ActorFactoryError::sensor_spawn(blueprint, &parent, "spawned actor is not a sensor")
            })
        })?;

        let actor_id = lidar.id();
        debug!(actor_id, parent_id, "lidar attached");
        lock(&self.handles).insert(actor_id, Handle::Lidar(lidar));
        Ok(actor_id)
    }

    #[instrument(name = "real_carla_destroy_actor", skip(self), fields(actor_id = actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let destroyed = match lock(&self.handles).remove(&actor_id) {
            None => return Ok(()),
            Some(Handle::Vehicle(vehicle)) => vehicle.destroy(),
            Some(Handle::Lidar(lidar)) => {
                if lidar.is_listening() {
                    lidar.stop();
                }
                lidar.destroy()
            }
        };

        if destroyed {
            debug!(actor_id, "actor destroyed");
            Ok(())
        } else {
            Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "server refused destroy".to_string(),
            })
        }
    }

    #[instrument(name = "real_carla_actor_exists", skip(self), fields(actor_id = actor_id))]
    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(lock(&self.handles).contains_key(&actor_id))
    }

    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        modality: SensorModality,
    ) -> Option<Box<dyn SensorSource>> {
        let lidar = self.lidar(actor_id)?;
        Some(Box::new(CarlaSensorSource::new(sensor_id, modality, lidar)))
    }
}
