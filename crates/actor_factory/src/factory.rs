//! ActorFactory core implementation
//!
//! Spawns the session's actors and owns the teardown list. Every actor the
//! backend creates is enrolled before the spawning call returns, and
//! `teardown` destroys the list in reverse spawn order, each actor once.

use std::collections::HashMap;

use contracts::{
    ActorId, ActorRole, LidarConfig, SensorSource, SpawnedActor, VehicleConfig, WorldConfig,
};
use tracing::{debug, error, info, instrument, warn};

use crate::client::CarlaClient;
use crate::error::{ActorFactoryError, Result};

/// Outcome of a teardown pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Actors destroyed successfully
    pub destroyed: usize,
    /// Actors whose destroy call failed (logged, not retried)
    pub failed: Vec<ActorId>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Actor Factory
///
/// Scoped owner of simulator actors: spawn through it, and call
/// [`teardown`](Self::teardown) on every exit path.
pub struct ActorFactory<C: CarlaClient> {
    client: C,
    spawned: Vec<SpawnedActor>,
}

impl<C: CarlaClient> ActorFactory<C> {
    /// Create new ActorFactory
    pub fn new(client: C) -> Self {
        Self {
            client,
            spawned: Vec::new(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Actors awaiting teardown, in spawn order
    pub fn spawned(&self) -> &[SpawnedActor] {
        &self.spawned
    }

    /// Connect to the simulator, bounded by `world.timeout_sec`
    #[instrument(
        name = "actor_factory_connect",
        skip(self, world),
        fields(host = %world.carla_host, port = world.carla_port)
    )]
    pub async fn connect(&mut self, world: &WorldConfig) -> Result<()> {
        let timeout = world.timeout();
        let attempt = self
            .client
            .connect(&world.carla_host, world.carla_port, timeout);

        match tokio::time::timeout(timeout, attempt).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ActorFactoryError::ConnectionTimeout {
                    host: world.carla_host.clone(),
                    port: world.carla_port,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }

        info!("connected to simulator");
        Ok(())
    }

    /// Apply map, weather and synchronous-mode settings
    #[instrument(name = "actor_factory_configure_world", skip(self, world))]
    pub async fn configure_world(&self, world: &WorldConfig) -> Result<()> {
        self.client.configure_world(world).await?;
        debug!(
            map = ?world.map,
            synchronous_mode = world.synchronous_mode,
            "world configured"
        );
        Ok(())
    }

    /// Spawn the ego vehicle and enroll it for teardown
    #[instrument(
        name = "actor_factory_spawn_vehicle",
        skip(self, config),
        fields(vehicle_id = %config.id)
    )]
    pub async fn spawn_vehicle(&mut self, config: &VehicleConfig) -> Result<ActorId> {
        info!(blueprint = %config.blueprint, "spawning vehicle");
        let actor_id = self
            .client
            .spawn_vehicle(&config.blueprint, config.spawn_point, &config.attributes)
            .await
            .map_err(|e| ActorFactoryError::vehicle_spawn(&config.id, e.to_string()))?;
        self.enroll(actor_id, ActorRole::Vehicle, &config.id, &config.blueprint);

        // Enrolled already, so a failure here still gets the vehicle destroyed
        self.client
            .configure_vehicle(actor_id, config.autopilot, config.simulate_physics)
            .await
            .map_err(|e| ActorFactoryError::vehicle_spawn(&config.id, e.to_string()))?;

        info!(actor_id, autopilot = config.autopilot, "vehicle spawned successfully");
        Ok(actor_id)
    }

    /// Spawn the LiDAR attached to `parent` and enroll it for teardown
    #[instrument(
        name = "actor_factory_spawn_lidar",
        skip(self, config),
        fields(sensor_id = %config.id, parent = parent)
    )]
    pub async fn spawn_lidar(&mut self, config: &LidarConfig, parent: ActorId) -> Result<ActorId> {
        let blueprint = config.blueprint();
        info!(blueprint, modality = %config.modality, "spawning lidar");

        let actor_id = self
            .client
            .spawn_sensor(
                blueprint,
                config.transform,
                parent,
                &lidar_attributes(config),
            )
            .await
            .map_err(|e| {
                ActorFactoryError::sensor_spawn(&config.id, format!("actor_{parent}"), e.to_string())
            })?;
        self.enroll(actor_id, ActorRole::Sensor, &config.id, blueprint);

        info!(actor_id, "lidar spawned and attached successfully");
        Ok(actor_id)
    }

    /// Data stream of a spawned LiDAR
    pub fn sensor_source(
        &self,
        actor_id: ActorId,
        config: &LidarConfig,
    ) -> Result<Box<dyn SensorSource>> {
        self.client
            .get_sensor_source(actor_id, config.id.clone(), config.modality)
            .ok_or_else(|| ActorFactoryError::SensorSourceUnavailable {
                sensor_id: config.id.clone(),
                actor_id,
            })
    }

    /// Destroy every enrolled actor in reverse spawn order
    ///
    /// The list is drained, so each actor is destroyed at most once no matter
    /// how often this is called. Destroy failures are logged and reported,
    /// never propagated.
    #[instrument(
        name = "actor_factory_teardown",
        skip(self),
        fields(actor_count = self.spawned.len())
    )]
    pub async fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        if self.spawned.is_empty() {
            return report;
        }
        info!("starting teardown");

        while let Some(actor) = self.spawned.pop() {
            if self.destroy_actor_safe(&actor).await {
                report.destroyed += 1;
            } else {
                report.failed.push(actor.actor_id);
            }
        }

        info!(
            destroyed = report.destroyed,
            failed = report.failed.len(),
            "teardown completed"
        );
        report
    }

    fn enroll(&mut self, actor_id: ActorId, role: ActorRole, config_id: &str, blueprint: &str) {
        observability::record_actor_spawned(role.as_str());
        self.spawned.push(SpawnedActor {
            actor_id,
            role,
            config_id: config_id.to_string(),
            blueprint: blueprint.to_string(),
        });
    }

    /// Destroy one actor, logging instead of failing
    #[instrument(
        name = "actor_factory_destroy_actor",
        skip(self, actor),
        fields(actor_id = actor.actor_id, config_id = %actor.config_id)
    )]
    async fn destroy_actor_safe(&self, actor: &SpawnedActor) -> bool {
        debug!(role = actor.role.as_str(), "destroying actor");

        let ok = match self.client.destroy_actor(actor.actor_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    actor_id = actor.actor_id,
                    config_id = %actor.config_id,
                    error = %e,
                    "failed to destroy actor"
                );
                false
            }
        };
        observability::record_actor_destroyed(actor.role.as_str(), ok);
        ok
    }
}

impl<C: CarlaClient> Drop for ActorFactory<C> {
    fn drop(&mut self) {
        if !self.spawned.is_empty() {
            warn!(
                remaining = self.spawned.len(),
                "actor factory dropped without teardown, actors leaked in simulator"
            );
        }
    }
}

/// Spawn attributes; `rotation_frequency` follows `frequency_hz` unless set
fn lidar_attributes(config: &LidarConfig) -> HashMap<String, String> {
    let mut attributes = config.attributes.clone();
    attributes
        .entry("rotation_frequency".to_string())
        .or_insert_with(|| config.frequency_hz.to_string());
    attributes
}
