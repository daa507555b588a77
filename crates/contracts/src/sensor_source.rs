//! Push-based LiDAR stream shared by the CARLA sensor and the synthetic one.

use std::sync::Arc;

use crate::{SensorModality, SensorPacket};

/// Invoked on the sensor's delivery thread once per tick.
pub type SensorDataCallback = Arc<dyn Fn(SensorPacket) + Send + Sync>;

/// A LiDAR that pushes one [`SensorPacket`] per sweep.
///
/// # Example
///
/// ```ignore
/// let sensor: Box<dyn SensorSource> = client.get_sensor_source(actor_id, id, modality)?;
/// sensor.listen(Arc::new(|packet| {
///     println!("{} bytes from {}", packet.payload.len(), packet.sensor_id);
/// }));
/// // ... render ...
/// sensor.stop();
/// ```
pub trait SensorSource: Send + Sync {
    fn sensor_id(&self) -> &str;

    /// Record layout this source delivers
    fn modality(&self) -> SensorModality;

    /// Start delivering packets to `callback`. Ignored while already listening.
    fn listen(&self, callback: SensorDataCallback);

    /// No callback invocation starts after this returns.
    fn stop(&self);

    fn is_listening(&self) -> bool;
}
