//! # Contracts
//!
//! Types shared by every stage of the viewer. This crate depends on no other
//! workspace crate.
//!
//! - `SensorPacket` carries one raw LiDAR buffer per sensor tick
//! - `IntensityPoint` / `SemanticPoint` are the POD record layouts inside that buffer
//! - `SessionBlueprint` describes one viewing session (world, vehicle, lidar, viewer, colors)

mod blueprint;
mod error;
mod runtime;
mod semantic_class;
mod sensor;
mod sensor_id;
mod sensor_source;

pub use blueprint::*;
pub use error::*;
pub use runtime::*;
pub use semantic_class::SemanticClass;
pub use sensor::*;
pub use sensor_id::SensorId;
pub use sensor_source::{SensorDataCallback, SensorSource};
