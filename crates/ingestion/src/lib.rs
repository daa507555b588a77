//! # Ingestion
//!
//! Turns raw LiDAR buffers into colored point clouds.
//!
//! Per sensor tick: decode the buffer into records, flip positions into the
//! viewer's right-handed frame, color every record with the strategy for the
//! active modality, and publish the pair to the shared [`PointCloudStore`].
//!
//! ```ignore
//! use ingestion::AcquisitionCallback;
//!
//! let callback = AcquisitionCallback::new(
//!     "roof_lidar".into(),
//!     SensorModality::Semantic,
//!     scheme.clone(),
//!     store.clone(),
//!     shutdown.clone(),
//! );
//! sensor.listen(callback.into_callback());
//! ```
//!
//! [`PointCloudStore`]: point_store::PointCloudStore

mod acquisition;
pub mod decoder;
mod error;
mod metrics;
pub mod normalizer;

pub use acquisition::{AcquisitionCallback, Published};
pub use decoder::{decode, decode_buffer, DecodedBuffer};
pub use error::{IngestionError, Result};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use normalizer::to_right_handed;
