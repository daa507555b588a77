//! # Point Store
//!
//! Latest-wins storage for the colored point cloud shared between the
//! sensor callback (writer) and the render loop (reader).
//!
//! ```
//! use contracts::ColorTriple;
//! use point_store::PointCloudStore;
//!
//! let store = PointCloudStore::new();
//! assert!(!store.has_data());
//!
//! store.write(vec![[1.0, -2.0, 0.5]], vec![ColorTriple::new(1.0, 0.0, 0.0)]).unwrap();
//! let cloud = store.read();
//! assert_eq!(cloud.len(), 1);
//! ```

mod cloud;
mod error;
mod store;

pub use cloud::PointCloud;
pub use error::{Result, StoreError};
pub use store::{CloudSnapshot, PointCloudStore};
