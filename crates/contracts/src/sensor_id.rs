//! Shared sensor name carried by every packet of a LiDAR stream.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Name of a spawned sensor, as written in the session blueprint.
///
/// Packets arrive at the scan rate and each one carries the id, so the name
/// is interned once into an `Arc<str>` and cloned by reference count.
///
/// ```
/// use contracts::SensorId;
///
/// let id = SensorId::from("roof_lidar");
/// assert_eq!(id, "roof_lidar");
/// assert!(id.starts_with("roof"));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(Arc<str>);

impl SensorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when both ids share one allocation.
    pub fn same_allocation(&self, other: &SensorId) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for SensorId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SensorId {
    fn from(name: &str) -> Self {
        Self(name.into())
    }
}

impl From<String> for SensorId {
    fn from(name: String) -> Self {
        Self(name.into())
    }
}

impl PartialEq<str> for SensorId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for SensorId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SensorId").field(&&*self.0).finish()
    }
}

impl Serialize for SensorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SensorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
