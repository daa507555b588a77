//! Semantic class tags reported by `sensor.lidar.ray_cast_semantic`
//!
//! Tags 0..=22 follow the CityScapes-derived CARLA set; 23..=33 are the
//! aircraft part classes of the custom asset pack.

use serde::{Deserialize, Serialize};

/// Semantic object class
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticClass {
    Unlabeled = 0,
    Building = 1,
    Fence = 2,
    Other = 3,
    Pedestrian = 4,
    Pole = 5,
    RoadLine = 6,
    Road = 7,
    Sidewalk = 8,
    Vegetation = 9,
    Vehicle = 10,
    Wall = 11,
    TrafficSign = 12,
    Sky = 13,
    Ground = 14,
    Bridge = 15,
    RailTrack = 16,
    GuardRail = 17,
    TrafficLight = 18,
    Static = 19,
    Dynamic = 20,
    Water = 21,
    Terrain = 22,
    AircraftCockpit = 23,
    AircraftDome = 24,
    AircraftEmpennage = 25,
    AircraftEngineLeft = 26,
    AircraftEngineRight = 27,
    AircraftGearFront = 28,
    AircraftGearLeft = 29,
    AircraftGearRight = 30,
    AircraftMainBody = 31,
    AircraftWingLeft = 32,
    AircraftWingRight = 33,
}

impl SemanticClass {
    /// Number of enumerated classes
    pub const COUNT: usize = 34;

    /// Every class, indexed by tag
    pub const ALL: [SemanticClass; Self::COUNT] = [
        Self::Unlabeled,
        Self::Building,
        Self::Fence,
        Self::Other,
        Self::Pedestrian,
        Self::Pole,
        Self::RoadLine,
        Self::Road,
        Self::Sidewalk,
        Self::Vegetation,
        Self::Vehicle,
        Self::Wall,
        Self::TrafficSign,
        Self::Sky,
        Self::Ground,
        Self::Bridge,
        Self::RailTrack,
        Self::GuardRail,
        Self::TrafficLight,
        Self::Static,
        Self::Dynamic,
        Self::Water,
        Self::Terrain,
        Self::AircraftCockpit,
        Self::AircraftDome,
        Self::AircraftEmpennage,
        Self::AircraftEngineLeft,
        Self::AircraftEngineRight,
        Self::AircraftGearFront,
        Self::AircraftGearLeft,
        Self::AircraftGearRight,
        Self::AircraftMainBody,
        Self::AircraftWingLeft,
        Self::AircraftWingRight,
    ];

    /// Look up a class by its raw tag
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Raw tag value
    pub fn tag(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unlabeled => "unlabeled",
            Self::Building => "building",
            Self::Fence => "fence",
            Self::Other => "other",
            Self::Pedestrian => "pedestrian",
            Self::Pole => "pole",
            Self::RoadLine => "road line",
            Self::Road => "road",
            Self::Sidewalk => "sidewalk",
            Self::Vegetation => "vegetation",
            Self::Vehicle => "vehicle",
            Self::Wall => "wall",
            Self::TrafficSign => "traffic sign",
            Self::Sky => "sky",
            Self::Ground => "ground",
            Self::Bridge => "bridge",
            Self::RailTrack => "rail track",
            Self::GuardRail => "guard rail",
            Self::TrafficLight => "traffic light",
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Water => "water",
            Self::Terrain => "terrain",
            Self::AircraftCockpit => "aircraft cockpit",
            Self::AircraftDome => "aircraft dome",
            Self::AircraftEmpennage => "aircraft empennage",
            Self::AircraftEngineLeft => "aircraft engine (left)",
            Self::AircraftEngineRight => "aircraft engine (right)",
            Self::AircraftGearFront => "aircraft gear (front)",
            Self::AircraftGearLeft => "aircraft gear (left)",
            Self::AircraftGearRight => "aircraft gear (right)",
            Self::AircraftMainBody => "aircraft main body",
            Self::AircraftWingLeft => "aircraft wing (left)",
            Self::AircraftWingRight => "aircraft wing (right)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_index() {
        for (idx, class) in SemanticClass::ALL.iter().enumerate() {
            assert_eq!(class.tag() as usize, idx);
            assert_eq!(SemanticClass::from_tag(idx as u32), Some(*class));
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(SemanticClass::from_tag(34), None);
        assert_eq!(SemanticClass::from_tag(u32::MAX), None);
        assert_eq!(SemanticClass::from_tag(7), Some(SemanticClass::Road));
    }
}
