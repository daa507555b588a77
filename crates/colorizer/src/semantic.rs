//! Semantic class color strategy

use contracts::{ColorTriple, ColorizationConfig, SemanticClass, SemanticPoint};

use crate::{ColorizeError, Result};

/// CityScapes palette extended with the aircraft part classes, indexed by tag
const CITYSCAPES: [[u8; 3]; SemanticClass::COUNT] = [
    [255, 255, 255], // Unlabeled
    [70, 70, 70],    // Building
    [100, 40, 40],   // Fence
    [55, 90, 80],    // Other
    [220, 20, 60],   // Pedestrian
    [153, 153, 153], // Pole
    [157, 234, 50],  // RoadLine
    [128, 64, 128],  // Road
    [244, 35, 232],  // Sidewalk
    [107, 142, 35],  // Vegetation
    [0, 0, 142],     // Vehicle
    [102, 102, 156], // Wall
    [220, 220, 0],   // TrafficSign
    [70, 130, 180],  // Sky
    [81, 0, 81],     // Ground
    [150, 100, 100], // Bridge
    [230, 150, 140], // RailTrack
    [180, 165, 180], // GuardRail
    [250, 170, 30],  // TrafficLight
    [110, 190, 160], // Static
    [170, 120, 50],  // Dynamic
    [45, 60, 150],   // Water
    [145, 170, 100], // Terrain
    [102, 0, 204],   // AircraftCockpit
    [153, 51, 255],  // AircraftDome
    [0, 255, 0],     // AircraftEmpennage
    [255, 153, 51],  // AircraftEngineLeft
    [204, 102, 0],   // AircraftEngineRight
    [153, 255, 204], // AircraftGearFront
    [153, 255, 204], // AircraftGearLeft
    [153, 255, 204], // AircraftGearRight
    [255, 0, 0],     // AircraftMainBody
    [204, 204, 0],   // AircraftWingLeft
    [255, 255, 51],  // AircraftWingRight
];

/// Direct-indexed class color table covering every [`SemanticClass`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClassColorTable {
    colors: [ColorTriple; SemanticClass::COUNT],
}

impl ClassColorTable {
    pub fn cityscapes() -> Self {
        Self {
            colors: CITYSCAPES.map(ColorTriple::from_rgb8),
        }
    }

    /// Build from 8-bit RGB entries, one per class tag
    ///
    /// # Errors
    /// `IncompleteClassTable` unless exactly one entry per class is given.
    pub fn from_rgb8(entries: &[[u8; 3]]) -> Result<Self> {
        let entries: &[[u8; 3]; SemanticClass::COUNT] =
            entries
                .try_into()
                .map_err(|_| ColorizeError::IncompleteClassTable {
                    len: entries.len(),
                    expected: SemanticClass::COUNT,
                })?;
        Ok(Self {
            colors: entries.map(ColorTriple::from_rgb8),
        })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn lookup(&self, tag: u32) -> Result<ColorTriple> {
        self.colors
            .get(tag as usize)
            .copied()
            .ok_or(ColorizeError::UnknownClassTag {
                tag,
                table_len: self.colors.len(),
            })
    }

    pub fn color_of(&self, class: SemanticClass) -> ColorTriple {
        self.colors[class.tag() as usize]
    }
}

impl Default for ClassColorTable {
    fn default() -> Self {
        Self::cityscapes()
    }
}

/// Maps semantic returns to class colors
#[derive(Debug, Clone, Default)]
pub struct SemanticColorizer {
    table: ClassColorTable,
    shade_by_incidence: bool,
}

impl SemanticColorizer {
    pub fn new(table: ClassColorTable, shade_by_incidence: bool) -> Self {
        Self {
            table,
            shade_by_incidence,
        }
    }

    pub fn from_config(config: &ColorizationConfig) -> Result<Self> {
        let table = match &config.class_colors {
            Some(entries) => ClassColorTable::from_rgb8(entries)?,
            None => ClassColorTable::cityscapes(),
        };
        Ok(Self::new(table, config.shade_by_incidence))
    }

    pub fn table(&self) -> &ClassColorTable {
        &self.table
    }

    /// Color for one semantic return
    ///
    /// With incidence shading on, the class color is scaled by the clamped
    /// incidence cosine so grazing hits render darker.
    pub fn color(&self, point: &SemanticPoint) -> Result<ColorTriple> {
        let base = self.table.lookup(point.object_tag)?;
        if self.shade_by_incidence {
            let shade = if point.cos_angle.is_nan() {
                0.0
            } else {
                point.cos_angle.clamp(0.0, 1.0)
            };
            Ok(base.scaled(shade))
        } else {
            Ok(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(tag: u32, cos_angle: f32) -> SemanticPoint {
        SemanticPoint {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            cos_angle,
            object_index: 42,
            object_tag: tag,
        }
    }

    #[test]
    fn test_every_class_has_a_color() {
        let table = ClassColorTable::cityscapes();
        assert_eq!(table.len(), SemanticClass::COUNT);
        for class in SemanticClass::ALL {
            assert_eq!(table.lookup(class.tag()).unwrap(), table.color_of(class));
        }
    }

    #[test]
    fn test_road_color() {
        let colorizer = SemanticColorizer::default();
        let road = colorizer.color(&point(7, 0.3)).unwrap();
        assert_eq!(road, ColorTriple::new(128.0 / 255.0, 64.0 / 255.0, 128.0 / 255.0));
        // Pure: same tag, same color regardless of the other fields
        assert_eq!(colorizer.color(&point(7, -1.0)).unwrap(), road);
    }

    #[test]
    fn test_unknown_tag() {
        let table = ClassColorTable::cityscapes();
        assert_eq!(
            table.lookup(34),
            Err(ColorizeError::UnknownClassTag {
                tag: 34,
                table_len: 34
            })
        );
    }

    #[test]
    fn test_custom_table_must_be_complete() {
        let err = ClassColorTable::from_rgb8(&[[0, 0, 0]; 22]).unwrap_err();
        assert_eq!(
            err,
            ColorizeError::IncompleteClassTable {
                len: 22,
                expected: 34
            }
        );
        let table = ClassColorTable::from_rgb8(&[[10, 20, 30]; 34]).unwrap();
        assert_eq!(table.lookup(33).unwrap().to_rgb8(), [10, 20, 30]);
    }

    #[test]
    fn test_shade_by_incidence() {
        let colorizer = SemanticColorizer::new(ClassColorTable::cityscapes(), true);
        let base = ClassColorTable::cityscapes().lookup(4).unwrap();

        assert_eq!(colorizer.color(&point(4, 1.0)).unwrap(), base);
        assert_eq!(colorizer.color(&point(4, 0.5)).unwrap(), base.scaled(0.5));
        assert_eq!(colorizer.color(&point(4, -0.2)).unwrap(), base.scaled(0.0));
    }
}
