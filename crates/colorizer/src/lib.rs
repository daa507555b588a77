//! # Colorizer
//!
//! Per-point color strategies for LiDAR returns.
//!
//! - [`IntensityColorizer`]: attenuation-normalized intensity mapped through a [`Palette`]
//! - [`SemanticColorizer`]: class tag looked up in a [`ClassColorTable`]
//!
//! Both are built once at session start from a `ColorizationConfig` (see
//! [`ColorScheme::from_config`]) and shared read-only afterwards.
//!
//! ```
//! use colorizer::{ClassColorTable, Palette};
//! use contracts::ColorTriple;
//!
//! let palette = Palette::plasma();
//! assert_eq!(palette.sample(1.5), palette.colors()[palette.len() - 1]);
//!
//! let road = ClassColorTable::cityscapes().lookup(7).unwrap();
//! assert_eq!(road, ColorTriple::from_rgb8([128, 64, 128]));
//! ```

mod error;
mod intensity;
mod palette;
mod scheme;
mod semantic;

pub use error::{ColorizeError, Result};
pub use intensity::{AttenuationModel, IntensityColorizer, MIN_INTENSITY};
pub use palette::Palette;
pub use scheme::{ColorScheme, Colorize};
pub use semantic::{ClassColorTable, SemanticColorizer};
