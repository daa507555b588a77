//! Colorizer error types

use thiserror::Error;

/// Colorization error
#[derive(Debug, Error, PartialEq)]
pub enum ColorizeError {
    /// Intensity outside the logarithm's domain
    #[error("invalid intensity {value}: must be > 0")]
    InvalidIntensity {
        /// Offending intensity
        value: f32,
    },

    /// Class tag not covered by the color table
    #[error("unknown class tag {tag} (table covers 0..{table_len})")]
    UnknownClassTag {
        /// Offending tag
        tag: u32,
        /// Number of entries in the table
        table_len: usize,
    },

    /// Palette control points are unusable
    #[error("invalid palette: {message}")]
    InvalidPalette { message: String },

    /// Class table does not cover every class
    #[error("class color table has {len} entries, expected {expected}")]
    IncompleteClassTable { len: usize, expected: usize },
}

impl ColorizeError {
    pub fn invalid_palette(message: impl Into<String>) -> Self {
        Self::InvalidPalette {
            message: message.into(),
        }
    }
}

/// Colorizer Result type alias
pub type Result<T> = std::result::Result<T, ColorizeError>;
