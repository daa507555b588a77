//! Ingestion error types

use colorizer::ColorizeError;
use contracts::SensorModality;
use point_store::StoreError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error, PartialEq)]
pub enum IngestionError {
    /// Buffer length is not a whole number of records
    #[error("malformed buffer: {len} bytes is not a multiple of record size {record_size}")]
    MalformedBuffer {
        /// Buffer length in bytes
        len: usize,
        /// Expected record size in bytes
        record_size: usize,
    },

    /// Packet layout differs from the one the callback was built for
    #[error("sensor {sensor_id} delivered {actual} data, expected {expected}")]
    ModalityMismatch {
        sensor_id: String,
        expected: SensorModality,
        actual: SensorModality,
    },

    /// A point could not be colored
    #[error(transparent)]
    Colorize(#[from] ColorizeError),

    /// The store rejected the cloud
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestionError {
    /// Whether the failure is confined to the current tick
    ///
    /// Store rejections mean positions and colors went out of step, which
    /// no later tick can fix.
    pub fn is_tick_local(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    /// Short label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedBuffer { .. } => "malformed_buffer",
            Self::ModalityMismatch { .. } => "modality_mismatch",
            Self::Colorize(ColorizeError::InvalidIntensity { .. }) => "invalid_intensity",
            Self::Colorize(ColorizeError::UnknownClassTag { .. }) => "unknown_class_tag",
            Self::Colorize(_) => "colorize",
            Self::Store(_) => "store",
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
