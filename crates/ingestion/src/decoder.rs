//! Buffer decoder
//!
//! Reinterprets a raw LiDAR buffer as a sequence of fixed-size records.
//! Record `i` comes from bytes `[i * size, (i + 1) * size)`; the input may
//! have any alignment.

use contracts::{IntensityPoint, LidarRecord, SemanticPoint, SensorModality};

use crate::{IngestionError, Result};

/// Decode a buffer of `P` records
///
/// # Errors
/// `MalformedBuffer` if the length is not a multiple of `P::RECORD_SIZE`.
pub fn decode<P: LidarRecord>(buffer: &[u8]) -> Result<Vec<P>> {
    if buffer.len() % P::RECORD_SIZE != 0 {
        return Err(IngestionError::MalformedBuffer {
            len: buffer.len(),
            record_size: P::RECORD_SIZE,
        });
    }

    Ok(buffer
        .chunks_exact(P::RECORD_SIZE)
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

/// Decoded records of either modality
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBuffer {
    Intensity(Vec<IntensityPoint>),
    Semantic(Vec<SemanticPoint>),
}

impl DecodedBuffer {
    pub fn len(&self) -> usize {
        match self {
            Self::Intensity(points) => points.len(),
            Self::Semantic(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn modality(&self) -> SensorModality {
        match self {
            Self::Intensity(_) => SensorModality::Intensity,
            Self::Semantic(_) => SensorModality::Semantic,
        }
    }
}

/// Decode with the record layout chosen at runtime
pub fn decode_buffer(modality: SensorModality, buffer: &[u8]) -> Result<DecodedBuffer> {
    match modality {
        SensorModality::Intensity => decode(buffer).map(DecodedBuffer::Intensity),
        SensorModality::Semantic => decode(buffer).map(DecodedBuffer::Semantic),
    }
}
