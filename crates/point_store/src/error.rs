//! Store error types

use thiserror::Error;

/// Point store error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Positions and colors are not index-aligned
    #[error("length mismatch: {positions} positions vs {colors} colors")]
    LengthMismatch { positions: usize, colors: usize },
}

/// Store Result type alias
pub type Result<T> = std::result::Result<T, StoreError>;
