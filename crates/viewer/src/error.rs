//! Viewer error types

use thiserror::Error;

/// Viewer error
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Operation needs an open window
    #[error("viewer window is not open")]
    WindowNotOpen,

    /// `create_window` called twice
    #[error("viewer window '{name}' is already open")]
    WindowAlreadyOpen { name: String },

    /// Backend-specific failure
    #[error("viewer backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ViewerError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }
}

/// Viewer Result type alias
pub type Result<T> = std::result::Result<T, ViewerError>;
