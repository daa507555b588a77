//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Viewer backend not compiled in
    #[error("Viewer backend '{backend}' is not available, rebuild with `--features {feature}`")]
    ViewerUnavailable {
        backend: &'static str,
        feature: &'static str,
    },

    /// The session was stopped by an unrecoverable pipeline error
    #[error("Session aborted: {reason}")]
    SessionAborted { reason: String },

    /// The session task panicked; teardown still ran
    #[error("Session panicked: {message}")]
    SessionPanicked { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn session_aborted(reason: impl Into<String>) -> Self {
        Self::SessionAborted {
            reason: reason.into(),
        }
    }

    pub fn session_panicked(message: impl Into<String>) -> Self {
        Self::SessionPanicked {
            message: message.into(),
        }
    }
}
