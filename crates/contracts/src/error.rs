//! Errors raised while reading a session blueprint.
//!
//! Runtime stages (actor factory, ingestion, viewer) define their own enums.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ContractError {
    /// The file could not be decoded in its declared format
    #[error("{format} session config is malformed: {source}")]
    ConfigParse {
        format: &'static str,
        #[source]
        source: BoxedSource,
    },

    /// A well-formed blueprint holds a value the viewer cannot run with
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Extension is missing or names a format with no parser
    #[error("unsupported config format: {}", extension.as_deref().map_or("(none)".to_string(), |e| format!(".{e}")))]
    UnsupportedFormat { extension: Option<String> },

    #[error("failed to write {format} session config: {source}")]
    ConfigSerialize {
        format: &'static str,
        #[source]
        source: BoxedSource,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn config_parse(format: &'static str, source: impl Into<BoxedSource>) -> Self {
        Self::ConfigParse {
            format,
            source: source.into(),
        }
    }

    pub fn config_serialize(format: &'static str, source: impl Into<BoxedSource>) -> Self {
        Self::ConfigSerialize {
            format,
            source: source.into(),
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message() {
        let err = ContractError::UnsupportedFormat {
            extension: Some("yaml".into()),
        };
        assert_eq!(err.to_string(), "unsupported config format: .yaml");

        let err = ContractError::UnsupportedFormat { extension: None };
        assert_eq!(err.to_string(), "unsupported config format: (none)");
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = ContractError::config_validation("viewer.width", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "config validation error at 'viewer.width': must be at least 1"
        );
    }
}
