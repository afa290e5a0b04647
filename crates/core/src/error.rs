//! Core error types for configuration and relation handling.
//!
//! All errors are explicit, typed, and recoverable - no panics allowed.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    #[error("missing configuration: {key}")]
    ConfigMissing { key: String },

    #[error("configuration option '{key}' must be a {expected}")]
    ConfigType { key: String, expected: &'static str },

    // Relation errors
    #[error("invalid relation id '{raw}'")]
    InvalidRelationId { raw: String },

    // Parsing errors
    #[error("JSON parse error: {reason}")]
    JsonParseFailed { reason: String },

    #[error("YAML parse error: {reason}")]
    YamlParseFailed { reason: String },
}

impl Error {
    /// Create a missing configuration error.
    pub fn config_missing(key: impl Into<String>) -> Self {
        Self::ConfigMissing { key: key.into() }
    }

    /// Create a configuration type error.
    pub fn config_type(key: impl Into<String>, expected: &'static str) -> Self {
        Self::ConfigType {
            key: key.into(),
            expected,
        }
    }

    /// Create an invalid relation id error.
    pub fn invalid_relation_id(raw: impl Into<String>) -> Self {
        Self::InvalidRelationId { raw: raw.into() }
    }

    /// Create a JSON parse error.
    pub fn json_parse_failed(reason: impl Into<String>) -> Self {
        Self::JsonParseFailed {
            reason: reason.into(),
        }
    }

    /// Create a YAML parse error.
    pub fn yaml_parse_failed(reason: impl Into<String>) -> Self {
        Self::YamlParseFailed {
            reason: reason.into(),
        }
    }
}
