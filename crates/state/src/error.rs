//! Error types for the shared state crate.

use thiserror::Error;

/// Result type alias for shared state operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shared state error types.
#[derive(Debug, Error)]
pub enum Error {
    /// A value could not be encoded for the databag.
    #[error("failed to encode value for key '{key}': {reason}")]
    Encode { key: String, reason: String },

    /// A databag entry is not valid encoded state.
    #[error("failed to decode value for key '{key}': {reason}")]
    Decode { key: String, reason: String },

    /// A key holds a value of a different kind than requested.
    #[error("key '{key}' holds a {found} value, expected a {expected}")]
    UnexpectedType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A non-leader unit tried to modify the shared state.
    #[error("only the leader unit may modify shared state (key '{key}')")]
    NotLeader { key: String },
}

impl Error {
    /// Create an encode error.
    pub fn encode(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an unexpected type error.
    pub fn unexpected_type(
        key: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::UnexpectedType {
            key: key.into(),
            expected,
            found,
        }
    }

    /// Create a not-leader error.
    pub fn not_leader(key: impl Into<String>) -> Self {
        Self::NotLeader { key: key.into() }
    }
}
