//! Error types for the reconciler crate.

use thiserror::Error;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing charm configuration.
    #[error(transparent)]
    Config(#[from] openldap_core::Error),

    /// Shared state could not be read or written.
    #[error(transparent)]
    State(#[from] openldap_state::Error),

    /// A workload (Pebble) operation failed.
    #[error("workload operation '{operation}' failed: {reason}")]
    Workload { operation: String, reason: String },

    /// A command run inside the workload exited unsuccessfully.
    #[error("command '{command}' exited with status {exit_code}")]
    ExecFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The service layer could not be rendered.
    #[error("failed to render layer: {reason}")]
    Layer { reason: String },

    /// An action could not be completed.
    #[error("action '{action}' failed: {reason}")]
    ActionFailed { action: String, reason: String },
}

impl Error {
    /// Create a workload error.
    pub fn workload(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Workload {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an exec failure.
    pub fn exec_failed(
        command: impl Into<String>,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ExecFailed {
            command: command.into(),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a layer rendering error.
    pub fn layer(reason: impl Into<String>) -> Self {
        Self::Layer {
            reason: reason.into(),
        }
    }

    /// Create an action failure.
    pub fn action_failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionFailed {
            action: action.into(),
            reason: reason.into(),
        }
    }
}
