//! Unit workload status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status a unit reports to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    /// Transient work in progress (install, reconfiguration, actions).
    Maintenance(String),
    /// Waiting on something outside this unit's control.
    Waiting(String),
    /// Needs operator intervention before it can proceed.
    Blocked(String),
    /// Workload configured and serving.
    Active(String),
}

impl UnitStatus {
    /// Create a maintenance status.
    pub fn maintenance(message: impl Into<String>) -> Self {
        Self::Maintenance(message.into())
    }

    /// Create a waiting status.
    pub fn waiting(message: impl Into<String>) -> Self {
        Self::Waiting(message.into())
    }

    /// Create a blocked status.
    pub fn blocked(message: impl Into<String>) -> Self {
        Self::Blocked(message.into())
    }

    /// Create an active status.
    pub fn active(message: impl Into<String>) -> Self {
        Self::Active(message.into())
    }

    /// Status name as understood by `status-set`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Maintenance(_) => "maintenance",
            Self::Waiting(_) => "waiting",
            Self::Blocked(_) => "blocked",
            Self::Active(_) => "active",
        }
    }

    /// Human readable message attached to the status.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Maintenance(message)
            | Self::Waiting(message)
            | Self::Blocked(message)
            | Self::Active(message) => message,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}: {}", self.name(), self.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_message() {
        assert_eq!(UnitStatus::active("").to_string(), "active");
    }

    #[test]
    fn test_display_with_message() {
        let status = UnitStatus::blocked("peer relation not ready");
        assert_eq!(status.to_string(), "blocked: peer relation not ready");
        assert!(status.is_blocked());
    }

    #[test]
    fn test_serde_shape() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&UnitStatus::maintenance("installing OpenLdap"))?;
        assert_eq!(
            json,
            r#"{"status":"maintenance","message":"installing OpenLdap"}"#
        );
        Ok(())
    }
}
