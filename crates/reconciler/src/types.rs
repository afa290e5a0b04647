//! Core types for the reconciler.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use openldap_core::{CharmConfig, RelationId, UnitStatus};
use openldap_state::DataBag;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Operator actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    GetAdminPassword,
    Restart,
    LoadTestUsers,
}

impl ActionKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetAdminPassword => "get-admin-password",
            Self::Restart => "restart",
            Self::LoadTestUsers => "load-test-users",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "get-admin-password" => Ok(Self::GetAdminPassword),
            "restart" => Ok(Self::Restart),
            "load-test-users" => Ok(Self::LoadTestUsers),
            other => Err(Error::action_failed(other, "unknown action")),
        }
    }
}

/// Lifecycle events the operator reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HookEvent {
    Install,
    PebbleReady { container: String },
    ConfigChanged,
    UpdateStatus,
    LdapRelationChanged { relation: RelationId, remote_app: String },
    LdapRelationBroken { relation: RelationId },
    Action { action: ActionKind },
}

impl HookEvent {
    /// Name of the handler that processes this event, for logs.
    #[must_use]
    pub const fn handler_name(&self) -> &'static str {
        match self {
            Self::Install => "on_install",
            Self::PebbleReady { .. } => "on_pebble_ready",
            Self::ConfigChanged => "on_config_changed",
            Self::UpdateStatus => "on_update_status",
            Self::LdapRelationChanged { .. } => "on_ldap_relation_changed",
            Self::LdapRelationBroken { .. } => "on_ldap_relation_broken",
            Self::Action { action } => match action {
                ActionKind::GetAdminPassword => "on_get_admin_password",
                ActionKind::Restart => "on_restart",
                ActionKind::LoadTestUsers => "on_load_test_users",
            },
        }
    }

    /// Actions cannot be deferred; everything else can.
    #[must_use]
    pub const fn is_action(&self) -> bool {
        matches!(self, Self::Action { .. })
    }
}

/// One `ldap` relation as seen from this unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationData {
    /// Name of the application on the other side.
    pub remote_app: String,
    /// This application's databag (leader-writable).
    pub local_app: DataBag,
    /// The remote application's databag.
    pub remote_app_data: DataBag,
}

impl RelationData {
    pub fn new(remote_app: impl Into<String>) -> Self {
        Self {
            remote_app: remote_app.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_remote_data(mut self, remote_app_data: DataBag) -> Self {
        self.remote_app_data = remote_app_data;
        self
    }
}

/// Everything a handler may read or change during one hook invocation.
///
/// The host loads this before dispatch and commits the journaled databag
/// changes and opened ports once the handler returns successfully.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    pub app_name: String,
    pub unit_name: String,
    pub leader: bool,
    pub config: CharmConfig,
    /// Peer application databag; `None` until the peer relation exists.
    pub peer: Option<DataBag>,
    /// Established `ldap` relations.
    pub relations: BTreeMap<RelationId, RelationData>,
    /// Ports to open for this unit.
    pub opened_ports: BTreeSet<u16>,
}

impl HookContext {
    /// Create a context for `unit_name` (`<app>/<n>`).
    pub fn new(unit_name: impl Into<String>) -> Self {
        let unit_name = unit_name.into();
        let app_name = unit_name
            .split_once('/')
            .map_or_else(|| unit_name.clone(), |(app, _)| app.to_string());
        Self {
            app_name,
            unit_name,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_leader(mut self, leader: bool) -> Self {
        self.leader = leader;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: CharmConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_peer(mut self, peer: DataBag) -> Self {
        self.peer = Some(peer);
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: RelationId, data: RelationData) -> Self {
        self.relations.insert(relation, data);
        self
    }
}

/// What a handler asks the host to do once it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// New unit status; `None` leaves the current one in place.
    pub status: Option<UnitStatus>,
    /// Action results.
    pub results: BTreeMap<String, String>,
    /// Re-deliver this event on the next invocation.
    pub deferred: bool,
}

impl HandlerOutcome {
    /// Nothing to report.
    #[must_use]
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Report a new unit status.
    #[must_use]
    pub fn status(status: UnitStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Ask for the event to be retried later.
    #[must_use]
    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }

    /// Attach an action result.
    #[must_use]
    pub fn with_result(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.results.insert(key.into(), value.into());
        self
    }

    /// Replace the reported status.
    #[must_use]
    pub fn with_status(mut self, status: UnitStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_round_trip() -> Result<()> {
        for action in [
            ActionKind::GetAdminPassword,
            ActionKind::Restart,
            ActionKind::LoadTestUsers,
        ] {
            assert_eq!(action.name().parse::<ActionKind>()?, action);
        }
        assert!("drop-database".parse::<ActionKind>().is_err());
        Ok(())
    }

    #[test]
    fn test_context_derives_app_name() {
        let ctx = HookContext::new("openldap-k8s/2");
        assert_eq!(ctx.app_name, "openldap-k8s");
        assert!(ctx.peer.is_none());
    }

    #[test]
    fn test_event_serialization_shape() -> std::result::Result<(), serde_json::Error> {
        let event = HookEvent::LdapRelationChanged {
            relation: RelationId::new("ldap", 4),
            remote_app: "ranger-usersync-k8s".to_string(),
        };
        let json = serde_json::to_string(&event)?;
        assert!(json.contains(r#""kind":"ldap-relation-changed""#));
        assert!(json.contains(r#""relation":"ldap:4""#));
        let back: HookEvent = serde_json::from_str(&json)?;
        assert_eq!(back, event);
        Ok(())
    }

    #[test]
    fn test_outcome_builders() {
        let outcome = HandlerOutcome::status(UnitStatus::active(""))
            .with_result("result", "ok");
        assert!(!outcome.deferred);
        assert_eq!(outcome.results.get("result").map(String::as_str), Some("ok"));
        assert!(HandlerOutcome::deferred().deferred);
    }
}
