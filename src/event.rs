//! Translate a Juju dispatch into a [`HookEvent`].

use anyhow::{Context, Result, bail};
use tracing::debug;

use openldap_core::RelationId;
use openldap_core::constants::LDAP_RELATION;
use openldap_reconciler::{ActionKind, HookEvent};

/// Parse `JUJU_DISPATCH_PATH`.
///
/// Returns `Ok(None)` for hooks the operator does not observe. Relation hooks
/// need `JUJU_RELATION_ID` (and `JUJU_REMOTE_APP` when changed), read through
/// `env`.
///
/// # Errors
///
/// Returns an error for an unknown action or missing relation variables.
pub fn parse_dispatch(
    path: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Option<HookEvent>> {
    let path = path.trim_start_matches("./");

    if let Some(name) = path.strip_prefix("actions/") {
        let action: ActionKind = name.parse()?;
        return Ok(Some(HookEvent::Action { action }));
    }

    let Some(hook) = path.strip_prefix("hooks/") else {
        bail!("Unrecognised dispatch path: {path}");
    };

    let event = match hook {
        "install" => Some(HookEvent::Install),
        "config-changed" => Some(HookEvent::ConfigChanged),
        "update-status" => Some(HookEvent::UpdateStatus),
        _ => {
            if let Some(container) = hook.strip_suffix("-pebble-ready") {
                Some(HookEvent::PebbleReady {
                    container: container.to_string(),
                })
            } else if hook == format!("{LDAP_RELATION}-relation-changed") {
                Some(HookEvent::LdapRelationChanged {
                    relation: relation_id(&env)?,
                    remote_app: env("JUJU_REMOTE_APP")
                        .context("JUJU_REMOTE_APP is not set for a relation-changed hook")?,
                })
            } else if hook == format!("{LDAP_RELATION}-relation-broken") {
                Some(HookEvent::LdapRelationBroken {
                    relation: relation_id(&env)?,
                })
            } else {
                None
            }
        }
    };

    if event.is_none() {
        debug!(hook, "hook not observed");
    }
    Ok(event)
}

fn relation_id(env: &impl Fn(&str) -> Option<String>) -> Result<RelationId> {
    let raw = env("JUJU_RELATION_ID").context("JUJU_RELATION_ID is not set for a relation hook")?;
    raw.parse()
        .with_context(|| format!("Invalid JUJU_RELATION_ID: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn relation_env(key: &str) -> Option<String> {
        match key {
            "JUJU_RELATION_ID" => Some("ldap:4".to_string()),
            "JUJU_REMOTE_APP" => Some("ranger-usersync-k8s".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_lifecycle_hooks() -> Result<()> {
        assert_eq!(parse_dispatch("hooks/install", no_env)?, Some(HookEvent::Install));
        assert_eq!(
            parse_dispatch("hooks/config-changed", no_env)?,
            Some(HookEvent::ConfigChanged)
        );
        assert_eq!(
            parse_dispatch("./hooks/update-status", no_env)?,
            Some(HookEvent::UpdateStatus)
        );
        assert_eq!(
            parse_dispatch("hooks/openldap-pebble-ready", no_env)?,
            Some(HookEvent::PebbleReady {
                container: "openldap".to_string()
            })
        );
        Ok(())
    }

    #[test]
    fn test_relation_hooks_read_environment() -> Result<()> {
        assert_eq!(
            parse_dispatch("hooks/ldap-relation-changed", relation_env)?,
            Some(HookEvent::LdapRelationChanged {
                relation: RelationId::new("ldap", 4),
                remote_app: "ranger-usersync-k8s".to_string(),
            })
        );
        assert_eq!(
            parse_dispatch("hooks/ldap-relation-broken", relation_env)?,
            Some(HookEvent::LdapRelationBroken {
                relation: RelationId::new("ldap", 4),
            })
        );
        assert!(parse_dispatch("hooks/ldap-relation-changed", no_env).is_err());
        Ok(())
    }

    #[test]
    fn test_actions() -> Result<()> {
        assert_eq!(
            parse_dispatch("actions/load-test-users", no_env)?,
            Some(HookEvent::Action {
                action: ActionKind::LoadTestUsers
            })
        );
        assert!(parse_dispatch("actions/drop-database", no_env).is_err());
        Ok(())
    }

    #[test]
    fn test_unobserved_hooks_are_ignored() -> Result<()> {
        assert_eq!(parse_dispatch("hooks/leader-elected", no_env)?, None);
        assert_eq!(parse_dispatch("hooks/peer-relation-changed", no_env)?, None);
        assert!(parse_dispatch("bogus", no_env).is_err());
        Ok(())
    }
}
