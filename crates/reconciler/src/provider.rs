//! Provides side of the `ldap` relation.
//!
//! The leader publishes where the directory lives and how to bind to it into
//! every related application's databag. Nothing is revoked when a relation
//! goes away.

use openldap_core::constants::{APPLICATION_PORT, DEPLOYMENT_NAME_OPTION, LDAP_RELATION};
use openldap_core::{RelationId, UnitStatus};
use openldap_state::SharedState;
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{HandlerOutcome, HookContext};

/// Keys published into the local application bag.
pub mod fields {
    pub const LDAP_URL: &str = "ldap_url";
    pub const BASE_DN: &str = "base_dn";
    pub const ADMIN_PASSWORD: &str = "admin_password";
}

/// Handles `<relation>-relation-changed` and `<relation>-relation-broken`.
#[derive(Debug, Clone)]
pub struct LdapProvider {
    relation_name: String,
}

impl Default for LdapProvider {
    fn default() -> Self {
        Self::new(LDAP_RELATION)
    }
}

impl LdapProvider {
    pub fn new(relation_name: impl Into<String>) -> Self {
        Self {
            relation_name: relation_name.into(),
        }
    }

    #[must_use]
    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    /// Whether `relation` belongs to the endpoint this provider serves.
    #[must_use]
    pub fn handles(&self, relation: &RelationId) -> bool {
        relation.endpoint() == self.relation_name
    }

    /// Publish the connection details to `relation`.
    ///
    /// Only the leader writes, and only once the remote application has said
    /// something. If the credentials have not been generated yet the event is
    /// deferred until they are.
    ///
    /// # Errors
    ///
    /// Returns an error if the shared state holds undecodable values.
    pub fn on_relation_changed(
        &self,
        ctx: &mut HookContext,
        relation: &RelationId,
    ) -> Result<HandlerOutcome> {
        if !ctx.leader {
            return Ok(HandlerOutcome::unchanged());
        }

        let Some(data) = ctx.relations.get(relation) else {
            debug!(%relation, "relation no longer present");
            return Ok(HandlerOutcome::unchanged());
        };
        if data.remote_app_data.is_empty() {
            debug!(%relation, remote_app = %data.remote_app, "remote application has not sent data yet");
            return Ok(HandlerOutcome::unchanged());
        }

        let host = match ctx.config.require_str(DEPLOYMENT_NAME_OPTION) {
            Ok(host) => host.to_string(),
            Err(err) => return Ok(HandlerOutcome::status(UnitStatus::blocked(err.to_string()))),
        };

        let state = SharedState::read_only(&ctx.peer);
        let (Some(base_dn), Some(password)) = (state.base_dn()?, state.bind_password()?) else {
            info!(%relation, "credentials not initialised yet, deferring");
            return Ok(HandlerOutcome::deferred());
        };

        let Some(data) = ctx.relations.get_mut(relation) else {
            return Ok(HandlerOutcome::unchanged());
        };
        data.local_app.update([
            (fields::LDAP_URL, format!("ldap://{host}:{APPLICATION_PORT}")),
            (fields::BASE_DN, base_dn),
            (fields::ADMIN_PASSWORD, password),
        ]);
        info!(%relation, remote_app = %data.remote_app, "published ldap connection details");

        Ok(HandlerOutcome::status(UnitStatus::active("")))
    }

    /// A consumer went away. Credentials stay valid.
    pub fn on_relation_broken(&self, ctx: &HookContext, relation: &RelationId) -> HandlerOutcome {
        if ctx.leader {
            info!(%relation, "LDAP relation removed.");
        }
        HandlerOutcome::unchanged()
    }
}
