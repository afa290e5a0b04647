//! Reconciler implementation.

use std::path::PathBuf;
use std::sync::Arc;

use openldap_core::UnitStatus;
use openldap_core::constants::{
    APPLICATION_PORT, BASE_DN_OPTION, PASSWORD_LENGTH, REQUIRED_OPTIONS, SERVICE_NAME,
};
use openldap_state::SharedState;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::layer::{openldap_layer, service_environment};
use crate::password::random_string;
use crate::types::{HandlerOutcome, HookContext};
use crate::workload::Workload;

/// Message shown while the peer relation is missing.
pub const PEER_NOT_READY: &str = "peer relation not ready";

/// Configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Local directory pushed into the container root before planning.
    pub templates_dir: PathBuf,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
        }
    }
}

/// Converges the OpenLDAP container to the current configuration.
pub struct Reconciler {
    workload: Arc<dyn Workload>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a new reconciler.
    pub fn new(workload: Arc<dyn Workload>, config: ReconcilerConfig) -> Self {
        Self { workload, config }
    }

    /// Why the unit cannot be configured right now, if it cannot.
    ///
    /// The peer relation is checked first, then the options the layer and the
    /// relation advertisement depend on.
    #[must_use]
    pub fn blocked_reason(ctx: &HookContext) -> Option<String> {
        if !SharedState::read_only(&ctx.peer).is_ready() {
            return Some(PEER_NOT_READY.to_string());
        }

        REQUIRED_OPTIONS
            .iter()
            .find_map(|key| ctx.config.require_str(key).err())
            .map(|err| err.to_string())
    }

    /// Recompute the service layer and ask the supervisor to converge to it.
    ///
    /// # Errors
    ///
    /// Returns an error if shared state cannot be read or written, or if the
    /// supervisor rejects the push, the layer or the replan.
    pub async fn update(&self, ctx: &mut HookContext) -> Result<HandlerOutcome> {
        if let Some(reason) = Self::blocked_reason(ctx) {
            warn!(%reason, "cannot configure openldap");
            return Ok(HandlerOutcome::status(UnitStatus::blocked(reason)));
        }

        if !self.workload.can_connect().await {
            debug!(
                container = self.workload.container(),
                "container not reachable, deferring"
            );
            return Ok(HandlerOutcome::deferred());
        }

        self.workload
            .push_path(&self.config.templates_dir, "/")
            .await?;

        info!("configuring openldap");

        let mut state = SharedState::for_unit(&mut ctx.peer, ctx.leader);
        let stored = state
            .bind_password()?
            .filter(|password| !password.is_empty());
        let password = match stored {
            Some(password) => password,
            None if state.is_writable() => {
                let password = random_string(PASSWORD_LENGTH);
                state.set_bind_password(&password)?;
                info!("generated administrator password");
                password
            }
            None => {
                info!("administrator password not published by the leader yet");
                return Ok(HandlerOutcome::status(UnitStatus::waiting(
                    "waiting for leader to initialise credentials",
                )));
            }
        };

        if state.is_writable() {
            state.set_base_dn(ctx.config.require_str(BASE_DN_OPTION)?)?;
        }

        info!("planning openldap execution");
        let layer = openldap_layer(service_environment(&ctx.config, &password));
        self.workload.add_layer(SERVICE_NAME, &layer, true).await?;
        self.workload.replan().await?;

        ctx.opened_ports.insert(APPLICATION_PORT);

        Ok(HandlerOutcome::status(UnitStatus::active("")))
    }

    /// Report how the workload is doing without changing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the supervisor cannot list services.
    pub async fn update_status(&self, ctx: &HookContext) -> Result<HandlerOutcome> {
        if let Some(reason) = Self::blocked_reason(ctx) {
            return Ok(HandlerOutcome::status(UnitStatus::blocked(reason)));
        }

        if !self.workload.can_connect().await {
            return Ok(HandlerOutcome::status(UnitStatus::waiting(
                "waiting for Pebble",
            )));
        }

        let status = if self.workload.service_running(SERVICE_NAME).await? {
            UnitStatus::active("Status check: UP")
        } else {
            UnitStatus::maintenance("Status check: DOWN")
        };
        Ok(HandlerOutcome::status(status))
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}
