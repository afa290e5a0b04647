//! Event dispatcher.
//!
//! Maps each [`HookEvent`] to exactly one handler. Handlers never touch the
//! host directly; they return a [`HandlerOutcome`] that the host applies.

use std::sync::Arc;

use openldap_core::UnitStatus;
use tracing::{debug, info, instrument, warn};

use crate::actions::Actions;
use crate::error::Result;
use crate::provider::LdapProvider;
use crate::reconciler::{Reconciler, ReconcilerConfig};
use crate::types::{HandlerOutcome, HookContext, HookEvent};
use crate::workload::Workload;

/// The OpenLDAP operator: reconciler, relation provider and actions wired to
/// one workload container.
pub struct OpenLdapCharm {
    workload: Arc<dyn Workload>,
    reconciler: Reconciler,
    provider: LdapProvider,
    actions: Actions,
}

impl OpenLdapCharm {
    pub fn new(workload: Arc<dyn Workload>, config: ReconcilerConfig) -> Self {
        Self {
            reconciler: Reconciler::new(Arc::clone(&workload), config),
            provider: LdapProvider::default(),
            actions: Actions::new(Arc::clone(&workload)),
            workload,
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: LdapProvider) -> Self {
        self.provider = provider;
        self
    }

    pub const fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Handle one event against `ctx`.
    ///
    /// # Errors
    ///
    /// Propagates handler errors. The context may hold partial changes in
    /// that case and must not be committed.
    #[instrument(skip(self, ctx), fields(unit = %ctx.unit_name, handler = event.handler_name()))]
    pub async fn handle(&self, event: &HookEvent, ctx: &mut HookContext) -> Result<HandlerOutcome> {
        info!("running {}", event.handler_name());
        let result = self.route(event, ctx).await;
        match &result {
            Ok(outcome) if outcome.deferred => info!("deferred {}", event.handler_name()),
            Ok(_) => info!("completed {}", event.handler_name()),
            Err(err) => warn!(error = %err, "completed {} with error", event.handler_name()),
        }
        result
    }

    async fn route(&self, event: &HookEvent, ctx: &mut HookContext) -> Result<HandlerOutcome> {
        match event {
            HookEvent::Install => Ok(HandlerOutcome::status(UnitStatus::maintenance(
                "installing OpenLdap",
            ))),
            HookEvent::PebbleReady { container } => {
                if container != self.workload.container() {
                    debug!(%container, "pebble-ready for another container");
                    return Ok(HandlerOutcome::unchanged());
                }
                self.reconciler.update(ctx).await
            }
            HookEvent::ConfigChanged => self.reconciler.update(ctx).await,
            HookEvent::UpdateStatus => self.reconciler.update_status(ctx).await,
            HookEvent::LdapRelationChanged { relation, .. } => {
                if !self.provider.handles(relation) {
                    return Ok(HandlerOutcome::unchanged());
                }
                self.provider.on_relation_changed(ctx, relation)
            }
            HookEvent::LdapRelationBroken { relation } => {
                if !self.provider.handles(relation) {
                    return Ok(HandlerOutcome::unchanged());
                }
                Ok(self.provider.on_relation_broken(ctx, relation))
            }
            HookEvent::Action { action } => self.actions.run(*action, ctx).await,
        }
    }
}
