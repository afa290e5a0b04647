//! Load a [`HookContext`] from the agent and write the results back.

use anyhow::{Context, Result};
use tracing::{debug, info};

use openldap_core::RelationId;
use openldap_core::constants::{LDAP_RELATION, PEER_RELATION};
use openldap_reconciler::{HandlerOutcome, HookContext, RelationData};

use crate::juju::HookTools;

/// Snapshot everything a handler may look at.
///
/// Only the leader may read its own application bag on a provides
/// relation, so followers see those as empty.
///
/// # Errors
///
/// Returns an error if any hook tool fails.
pub async fn load(tools: &HookTools, unit_name: &str) -> Result<HookContext> {
    let leader = tools.is_leader().await.context("Failed to query leadership")?;
    let config = tools.config_get().await.context("Failed to read charm config")?;
    let mut ctx = HookContext::new(unit_name)
        .with_leader(leader)
        .with_config(config);

    let peer = tools
        .relation_ids(PEER_RELATION)
        .await
        .context("Failed to list peer relations")?;
    if let Some(relation) = peer.first() {
        let bag = tools
            .relation_get_app(relation, &ctx.app_name)
            .await
            .context("Failed to read peer application data")?;
        ctx.peer = Some(bag);
    }

    for relation in tools
        .relation_ids(LDAP_RELATION)
        .await
        .context("Failed to list ldap relations")?
    {
        let data = load_relation(tools, &relation, &ctx.app_name, leader)
            .await
            .with_context(|| format!("Failed to read relation {relation}"))?;
        ctx.relations.insert(relation, data);
    }

    debug!(
        unit = %ctx.unit_name,
        leader,
        peer_ready = ctx.peer.is_some(),
        relations = ctx.relations.len(),
        options = %ctx.config.describe_keys(),
        "loaded hook context"
    );
    Ok(ctx)
}

async fn load_relation(
    tools: &HookTools,
    relation: &RelationId,
    app_name: &str,
    leader: bool,
) -> Result<RelationData> {
    let Some(remote_app) = tools.remote_app(relation).await? else {
        return Ok(RelationData::default());
    };
    let remote_app_data = tools.relation_get_app(relation, &remote_app).await?;
    let mut data = RelationData::new(remote_app).with_remote_data(remote_app_data);
    if leader {
        data.local_app = tools.relation_get_app(relation, app_name).await?;
    }
    Ok(data)
}

/// Flush what a successful handler changed: databag writes, opened ports,
/// status and action results.
///
/// # Errors
///
/// Returns an error if any hook tool fails.
pub async fn commit(
    tools: &HookTools,
    ctx: &mut HookContext,
    outcome: &HandlerOutcome,
    is_action: bool,
) -> Result<()> {
    if let Some(peer) = ctx.peer.as_mut() {
        let changes = peer.take_changes();
        if !changes.is_empty() {
            let relation = tools
                .relation_ids(PEER_RELATION)
                .await?
                .into_iter()
                .next()
                .context("Peer relation disappeared before changes were written")?;
            tools
                .relation_set_app(&relation, &changes)
                .await
                .context("Failed to write shared state")?;
        }
    }

    for (relation, data) in &mut ctx.relations {
        let changes = data.local_app.take_changes();
        if !changes.is_empty() {
            info!(%relation, "writing relation data");
            tools
                .relation_set_app(relation, &changes)
                .await
                .with_context(|| format!("Failed to write relation {relation}"))?;
        }
    }

    for port in &ctx.opened_ports {
        tools
            .open_port(*port)
            .await
            .with_context(|| format!("Failed to open port {port}"))?;
    }

    if let Some(status) = &outcome.status {
        tools.status_set(status).await.context("Failed to set status")?;
    }

    if is_action {
        tools
            .action_set(&outcome.results)
            .await
            .context("Failed to return action results")?;
    }

    Ok(())
}
