//! Integration tests for the operator lifecycle.
//!
//! These tests verify that:
//! - Configuration reaches the Pebble plan with generated credentials
//! - Credentials are generated once and reused
//! - Missing prerequisites block or defer instead of failing
//! - Related applications receive connection details from the leader only

#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

use std::collections::BTreeMap;
use std::sync::Arc;

use openldap_core::{CharmConfig, RelationId, UnitStatus};
use openldap_reconciler::{
    ActionKind, HandlerOutcome, HookContext, HookEvent, InMemoryWorkload, OpenLdapCharm,
    ReconcilerConfig, RelationData,
};
use openldap_state::{DataBag, SharedState};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn setup() -> (OpenLdapCharm, Arc<InMemoryWorkload>) {
    let workload = Arc::new(InMemoryWorkload::new("openldap"));
    let charm = OpenLdapCharm::new(workload.clone(), ReconcilerConfig::default());
    (charm, workload)
}

fn leader_context() -> HookContext {
    HookContext::new("openldap-k8s/0")
        .with_leader(true)
        .with_peer(DataBag::new())
        .with_config(CharmConfig::new().with("ldap-base-dn", "dc=example,dc=com"))
}

async fn service_environment(workload: &InMemoryWorkload) -> BTreeMap<String, String> {
    workload
        .plan()
        .await
        .services
        .get("openldap")
        .map(|service| service.environment.clone())
        .unwrap_or_default()
}

fn stored_password(ctx: &HookContext) -> Result<Option<String>, openldap_state::Error> {
    SharedState::read_only(&ctx.peer).bind_password()
}

/// Configuration is rendered into the service environment.
///
/// # GIVEN
/// A leader with a ready peer relation, a reachable container and
/// `ldap-base-dn` configured
///
/// # WHEN
/// The configuration changes
///
/// # THEN
/// The plan carries the base DN and a 12 character alphanumeric password and
/// the unit is active
#[tokio::test]
async fn test_config_changed_plans_service() -> TestResult {
    // GIVEN
    let (charm, workload) = setup();
    let mut ctx = leader_context();

    // WHEN
    let outcome = charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;

    // THEN
    assert_eq!(outcome.status, Some(UnitStatus::active("")));
    let env = service_environment(&workload).await;
    assert_eq!(
        env.get("LDAP_BASE_DN").map(String::as_str),
        Some("dc=example,dc=com")
    );
    let password = env.get("LDAP_ADMIN_PASSWORD").cloned().unwrap_or_default();
    assert_eq!(password.len(), 12);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(stored_password(&ctx)?, Some(password));
    assert!(ctx.opened_ports.contains(&389));
    Ok(())
}

/// The administrator password is generated only once.
///
/// # GIVEN
/// A leader with a ready peer relation
///
/// # WHEN
/// The configuration changes twice in a row
///
/// # THEN
/// The stored password is the same after both runs
#[tokio::test]
async fn test_password_is_stable_across_reconfiguration() -> TestResult {
    // GIVEN
    let (charm, workload) = setup();
    let mut ctx = leader_context();

    // WHEN
    charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;
    let first = stored_password(&ctx)?;
    ctx.config.insert("ldap-base-dn", "dc=other,dc=org");
    charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;
    let second = stored_password(&ctx)?;

    // THEN
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(
        SharedState::read_only(&ctx.peer).base_dn()?.as_deref(),
        Some("dc=other,dc=org")
    );
    assert_eq!(workload.replan_count().await, 2);
    Ok(())
}

/// Without the peer relation nothing is planned.
///
/// # GIVEN
/// A unit whose peer relation does not exist yet
///
/// # WHEN
/// Pebble becomes ready
///
/// # THEN
/// The unit is blocked and the supervisor is never called
#[tokio::test]
async fn test_missing_peer_relation_blocks() -> TestResult {
    // GIVEN
    let (charm, workload) = setup();
    let mut ctx = HookContext::new("openldap-k8s/0")
        .with_leader(true)
        .with_config(CharmConfig::new().with("ldap-base-dn", "dc=example,dc=com"));

    // WHEN
    let event = HookEvent::PebbleReady {
        container: "openldap".to_string(),
    };
    let outcome = charm.handle(&event, &mut ctx).await?;

    // THEN
    let status = outcome.status.ok_or("expected a status")?;
    assert!(status.is_blocked());
    assert!(status.message().contains("peer relation not ready"));
    assert!(workload.pushed().await.is_empty());
    assert_eq!(workload.replan_count().await, 0);
    Ok(())
}

/// An unreachable container defers the event.
///
/// # GIVEN
/// A leader whose container is not reachable yet
///
/// # WHEN
/// The configuration changes
///
/// # THEN
/// The event is deferred, the status is left alone and no credentials are
/// generated
#[tokio::test]
async fn test_unreachable_container_defers() -> TestResult {
    // GIVEN
    let (charm, workload) = setup();
    workload.set_can_connect(false);
    let mut ctx = leader_context();

    // WHEN
    let outcome = charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;

    // THEN
    assert!(outcome.deferred);
    assert_eq!(outcome.status, None);
    assert_eq!(stored_password(&ctx)?, None);
    Ok(())
}

/// Followers wait for the leader's credentials.
///
/// # GIVEN
/// A follower with an empty peer bag
///
/// # WHEN
/// The configuration changes
///
/// # THEN
/// The follower waits without writing shared state or planning the service
#[tokio::test]
async fn test_follower_waits_for_credentials() -> TestResult {
    // GIVEN
    let (charm, workload) = setup();
    let mut ctx = leader_context().with_leader(false);

    // WHEN
    let outcome = charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;

    // THEN
    assert_eq!(
        outcome.status,
        Some(UnitStatus::waiting("waiting for leader to initialise credentials"))
    );
    assert!(ctx.peer.as_ref().is_some_and(|bag| !bag.is_dirty()));
    assert_eq!(workload.replan_count().await, 0);
    Ok(())
}

/// Followers reuse the leader's password.
///
/// # GIVEN
/// A follower whose peer bag already holds the leader's credentials
///
/// # WHEN
/// The configuration changes
///
/// # THEN
/// The service is planned with the shared password
#[tokio::test]
async fn test_follower_uses_shared_password() -> TestResult {
    // GIVEN
    let (charm, workload) = setup();
    let peer: DataBag = [("bind_password", r#""Xy12Ab34Cd56""#)].into_iter().collect();
    let mut ctx = leader_context().with_leader(false).with_peer(peer);

    // WHEN
    let outcome = charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;

    // THEN
    assert_eq!(outcome.status, Some(UnitStatus::active("")));
    let env = service_environment(&workload).await;
    assert_eq!(
        env.get("LDAP_ADMIN_PASSWORD").map(String::as_str),
        Some("Xy12Ab34Cd56")
    );
    Ok(())
}

/// Relation data is published once the consumer speaks.
///
/// # GIVEN
/// A configured leader and a consumer relation, first with an empty remote
/// bag and then with data
///
/// # WHEN
/// The relation changes each time
///
/// # THEN
/// Nothing is published for the empty bag; the URL, base DN and password are
/// published afterwards
#[tokio::test]
async fn test_relation_changed_publishes_connection_details() -> TestResult {
    // GIVEN
    let (charm, _workload) = setup();
    let relation = RelationId::new("ldap", 3);
    let mut ctx = leader_context()
        .with_relation(relation.clone(), RelationData::new("ranger-k8s"));
    ctx.config.insert("charm-deployment-name", "openldap-k8s");
    charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;

    let event = HookEvent::LdapRelationChanged {
        relation: relation.clone(),
        remote_app: "ranger-k8s".to_string(),
    };

    // WHEN
    let empty = charm.handle(&event, &mut ctx).await?;

    // THEN
    assert_eq!(empty, HandlerOutcome::unchanged());
    let local = |ctx: &HookContext| {
        ctx.relations
            .get(&relation)
            .map(|data| data.local_app.clone())
            .unwrap_or_default()
    };
    assert!(local(&ctx).is_empty());

    // WHEN
    if let Some(data) = ctx.relations.get_mut(&relation) {
        data.remote_app_data.insert("requested", "true");
    }
    let outcome = charm.handle(&event, &mut ctx).await?;

    // THEN
    assert_eq!(outcome.status, Some(UnitStatus::active("")));
    let bag = local(&ctx);
    assert_eq!(bag.get("ldap_url"), Some("ldap://openldap-k8s:389"));
    assert_eq!(bag.get("base_dn"), Some("dc=example,dc=com"));
    assert_eq!(
        bag.get("admin_password").map(str::to_string),
        stored_password(&ctx)?
    );
    Ok(())
}

/// Actions report results without deferring.
///
/// # GIVEN
/// A configured leader
///
/// # WHEN
/// `get-admin-password` and `load-test-users` run
///
/// # THEN
/// The password is returned and `ldapadd` runs from the templates directory
#[tokio::test]
async fn test_actions_after_configuration() -> TestResult {
    // GIVEN
    let (charm, workload) = setup();
    let mut ctx = leader_context();
    charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;

    // WHEN
    let password = charm
        .handle(
            &HookEvent::Action {
                action: ActionKind::GetAdminPassword,
            },
            &mut ctx,
        )
        .await?;
    let loaded = charm
        .handle(
            &HookEvent::Action {
                action: ActionKind::LoadTestUsers,
            },
            &mut ctx,
        )
        .await?;

    // THEN
    assert_eq!(
        password.results.get("admin-password").cloned(),
        stored_password(&ctx)?
    );
    assert_eq!(
        loaded.results.get("result").map(String::as_str),
        Some("test users and groups successfully added")
    );
    let executed = workload.executed().await;
    assert_eq!(executed.len(), 1);
    assert!(
        executed
            .iter()
            .all(|request| request.working_dir.as_deref() == Some("/templates"))
    );
    Ok(())
}
