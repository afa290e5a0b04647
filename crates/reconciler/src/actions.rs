//! Operator actions.

use std::sync::Arc;

use openldap_core::UnitStatus;
use openldap_core::constants::{
    ADMIN_USERNAME, LOCAL_LDAP_URL, SERVICE_NAME, TEMPLATES_DIR, TEST_USERS_LDIF,
};
use openldap_state::SharedState;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::types::{ActionKind, HandlerOutcome, HookContext};
use crate::workload::{ExecRequest, Workload};

/// Result key of `get-admin-password`.
pub const ADMIN_PASSWORD_RESULT: &str = "admin-password";
/// Result key of the other actions.
pub const RESULT: &str = "result";

/// Runs the actions declared in `actions.yaml`.
///
/// Actions run immediately or fail: an operator waiting on the CLI gets an
/// answer rather than a silently re-queued event.
pub struct Actions {
    workload: Arc<dyn Workload>,
}

impl Actions {
    pub fn new(workload: Arc<dyn Workload>) -> Self {
        Self { workload }
    }

    /// Run `action`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionFailed`] when the action cannot run, and the
    /// underlying error when the workload rejects it.
    pub async fn run(&self, action: ActionKind, ctx: &HookContext) -> Result<HandlerOutcome> {
        match action {
            ActionKind::GetAdminPassword => Self::get_admin_password(ctx),
            ActionKind::Restart => self.restart().await,
            ActionKind::LoadTestUsers => self.load_test_users(ctx).await,
        }
    }

    /// Return the generated administrator password.
    ///
    /// # Errors
    ///
    /// Fails when the leader has not generated a password yet.
    pub fn get_admin_password(ctx: &HookContext) -> Result<HandlerOutcome> {
        let password = SharedState::read_only(&ctx.peer)
            .bind_password()?
            .ok_or_else(|| {
                Error::action_failed(
                    ActionKind::GetAdminPassword.name(),
                    "admin password has not been generated yet",
                )
            })?;
        Ok(HandlerOutcome::unchanged().with_result(ADMIN_PASSWORD_RESULT, password))
    }

    /// Restart the OpenLDAP service.
    ///
    /// # Errors
    ///
    /// Fails when the container is unreachable or the restart is rejected.
    pub async fn restart(&self) -> Result<HandlerOutcome> {
        self.ensure_reachable(ActionKind::Restart).await?;

        info!(service = SERVICE_NAME, "restarting openldap");
        self.workload.restart(SERVICE_NAME).await?;

        Ok(HandlerOutcome::status(UnitStatus::active(""))
            .with_result(RESULT, "openldap successfully restarted"))
    }

    /// Load the sample users and groups shipped in `templates/startup.ldif`.
    ///
    /// # Errors
    ///
    /// Fails when the container is unreachable, the credentials are missing,
    /// or `ldapadd` exits non-zero. The command output is logged in the
    /// latter case.
    pub async fn load_test_users(&self, ctx: &HookContext) -> Result<HandlerOutcome> {
        self.ensure_reachable(ActionKind::LoadTestUsers).await?;

        let state = SharedState::read_only(&ctx.peer);
        let (Some(password), Some(base_dn)) = (state.bind_password()?, state.base_dn()?) else {
            return Err(Error::action_failed(
                ActionKind::LoadTestUsers.name(),
                "credentials have not been initialised yet",
            ));
        };

        let request = load_test_users_command(&base_dn, &password);
        info!(command = %request.redacted(), "loading test users");

        match self.workload.exec(&request).await {
            Ok(_) => Ok(HandlerOutcome::status(UnitStatus::active(""))
                .with_result(RESULT, "test users and groups successfully added")),
            Err(err) => {
                if let Error::ExecFailed { stdout, .. } = &err {
                    error!("{stdout}");
                }
                Err(err)
            }
        }
    }

    async fn ensure_reachable(&self, action: ActionKind) -> Result<()> {
        if self.workload.can_connect().await {
            Ok(())
        } else {
            Err(Error::action_failed(action.name(), "container not reachable"))
        }
    }
}

/// Status shown while `action` runs, if it has one.
#[must_use]
pub fn running_status(action: ActionKind) -> Option<UnitStatus> {
    match action {
        ActionKind::GetAdminPassword => None,
        ActionKind::Restart => Some(UnitStatus::maintenance("restarting openldap")),
        ActionKind::LoadTestUsers => Some(UnitStatus::maintenance("Running action.")),
    }
}

/// The `ldapadd` invocation that loads the sample LDIF.
#[must_use]
pub fn load_test_users_command(base_dn: &str, password: &str) -> ExecRequest {
    ExecRequest::new([
        "ldapadd".to_string(),
        "-x".to_string(),
        "-H".to_string(),
        LOCAL_LDAP_URL.to_string(),
        "-D".to_string(),
        format!("cn={ADMIN_USERNAME},{base_dn}"),
        "-w".to_string(),
        password.to_string(),
        "-f".to_string(),
        TEST_USERS_LDIF.to_string(),
        "-v".to_string(),
    ])
    .working_dir(TEMPLATES_DIR)
    .service_context(SERVICE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::InMemoryWorkload;
    use openldap_state::DataBag;

    fn ctx_with_credentials() -> HookContext {
        let peer: DataBag = [
            ("bind_password", r#""Xy12Ab34Cd56""#),
            ("base_dn", r#""dc=example,dc=com""#),
        ]
        .into_iter()
        .collect();
        HookContext::new("openldap/0").with_peer(peer)
    }

    #[test]
    fn test_command_shape() {
        let request = load_test_users_command("dc=example,dc=com", "pw");
        assert_eq!(
            request.command,
            vec![
                "ldapadd",
                "-x",
                "-H",
                "ldap://localhost:389",
                "-D",
                "cn=admin,dc=example,dc=com",
                "-w",
                "pw",
                "-f",
                "startup.ldif",
                "-v",
            ]
        );
        assert_eq!(request.working_dir.as_deref(), Some("/templates"));
        assert_eq!(request.service_context.as_deref(), Some("openldap"));
    }

    #[test]
    fn test_get_admin_password() -> Result<()> {
        let outcome = Actions::get_admin_password(&ctx_with_credentials())?;
        assert_eq!(
            outcome.results.get("admin-password").map(String::as_str),
            Some("Xy12Ab34Cd56")
        );
        assert_eq!(outcome.status, None);
        Ok(())
    }

    #[test]
    fn test_get_admin_password_before_generation_fails() {
        let ctx = HookContext::new("openldap/0").with_peer(DataBag::new());
        assert!(matches!(
            Actions::get_admin_password(&ctx),
            Err(Error::ActionFailed { .. })
        ));
    }

    #[test]
    fn test_running_status() {
        assert_eq!(running_status(ActionKind::GetAdminPassword), None);
        assert_eq!(
            running_status(ActionKind::LoadTestUsers),
            Some(UnitStatus::maintenance("Running action."))
        );
    }

    #[tokio::test]
    async fn test_load_test_users_runs_ldapadd() -> Result<()> {
        let workload = Arc::new(InMemoryWorkload::new("openldap"));
        let actions = Actions::new(workload.clone());

        let outcome = actions.load_test_users(&ctx_with_credentials()).await?;
        assert_eq!(
            outcome.results.get("result").map(String::as_str),
            Some("test users and groups successfully added")
        );
        assert_eq!(outcome.status, Some(UnitStatus::active("")));
        assert_eq!(
            workload.executed().await,
            vec![load_test_users_command("dc=example,dc=com", "Xy12Ab34Cd56")]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_load_test_users_surfaces_exit_status() {
        let workload = Arc::new(InMemoryWorkload::new("openldap"));
        workload.fail_next_exec(68, "ldap_add: Already exists (68)").await;
        let actions = Actions::new(workload);

        let result = actions.load_test_users(&ctx_with_credentials()).await;
        assert!(matches!(result, Err(Error::ExecFailed { exit_code: 68, .. })));
    }

    #[tokio::test]
    async fn test_restart_unreachable_fails() {
        let workload = Arc::new(InMemoryWorkload::new("openldap"));
        workload.set_can_connect(false);
        let actions = Actions::new(workload);

        let result = actions.restart().await;
        assert!(
            matches!(result, Err(Error::ActionFailed { ref reason, .. }) if reason == "container not reachable")
        );
    }
}
