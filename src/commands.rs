//! CLI command handlers.
//!
//! `dispatch` is what the Juju agent runs: replay deferred events, handle the
//! current one, commit what each handler changed, and remember whatever was
//! deferred again.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use openldap_core::constants::{PASSWORD_LENGTH, REQUIRED_OPTIONS};
use openldap_core::{CharmConfig, ConfigSchema};
use openldap_reconciler::password::random_string;
use openldap_reconciler::{
    HookEvent, OpenLdapCharm, ReconcilerConfig, openldap_layer, running_status,
    service_environment,
};

use crate::cli::Commands;
use crate::context;
use crate::deferred::DeferredQueue;
use crate::event::parse_dispatch;
use crate::juju::{HookTools, ProcessRunner};
use crate::pebble::PebbleCli;
use crate::settings::OperatorSettings;

/// Execute a CLI command.
///
/// This is the main command dispatcher that routes to the appropriate handler.
///
/// # Errors
///
/// Returns the command's error.
pub async fn execute_command(command: Option<Commands>, settings: OperatorSettings) -> Result<()> {
    match command {
        None => cmd_dispatch(None, settings).await,
        Some(Commands::Dispatch { path }) => cmd_dispatch(path, settings).await,
        Some(Commands::RenderLayer { config, password }) => {
            let yaml = render_layer(&config, password, &settings)?;
            print!("{yaml}");
            Ok(())
        }
    }
}

/// Handle the event the agent dispatched.
async fn cmd_dispatch(path: Option<String>, settings: OperatorSettings) -> Result<()> {
    let path = path
        .or_else(|| settings.dispatch_path.clone())
        .context("No dispatch path: set JUJU_DISPATCH_PATH or pass --path")?;
    let unit_name = settings
        .unit_name
        .clone()
        .context("No unit name: JUJU_UNIT_NAME is not set")?;

    let event = parse_dispatch(&path, |key| std::env::var(key).ok())?;

    let workload = Arc::new(PebbleCli::new(&settings.pebble));
    let charm = OpenLdapCharm::new(
        workload,
        ReconcilerConfig {
            templates_dir: settings.templates_dir(),
        },
    );
    let tools = HookTools::new(ProcessRunner::new(settings.hook_tools_dir.clone()));
    let queue = DeferredQueue::new(settings.state_file());

    Dispatcher {
        tools: &tools,
        charm: &charm,
        queue: &queue,
        unit_name: &unit_name,
    }
    .run(event)
    .await
}

/// One dispatch: deferred events first, then the current one.
pub struct Dispatcher<'a> {
    pub tools: &'a HookTools,
    pub charm: &'a OpenLdapCharm,
    pub queue: &'a DeferredQueue,
    pub unit_name: &'a str,
}

impl Dispatcher<'_> {
    /// Replay the deferred queue, then handle `current`.
    ///
    /// # Errors
    ///
    /// Returns the first hook error. Events not yet processed stay queued.
    pub async fn run(&self, current: Option<HookEvent>) -> Result<()> {
        let (pending, stale): (Vec<HookEvent>, Vec<HookEvent>) = self
            .queue
            .load()?
            .into_iter()
            .partition(|event| !event.is_action());
        if !stale.is_empty() {
            warn!(count = stale.len(), "dropping queued actions");
        }
        if !pending.is_empty() {
            info!(count = pending.len(), "re-emitting deferred events");
        }

        let mut still_deferred: Vec<HookEvent> = Vec::new();
        let mut remaining = pending.into_iter().map(Some).chain(std::iter::once(current));

        while let Some(next) = remaining.next() {
            let Some(event) = next else {
                continue;
            };

            match self.handle_one(&event).await {
                Ok(true) => requeue(&mut still_deferred, event),
                Ok(false) => {}
                Err(err) => {
                    requeue(&mut still_deferred, event);
                    for event in remaining.by_ref().flatten() {
                        requeue(&mut still_deferred, event);
                    }
                    self.queue.store(&still_deferred)?;
                    return Err(err);
                }
            }
        }

        self.queue.store(&still_deferred)
    }

    /// Handle one event; `Ok(true)` means it was deferred.
    async fn handle_one(&self, event: &HookEvent) -> Result<bool> {
        let mut ctx = context::load(self.tools, self.unit_name).await?;

        if let HookEvent::Action { action } = event {
            if let Some(status) = running_status(*action) {
                self.tools.status_set(&status).await?;
            }
        }

        match self.charm.handle(event, &mut ctx).await {
            Ok(outcome) => {
                context::commit(self.tools, &mut ctx, &outcome, event.is_action()).await?;
                if outcome.deferred && event.is_action() {
                    warn!(handler = event.handler_name(), "actions cannot be deferred");
                    return Ok(false);
                }
                Ok(outcome.deferred)
            }
            Err(err) if event.is_action() => {
                error!(error = %err, handler = event.handler_name(), "action failed");
                self.tools.action_fail(&err.to_string()).await?;
                Ok(false)
            }
            Err(err) => Err(anyhow::Error::new(err).context(format!(
                "{} failed",
                event.handler_name()
            ))),
        }
    }
}

/// Queue `event` for the next dispatch. Actions only run inside their own
/// invocation and are never queued; repeats collapse into one entry.
fn requeue(queue: &mut Vec<HookEvent>, event: HookEvent) {
    if !event.is_action() && !queue.contains(&event) {
        queue.push(event);
    }
}

/// Render the Pebble layer for the configuration in `config_path`.
///
/// Options missing from the file take the defaults declared in the charm's
/// `config.yaml`, when it can be found.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed, or a required option
/// is missing.
pub fn render_layer(
    config_path: &Path,
    password: Option<String>,
    settings: &OperatorSettings,
) -> Result<String> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let is_json = config_path
        .extension()
        .is_some_and(|extension| extension == "json");
    let config = if is_json {
        CharmConfig::from_json(&content)
    } else {
        CharmConfig::from_yaml(&content)
    }
    .with_context(|| format!("Failed to parse {}", config_path.display()))?;

    let schema_path = settings.config_schema_path();
    let config = if schema_path.is_file() {
        let schema = std::fs::read_to_string(&schema_path)
            .with_context(|| format!("Failed to read {}", schema_path.display()))?;
        config.with_defaults(&ConfigSchema::from_yaml(&schema)?.defaults())
    } else {
        config
    };

    for key in REQUIRED_OPTIONS {
        config.require_str(key)?;
    }

    let password = password.unwrap_or_else(|| random_string(PASSWORD_LENGTH));
    let layer = openldap_layer(service_environment(&config, &password));
    Ok(layer.to_yaml()?)
}
