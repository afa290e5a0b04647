//! Juju hook tools.
//!
//! The agent exposes its API to a dispatched charm as a set of executables
//! (`config-get`, `relation-set`, ...). Every call is a subprocess; the
//! [`ToolRunner`] seam lets tests replay canned answers instead.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use itertools::Itertools;
use tokio::process::Command;
use tracing::debug;

use openldap_core::{CharmConfig, RelationId, UnitStatus};
use openldap_state::DataBag;

/// Runs one hook tool and returns its standard output.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, tool: &str, args: &[String]) -> Result<String>;
}

/// Runs hook tools as subprocesses.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    tools_dir: Option<PathBuf>,
}

impl ProcessRunner {
    #[must_use]
    pub const fn new(tools_dir: Option<PathBuf>) -> Self {
        Self { tools_dir }
    }

    fn program(&self, tool: &str) -> PathBuf {
        self.tools_dir
            .as_ref()
            .map_or_else(|| PathBuf::from(tool), |dir| dir.join(tool))
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, tool: &str, args: &[String]) -> Result<String> {
        debug!(tool, args = ?args, "running hook tool");

        let output = Command::new(self.program(tool))
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {tool}"))?
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to wait for {tool}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{tool} exited with status {}: {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Typed wrappers around the hook tools.
pub struct HookTools {
    runner: Box<dyn ToolRunner>,
}

impl HookTools {
    pub fn new(runner: impl ToolRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
        }
    }

    async fn run<I, S>(&self, tool: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.runner.run(tool, &args).await
    }

    async fn run_json<T, I, S>(&self, tool: &str, args: I) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        args.push("--format=json".to_string());
        let stdout = self.runner.run(tool, &args).await?;
        if stdout.trim().is_empty() {
            return serde_json::from_str("null")
                .with_context(|| format!("{tool} returned nothing"));
        }
        serde_json::from_str(&stdout).with_context(|| format!("Failed to parse {tool} output"))
    }

    /// Current charm configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails or returns something other than a
    /// JSON object.
    pub async fn config_get(&self) -> Result<CharmConfig> {
        let value: Option<CharmConfig> = self.run_json("config-get", [] as [&str; 0]).await?;
        Ok(value.unwrap_or_default())
    }

    /// Whether this unit is the application leader.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails.
    pub async fn is_leader(&self) -> Result<bool> {
        self.run_json("is-leader", [] as [&str; 0]).await
    }

    /// Established relations on `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails or returns a malformed id.
    pub async fn relation_ids(&self, endpoint: &str) -> Result<Vec<RelationId>> {
        let ids: Option<Vec<String>> = self.run_json("relation-ids", [endpoint]).await?;
        ids.unwrap_or_default()
            .iter()
            .map(|raw| raw.parse::<RelationId>().map_err(anyhow::Error::from))
            .collect()
    }

    /// Name of the application on the other side of `relation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails.
    pub async fn remote_app(&self, relation: &RelationId) -> Result<Option<String>> {
        let name: String = self
            .run("relation-list", ["-r".to_string(), relation.to_string(), "--app".to_string()])
            .await?
            .trim()
            .to_string();
        Ok(Some(name).filter(|name| !name.is_empty()))
    }

    /// The application databag of `app` on `relation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails or the bag is not a string map.
    pub async fn relation_get_app(&self, relation: &RelationId, app: &str) -> Result<DataBag> {
        let entries: Option<BTreeMap<String, String>> = self
            .run_json(
                "relation-get",
                [
                    "-r".to_string(),
                    relation.to_string(),
                    "--app".to_string(),
                    "-".to_string(),
                    app.to_string(),
                ],
            )
            .await?;
        Ok(entries.unwrap_or_default().into_iter().collect())
    }

    /// Write changes to this application's databag on `relation`. A `None`
    /// value removes the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails.
    pub async fn relation_set_app(
        &self,
        relation: &RelationId,
        changes: &BTreeMap<String, Option<String>>,
    ) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let args = ["-r".to_string(), relation.to_string(), "--app".to_string()]
            .into_iter()
            .chain(changes.iter().map(|(key, value)| {
                format!("{key}={}", value.as_deref().unwrap_or_default())
            }))
            .collect_vec();
        debug!(%relation, keys = %changes.keys().join(","), "relation-set");
        self.run("relation-set", args).await.map(|_| ())
    }

    /// Set this unit's workload status.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails.
    pub async fn status_set(&self, status: &UnitStatus) -> Result<()> {
        self.run("status-set", [status.name(), status.message()])
            .await
            .map(|_| ())
    }

    /// Open a TCP port for this unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails.
    pub async fn open_port(&self, port: u16) -> Result<()> {
        self.run("open-port", [format!("{port}/tcp")]).await.map(|_| ())
    }

    /// Return results to the operator running an action.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails.
    pub async fn action_set(&self, results: &BTreeMap<String, String>) -> Result<()> {
        if results.is_empty() {
            return Ok(());
        }
        let args = results
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect_vec();
        self.run("action-set", args).await.map(|_| ())
    }

    /// Mark the running action as failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails.
    pub async fn action_fail(&self, message: &str) -> Result<()> {
        self.run("action-fail", [message]).await.map(|_| ())
    }
}
