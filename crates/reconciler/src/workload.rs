//! Container supervisor seam.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use itertools::Itertools;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::layer::{Layer, Startup};

/// A one-off command to run inside the workload container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub command: Vec<String>,
    pub working_dir: Option<String>,
    /// Run with the environment and identity of this service.
    pub service_context: Option<String>,
}

impl ExecRequest {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            working_dir: None,
            service_context: None,
        }
    }

    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn service_context(mut self, service: impl Into<String>) -> Self {
        self.service_context = Some(service.into());
        self
    }

    /// Program name, for logs and errors.
    #[must_use]
    pub fn program(&self) -> &str {
        self.command.first().map_or("", String::as_str)
    }

    /// The command line with the value following `-w` masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        let mut mask_next = false;
        self.command
            .iter()
            .map(|arg| {
                let shown = if mask_next { "***" } else { arg.as_str() };
                mask_next = arg == "-w";
                shown
            })
            .join(" ")
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// The container supervisor (Pebble) of the workload container.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Container name.
    fn container(&self) -> &str;

    /// Whether the supervisor currently answers.
    async fn can_connect(&self) -> bool;

    /// Copy a local directory tree into the container under `destination`.
    async fn push_path(&self, source: &Path, destination: &str) -> Result<()>;

    /// Add a layer under `label`, combining with an existing one if asked.
    async fn add_layer(&self, label: &str, layer: &Layer, combine: bool) -> Result<()>;

    /// Converge running services to the current plan.
    async fn replan(&self) -> Result<()>;

    /// Restart one service.
    async fn restart(&self, service: &str) -> Result<()>;

    /// Run a command and wait for it. A non-zero exit is
    /// [`Error::ExecFailed`].
    async fn exec(&self, request: &ExecRequest) -> Result<ExecOutput>;

    /// Whether a service is currently running.
    async fn service_running(&self, service: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
struct InMemoryState {
    layers: Vec<(String, Layer)>,
    running: BTreeSet<String>,
    pushed: Vec<(PathBuf, String)>,
    executed: Vec<ExecRequest>,
    exec_failure: Option<(i32, String)>,
    restarts: Vec<String>,
    replans: usize,
}

/// Workload that keeps the plan in memory.
///
/// Used in tests and for offline rendering. Every operation fails while the
/// workload is marked unreachable, like a real supervisor that is not up yet.
#[derive(Debug)]
pub struct InMemoryWorkload {
    container: String,
    reachable: AtomicBool,
    state: RwLock<InMemoryState>,
}

impl InMemoryWorkload {
    /// Create a reachable in-memory workload.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            reachable: AtomicBool::new(true),
            state: RwLock::new(InMemoryState::default()),
        }
    }

    /// Mark the supervisor reachable or not.
    pub fn set_can_connect(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Make the next command exit with `exit_code` and `stdout`.
    pub async fn fail_next_exec(&self, exit_code: i32, stdout: impl Into<String>) {
        self.state.write().await.exec_failure = Some((exit_code, stdout.into()));
    }

    /// All layers combined in order.
    pub async fn plan(&self) -> Layer {
        self.state
            .read()
            .await
            .layers
            .iter()
            .fold(Layer::default(), |mut plan, (_, layer)| {
                plan.combine(layer);
                plan
            })
    }

    pub async fn replan_count(&self) -> usize {
        self.state.read().await.replans
    }

    pub async fn executed(&self) -> Vec<ExecRequest> {
        self.state.read().await.executed.clone()
    }

    pub async fn pushed(&self) -> Vec<(PathBuf, String)> {
        self.state.read().await.pushed.clone()
    }

    pub async fn restarts(&self) -> Vec<String> {
        self.state.read().await.restarts.clone()
    }

    fn ensure_reachable(&self, operation: &str) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::workload(operation, "cannot connect to the supervisor"))
        }
    }
}

#[async_trait]
impl Workload for InMemoryWorkload {
    fn container(&self) -> &str {
        &self.container
    }

    async fn can_connect(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    async fn push_path(&self, source: &Path, destination: &str) -> Result<()> {
        self.ensure_reachable("push")?;
        self.state
            .write()
            .await
            .pushed
            .push((source.to_path_buf(), destination.to_string()));
        Ok(())
    }

    async fn add_layer(&self, label: &str, layer: &Layer, combine: bool) -> Result<()> {
        self.ensure_reachable("add-layer")?;
        let mut state = self.state.write().await;
        let position = state.layers.iter().position(|(existing, _)| existing == label);
        let Some(index) = position else {
            state.layers.push((label.to_string(), layer.clone()));
            return Ok(());
        };
        if !combine {
            return Err(Error::workload(
                "add-layer",
                format!("layer '{label}' already exists"),
            ));
        }
        if let Some((_, existing)) = state.layers.get_mut(index) {
            existing.combine(layer);
        }
        Ok(())
    }

    async fn replan(&self) -> Result<()> {
        self.ensure_reachable("replan")?;
        let plan = self.plan().await;
        let mut state = self.state.write().await;
        state.running = plan
            .services
            .iter()
            .filter(|(_, service)| service.startup == Startup::Enabled)
            .map(|(name, _)| name.clone())
            .collect();
        state.replans = state.replans.saturating_add(1);
        Ok(())
    }

    async fn restart(&self, service: &str) -> Result<()> {
        self.ensure_reachable("restart")?;
        let plan = self.plan().await;
        if !plan.services.contains_key(service) {
            return Err(Error::workload(
                "restart",
                format!("service '{service}' is not in the plan"),
            ));
        }
        let mut state = self.state.write().await;
        state.running.insert(service.to_string());
        state.restarts.push(service.to_string());
        Ok(())
    }

    async fn exec(&self, request: &ExecRequest) -> Result<ExecOutput> {
        self.ensure_reachable("exec")?;
        let mut state = self.state.write().await;
        state.executed.push(request.clone());
        match state.exec_failure.take() {
            Some((exit_code, stdout)) => Err(Error::exec_failed(
                request.program(),
                exit_code,
                stdout,
                String::new(),
            )),
            None => Ok(ExecOutput::default()),
        }
    }

    async fn service_running(&self, service: &str) -> Result<bool> {
        self.ensure_reachable("services")?;
        Ok(self.state.read().await.running.contains(service))
    }
}
