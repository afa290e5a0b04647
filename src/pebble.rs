//! Pebble-backed workload.
//!
//! Talks to the workload container's Pebble through the `pebble` client
//! binary pointed at the container socket.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};
use walkdir::WalkDir;

use openldap_reconciler::layer::Layer;
use openldap_reconciler::workload::{ExecOutput, ExecRequest, Workload};
use openldap_reconciler::{Error, Result};

use crate::settings::PebbleSettings;

/// Raw result of one `pebble` invocation.
struct Invocation {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// [`Workload`] implemented with the `pebble` command line client.
#[derive(Debug, Clone)]
pub struct PebbleCli {
    binary: PathBuf,
    socket: PathBuf,
    container: String,
}

impl PebbleCli {
    #[must_use]
    pub fn new(settings: &PebbleSettings) -> Self {
        Self {
            binary: settings.binary.clone(),
            socket: settings.socket.clone(),
            container: settings.container.clone(),
        }
    }

    async fn invoke(&self, operation: &str, args: &[String]) -> Result<Invocation> {
        debug!(container = %self.container, operation, "pebble");

        let output = Command::new(&self.binary)
            .args(args)
            .env("PEBBLE_SOCKET", &self.socket)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::workload(operation, format!("failed to spawn pebble: {e}")))?
            .wait_with_output()
            .await
            .map_err(|e| Error::workload(operation, format!("failed to wait for pebble: {e}")))?;

        Ok(Invocation {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run a management command; a non-zero exit is a workload error.
    async fn call(&self, operation: &str, args: Vec<String>) -> Result<String> {
        let invocation = self.invoke(operation, &args).await?;
        if invocation.success {
            Ok(invocation.stdout)
        } else {
            Err(Error::workload(operation, invocation.stderr.trim()))
        }
    }

    async fn push_file(&self, local: &Path, remote: &str) -> Result<()> {
        self.call(
            "push",
            vec![
                "push".to_string(),
                "--parents".to_string(),
                local.to_string_lossy().into_owned(),
                remote.to_string(),
            ],
        )
        .await
        .map(|_| ())
    }
}

/// Every file below `root` paired with its path relative to the parent of
/// `root`, so `templates/startup.ldif` lands at `<dest>/templates/startup.ldif`.
fn files_to_push(root: &Path) -> walkdir::Result<Vec<(PathBuf, PathBuf)>> {
    let base = root.parent().map_or_else(PathBuf::new, Path::to_path_buf);
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(&base) {
            files.push((entry.path().to_path_buf(), relative.to_path_buf()));
        }
    }

    Ok(files)
}

/// Whether `service` shows as active in `pebble services` output.
fn service_active(listing: &str, service: &str) -> bool {
    listing.lines().skip(1).any(|line| {
        let mut columns = line.split_whitespace();
        columns.next() == Some(service) && columns.nth(1) == Some("active")
    })
}

#[async_trait]
impl Workload for PebbleCli {
    fn container(&self) -> &str {
        &self.container
    }

    async fn can_connect(&self) -> bool {
        match self.invoke("version", &["version".to_string()]).await {
            Ok(invocation) => invocation.success,
            Err(err) => {
                warn!(error = %err, "pebble not reachable");
                false
            }
        }
    }

    async fn push_path(&self, source: &Path, destination: &str) -> Result<()> {
        let files = files_to_push(source)
            .map_err(|e| Error::workload("push", format!("{}: {e}", source.display())))?;

        let destination = destination.trim_end_matches('/');
        for (local, relative) in files {
            let remote = format!("{destination}/{}", relative.to_string_lossy());
            self.push_file(&local, &remote).await?;
        }
        Ok(())
    }

    async fn add_layer(&self, label: &str, layer: &Layer, combine: bool) -> Result<()> {
        let yaml = layer.to_yaml()?;
        let mut file = tempfile::Builder::new()
            .prefix("openldap-layer-")
            .suffix(".yaml")
            .tempfile()
            .map_err(|e| Error::workload("add-layer", e.to_string()))?;
        file.write_all(yaml.as_bytes())
            .map_err(|e| Error::workload("add-layer", e.to_string()))?;

        let mut args = vec!["add".to_string()];
        if combine {
            args.push("--combine".to_string());
        }
        args.push(label.to_string());
        args.push(file.path().to_string_lossy().into_owned());

        self.call("add-layer", args).await.map(|_| ())
    }

    async fn replan(&self) -> Result<()> {
        self.call("replan", vec!["replan".to_string()]).await.map(|_| ())
    }

    async fn restart(&self, service: &str) -> Result<()> {
        self.call("restart", vec!["restart".to_string(), service.to_string()])
            .await
            .map(|_| ())
    }

    async fn exec(&self, request: &ExecRequest) -> Result<ExecOutput> {
        let mut args = vec!["exec".to_string()];
        if let Some(dir) = &request.working_dir {
            args.push("-w".to_string());
            args.push(dir.clone());
        }
        if let Some(service) = &request.service_context {
            args.push("--context".to_string());
            args.push(service.clone());
        }
        args.push("--".to_string());
        args.extend(request.command.iter().cloned());

        debug!(command = %request.redacted(), "exec");
        let invocation = self.invoke("exec", &args).await?;
        if invocation.success {
            return Ok(ExecOutput {
                stdout: invocation.stdout,
                stderr: invocation.stderr,
            });
        }

        Err(Error::exec_failed(
            request.program(),
            invocation.code.unwrap_or(-1),
            invocation.stdout,
            invocation.stderr,
        ))
    }

    async fn service_running(&self, service: &str) -> Result<bool> {
        let listing = self
            .call("services", vec!["services".to_string(), service.to_string()])
            .await?;
        Ok(service_active(&listing, service))
    }
}
