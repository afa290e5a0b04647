//! Operator process settings.
//!
//! Settings are layered:
//! 1. Built-in defaults (the layout of a Juju sidecar charm)
//! 2. An optional TOML file
//! 3. Environment variables set by the Juju agent or the operator
//!
//! Charm configuration (`config.yaml`) is a different thing and is read from
//! the agent with `config-get` on every hook.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use openldap_core::constants::CONTAINER_NAME;

/// Name of the settings file looked up in the charm directory.
pub const SETTINGS_FILE: &str = "operator.toml";

/// How to reach the workload container's Pebble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PebbleSettings {
    /// `pebble` executable.
    pub binary: PathBuf,
    /// Socket of the workload container's Pebble.
    pub socket: PathBuf,
    /// Workload container name.
    pub container: String,
}

impl Default for PebbleSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pebble"),
            socket: PathBuf::from(format!("/charm/containers/{CONTAINER_NAME}/pebble.socket")),
            container: CONTAINER_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorSettings {
    /// Root of the unpacked charm (`templates/`, `config.yaml`).
    pub charm_dir: PathBuf,
    /// `<app>/<n>`; normally provided by the agent.
    pub unit_name: Option<String>,
    /// `hooks/<name>` or `actions/<name>`; normally provided by the agent.
    pub dispatch_path: Option<String>,
    /// Where deferred events are kept between invocations.
    pub state_file: Option<PathBuf>,
    /// Directory holding the hook tools, when they are not on `PATH`.
    pub hook_tools_dir: Option<PathBuf>,
    pub pebble: PebbleSettings,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            charm_dir: PathBuf::from("."),
            unit_name: None,
            dispatch_path: None,
            state_file: None,
            hook_tools_dir: None,
            pebble: PebbleSettings::default(),
        }
    }
}

impl OperatorSettings {
    /// Load settings from all layers.
    ///
    /// `explicit` names a settings file that must exist. Without it,
    /// `$JUJU_CHARM_DIR/operator.toml` is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// [`Self::load`] with an injectable environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed.
    pub fn load_with(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let charm_dir = env("JUJU_CHARM_DIR").map_or_else(|| PathBuf::from("."), PathBuf::from);
                let candidate = charm_dir.join(SETTINGS_FILE);
                if candidate.is_file() {
                    Self::from_file(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env(env);
        Ok(settings)
    }

    /// Parse a TOML settings file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Parse TOML settings text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for these settings.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid settings")
    }

    /// Apply environment overrides.
    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(value) = env("JUJU_CHARM_DIR") {
            self.charm_dir = PathBuf::from(value);
        }

        if let Some(value) = env("JUJU_UNIT_NAME") {
            self.unit_name = Some(value);
        }

        if let Some(value) = env("JUJU_DISPATCH_PATH") {
            self.dispatch_path = Some(value);
        }

        if let Some(value) = env("OPENLDAP_OPERATOR_STATE_FILE") {
            self.state_file = Some(PathBuf::from(value));
        }

        if let Some(value) = env("OPENLDAP_OPERATOR_PEBBLE_BIN") {
            self.pebble.binary = PathBuf::from(value);
        }

        if let Some(value) = env("OPENLDAP_OPERATOR_PEBBLE_SOCKET") {
            self.pebble.socket = PathBuf::from(value);
        }
    }

    /// Local `templates/` directory pushed into the container.
    #[must_use]
    pub fn templates_dir(&self) -> PathBuf {
        self.charm_dir.join("templates")
    }

    /// Charm configuration schema, used for offline rendering defaults.
    #[must_use]
    pub fn config_schema_path(&self) -> PathBuf {
        self.charm_dir.join("config.yaml")
    }

    /// Deferred event queue location.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| self.charm_dir.join(".openldap-operator-deferred.json"))
    }
}
