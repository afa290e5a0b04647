//! Pebble service layers.
//!
//! A layer is the declarative description handed to the container
//! supervisor. The operator owns exactly one service, rebuilt from scratch on
//! every reconciliation.

use std::collections::BTreeMap;

use openldap_core::constants::{ADMIN_USERNAME, SERVICE_COMMAND, SERVICE_NAME};
use openldap_core::CharmConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether Pebble starts the service automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Startup {
    Enabled,
    Disabled,
}

/// How a service definition combines with an earlier layer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Override {
    Merge,
    Replace,
}

/// One service entry of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub summary: String,
    pub command: String,
    pub startup: Startup,
    #[serde(rename = "override")]
    pub override_policy: Override,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

/// A Pebble layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
}

impl Layer {
    /// Render as Pebble layer YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::layer(e.to_string()))
    }

    /// Parse Pebble layer YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is not a layer.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::layer(e.to_string()))
    }

    /// Combine `other` on top of this layer.
    ///
    /// `replace` services overwrite the existing definition; `merge` services
    /// keep existing fields and extend the environment.
    pub fn combine(&mut self, other: &Self) {
        if !other.summary.is_empty() {
            self.summary.clone_from(&other.summary);
        }
        for (name, service) in &other.services {
            match (self.services.get_mut(name), service.override_policy) {
                (Some(existing), Override::Merge) => {
                    existing.summary.clone_from(&service.summary);
                    existing.command.clone_from(&service.command);
                    existing.startup = service.startup;
                    existing.environment.extend(
                        service
                            .environment
                            .iter()
                            .map(|(key, value)| (key.clone(), value.clone())),
                    );
                }
                _ => {
                    self.services.insert(name.clone(), service.clone());
                }
            }
        }
    }
}

/// Environment for the OpenLDAP service.
///
/// Every configuration option becomes a variable (`ldap-base-dn` ->
/// `LDAP_BASE_DN`), then the administrator credentials and TLS switch are
/// laid over the top.
#[must_use]
pub fn service_environment(config: &CharmConfig, admin_password: &str) -> BTreeMap<String, String> {
    let mut environment = config.environment();
    environment.insert("LDAP_ADMIN_PASSWORD".to_string(), admin_password.to_string());
    environment.insert("LDAP_ADMIN_USERNAME".to_string(), ADMIN_USERNAME.to_string());
    environment.insert("LDAP_TLS".to_string(), "false".to_string());
    environment
}

/// The layer that runs OpenLDAP with `environment`.
#[must_use]
pub fn openldap_layer(environment: BTreeMap<String, String>) -> Layer {
    let service = ServiceSpec {
        summary: "openldap".to_string(),
        command: SERVICE_COMMAND.to_string(),
        startup: Startup::Enabled,
        override_policy: Override::Replace,
        environment,
    };

    Layer {
        summary: "openldap layer".to_string(),
        services: BTreeMap::from([(SERVICE_NAME.to_string(), service)]),
    }
}
