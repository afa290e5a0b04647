//! Charm configuration.
//!
//! The agent delivers configuration as a flat JSON object (`config-get
//! --format=json`). Values keep their declared type so that the pebble
//! environment renders them the way an operator typed them.
//!
//! `config.yaml` declares the options and their defaults; [`ConfigSchema`]
//! reads it so configuration can be rendered offline with the same defaults
//! the controller would apply.

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    /// Borrow the value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            // `{:?}` keeps the fraction on integral floats: `1.0`, not `1`.
            Self::Float(value) => write!(f, "{value:?}"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Normalise a configuration key into an environment variable name.
///
/// `ldap-base-dn` becomes `LDAP_BASE_DN`.
#[must_use]
pub fn environment_key(key: &str) -> String {
    key.to_uppercase().replace('-', "_")
}

/// Current charm configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharmConfig {
    options: BTreeMap<String, ConfigValue>,
}

impl CharmConfig {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON object printed by `config-get --format=json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object of scalars.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::json_parse_failed(e.to_string()))
    }

    /// Parse a flat YAML mapping of option name to value.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a YAML mapping of scalars.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::yaml_parse_failed(e.to_string()))
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set an option.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.options.insert(key.into(), value.into());
    }

    /// Get an option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.options.get(key)
    }

    /// Get a string option that must be set and non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigMissing`] if the option is unset or empty and
    /// [`Error::ConfigType`] if it holds a non-string value.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        match self.options.get(key) {
            None => Err(Error::config_missing(key)),
            Some(ConfigValue::Str(value)) if value.is_empty() => Err(Error::config_missing(key)),
            Some(ConfigValue::Str(value)) => Ok(value),
            Some(_) => Err(Error::config_type(key, "string")),
        }
    }

    /// Fill in every option missing here from `defaults`.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &Self) -> Self {
        for (key, value) in &defaults.options {
            self.options
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Iterate options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.options.iter().map(|(key, value)| (key.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Every option as an environment variable.
    #[must_use]
    pub fn environment(&self) -> BTreeMap<String, String> {
        self.options
            .iter()
            .map(|(key, value)| (environment_key(key), value.to_string()))
            .collect()
    }

    /// Option names, comma separated, for log lines.
    #[must_use]
    pub fn describe_keys(&self) -> String {
        self.options.keys().join(",")
    }
}

impl<K, V> FromIterator<(K, V)> for CharmConfig
where
    K: Into<String>,
    V: Into<ConfigValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            options: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// One option declared in `config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOption {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub default: Option<ConfigValue>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parsed `config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    #[serde(default)]
    pub options: BTreeMap<String, ConfigOption>,
}

impl ConfigSchema {
    /// Parse the contents of `config.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::yaml_parse_failed(e.to_string()))
    }

    /// Configuration made of every declared default.
    #[must_use]
    pub fn defaults(&self) -> CharmConfig {
        self.options
            .iter()
            .filter_map(|(key, option)| {
                option
                    .default
                    .clone()
                    .map(|value| (key.clone(), value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_key_normalisation() {
        assert_eq!(environment_key("ldap-base-dn"), "LDAP_BASE_DN");
        assert_eq!(environment_key("charm-deployment-name"), "CHARM_DEPLOYMENT_NAME");
        assert_eq!(environment_key("already_fine"), "ALREADY_FINE");
    }

    #[test]
    fn test_from_json_keeps_types() -> Result<()> {
        let config = CharmConfig::from_json(
            r#"{"ldap-base-dn": "dc=example,dc=com", "ldap-log-level": 256, "tls": false}"#,
        )?;
        assert_eq!(config.get("ldap-log-level"), Some(&ConfigValue::Int(256)));
        assert_eq!(config.get("tls"), Some(&ConfigValue::Bool(false)));
        assert_eq!(config.require_str("ldap-base-dn")?, "dc=example,dc=com");
        Ok(())
    }

    #[test]
    fn test_require_str_missing_empty_and_wrong_type() {
        let config = CharmConfig::new()
            .with("empty", "")
            .with("number", 3_i64);
        assert!(matches!(
            config.require_str("absent"),
            Err(Error::ConfigMissing { .. })
        ));
        assert!(matches!(
            config.require_str("empty"),
            Err(Error::ConfigMissing { .. })
        ));
        assert!(matches!(
            config.require_str("number"),
            Err(Error::ConfigType { .. })
        ));
    }

    #[test]
    fn test_environment_renders_scalars() {
        let env = CharmConfig::new()
            .with("ldap-base-dn", "dc=example,dc=com")
            .with("ldap-log-level", 256_i64)
            .with("debug", true)
            .environment();
        assert_eq!(env.get("LDAP_BASE_DN").map(String::as_str), Some("dc=example,dc=com"));
        assert_eq!(env.get("LDAP_LOG_LEVEL").map(String::as_str), Some("256"));
        assert_eq!(env.get("DEBUG").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_float_keeps_fraction() {
        assert_eq!(ConfigValue::Float(1.0).to_string(), "1.0");
        assert_eq!(ConfigValue::Float(0.25).to_string(), "0.25");
        assert_eq!(ConfigValue::Int(1).to_string(), "1");
    }

    #[test]
    fn test_schema_defaults_fill_gaps() -> Result<()> {
        let schema = ConfigSchema::from_yaml(
            "options:\n  ldap-base-dn:\n    type: string\n    default: dc=canonical,dc=dev,dc=com\n  ldap-domain:\n    type: string\n",
        )?;
        let config = CharmConfig::new()
            .with("ldap-domain", "example.com")
            .with_defaults(&schema.defaults());
        assert_eq!(config.require_str("ldap-base-dn")?, "dc=canonical,dc=dev,dc=com");
        assert_eq!(config.require_str("ldap-domain")?, "example.com");
        assert_eq!(config.len(), 2);
        Ok(())
    }
}
