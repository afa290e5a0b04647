//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// OpenLDAP operator
#[derive(Parser, Debug)]
#[command(name = "openldap-operator")]
#[command(version)]
#[command(about = "Runs OpenLDAP under Pebble and provides it over Juju relations")]
#[command(
    long_about = "Invoked by the Juju agent through the charm's dispatch script. Without a subcommand the event named by JUJU_DISPATCH_PATH is handled."
)]
pub struct Cli {
    /// Operator settings file (TOML)
    #[arg(long, global = true, env = "OPENLDAP_OPERATOR_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Handle one Juju hook or action
    Dispatch {
        /// Dispatch path (hooks/<name> or actions/<name>); defaults to JUJU_DISPATCH_PATH
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Print the Pebble layer for a charm configuration
    RenderLayer {
        /// Charm configuration (YAML, or JSON with a .json extension)
        #[arg(short, long)]
        config: PathBuf,

        /// Administrator password to embed; generated when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from(["openldap-operator"])?;
        assert!(cli.command.is_none());
        Ok(())
    }

    #[test]
    fn test_render_layer_arguments() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "openldap-operator",
            "render-layer",
            "--config",
            "config.yaml",
            "--password",
            "secret",
        ])?;
        assert!(matches!(
            cli.command,
            Some(Commands::RenderLayer { ref password, .. }) if password.as_deref() == Some("secret")
        ));
        Ok(())
    }

    #[test]
    fn test_dispatch_path_override() -> Result<(), clap::Error> {
        let cli = Cli::try_parse_from([
            "openldap-operator",
            "--settings",
            "operator.toml",
            "dispatch",
            "--path",
            "hooks/install",
        ])?;
        assert_eq!(cli.settings, Some(PathBuf::from("operator.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Dispatch { path: Some(ref path) }) if path == "hooks/install"
        ));
        Ok(())
    }
}
