//! # openldap-operator
//!
//! Entry point run by the charm's `dispatch` script.
//!
//! ## Sequence
//!
//! 1. **Tracing** - structured logs on stderr, which the agent forwards to
//!    `juju debug-log`
//! 2. **Settings** - defaults, optional TOML file, then agent environment
//! 3. **Command** - `dispatch` (the default) or `render-layer`
//!
//! ## Error Handling
//!
//! A failed hook exits non-zero so the agent retries it. Failed actions are
//! reported through `action-fail` and exit cleanly.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use openldap_operator::cli::Cli;
use openldap_operator::commands::execute_command;
use openldap_operator::settings::OperatorSettings;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "OPENLDAP_OPERATOR_LOG";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = OperatorSettings::load(cli.settings.as_deref())
        .context("Failed to load operator settings")?;
    debug!(?settings, "settings loaded");

    execute_command(cli.command, settings).await.inspect_err(|err| {
        error!(error = ?err, "openldap-operator failed");
    })
}

/// Initialize tracing subscriber.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
