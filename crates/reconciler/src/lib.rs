//! Reconciliation core of the OpenLDAP operator.
//!
//! Every lifecycle event is handled the same way:
//!
//! - **Context**: the host loads a [`HookContext`] (config, leadership, peer
//!   bag, relations)
//! - **Dispatch**: [`OpenLdapCharm`] routes the [`HookEvent`] to one handler
//! - **Converge**: the handler drives the [`Workload`] towards the desired
//!   Pebble layer
//! - **Outcome**: a [`HandlerOutcome`] tells the host which status to set,
//!   which results to return and whether to defer
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use openldap_core::{CharmConfig, UnitStatus};
//! use openldap_reconciler::{
//!     HookContext, HookEvent, InMemoryWorkload, OpenLdapCharm, ReconcilerConfig,
//! };
//! use openldap_state::DataBag;
//!
//! # #[tokio::main]
//! # async fn main() -> openldap_reconciler::Result<()> {
//! let workload = Arc::new(InMemoryWorkload::new("openldap"));
//! let charm = OpenLdapCharm::new(workload, ReconcilerConfig::default());
//!
//! let mut ctx = HookContext::new("openldap/0")
//!     .with_leader(true)
//!     .with_peer(DataBag::new())
//!     .with_config(CharmConfig::new().with("ldap-base-dn", "dc=example,dc=com"));
//!
//! let outcome = charm.handle(&HookEvent::ConfigChanged, &mut ctx).await?;
//! assert_eq!(outcome.status, Some(UnitStatus::active("")));
//! # Ok(())
//! # }
//! ```

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod actions;
pub mod dispatch;
pub mod error;
pub mod layer;
pub mod password;
pub mod provider;
pub mod reconciler;
pub mod types;
pub mod workload;

pub use actions::{Actions, running_status};
pub use dispatch::OpenLdapCharm;
pub use error::{Error, Result};
pub use layer::{Layer, ServiceSpec, openldap_layer, service_environment};
pub use provider::LdapProvider;
pub use reconciler::{Reconciler, ReconcilerConfig};
pub use types::{ActionKind, HandlerOutcome, HookContext, HookEvent, RelationData};
pub use workload::{ExecOutput, ExecRequest, InMemoryWorkload, Workload};
