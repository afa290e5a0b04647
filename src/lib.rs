#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # openldap-operator
//!
//! Host side of the OpenLDAP operator: turns a Juju dispatch into a
//! [`openldap_reconciler::HookEvent`], loads the hook context through the
//! hook tools, drives the workload through the `pebble` client, and writes
//! the outcome back.

pub mod cli;
pub mod commands;
pub mod context;
pub mod deferred;
pub mod event;
pub mod juju;
pub mod pebble;
pub mod settings;

pub use openldap_core;
pub use openldap_reconciler;
pub use openldap_state;
