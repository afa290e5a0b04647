//! Core types for the OpenLDAP operator.
//!
//! Everything here is plain data: charm configuration as delivered by the
//! agent, the unit status vocabulary, relation identifiers, and the fixed
//! names the operator relies on (container, service, endpoints, port).

pub mod config;
pub mod constants;
pub mod error;
pub mod relation;
pub mod status;

pub use config::{CharmConfig, ConfigOption, ConfigSchema, ConfigValue, environment_key};
pub use error::{Error, Result};
pub use relation::RelationId;
pub use status::UnitStatus;
