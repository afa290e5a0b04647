//! Relation identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of one established relation, e.g. `ldap:3`.
///
/// The agent hands these out as `<endpoint>:<number>`; the endpoint part
/// tells which side of the charm the relation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RelationId {
    endpoint: String,
    id: u32,
}

impl RelationId {
    /// Create a relation id from its parts.
    pub fn new(endpoint: impl Into<String>, id: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            id,
        }
    }

    /// Endpoint name this relation was established on.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Numeric relation id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.endpoint, self.id)
    }
}

impl FromStr for RelationId {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (endpoint, id) = raw
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| Error::invalid_relation_id(raw))?;

        if endpoint.is_empty() {
            return Err(Error::invalid_relation_id(raw));
        }

        id.parse::<u32>()
            .map(|id| Self::new(endpoint, id))
            .map_err(|_| Error::invalid_relation_id(raw))
    }
}

impl TryFrom<String> for RelationId {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl From<RelationId> for String {
    fn from(relation: RelationId) -> Self {
        relation.to_string()
    }
}
