//! Stratus Common - shared vocabulary for the provisioning orchestrator
//!
//! This crate provides the types every other Stratus crate speaks:
//! - Remote lifecycle states (deployment, async job, VM power) with their
//!   string translations
//! - Node identity (`group` encoded into the node name)
//! - Login credentials threaded per call, never stored
//! - The shared remote API error type

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod state;

pub use error::*;
pub use state::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a provisioned node.
///
/// The resource group is encoded into the id so that a bare id string is
/// enough to locate every resource belonging to the node. Wire form is
/// `group/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Resource group owning the node
    pub group: String,
    /// Deployment / VM name inside the group
    pub name: String,
}

impl NodeId {
    /// Build an id from its parts
    pub fn new(group: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse a `group/name` id string
    pub fn parse(id: &str) -> Result<Self, NodeIdError> {
        match id.split_once('/') {
            Some((group, name)) if !group.is_empty() && !name.is_empty() => {
                Ok(Self::new(group, name))
            }
            _ => Err(NodeIdError::Malformed(id.to_string())),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// Node id parse failure
#[derive(Debug, thiserror::Error)]
pub enum NodeIdError {
    /// Not of the form `group/name`
    #[error("malformed node id: {0}")]
    Malformed(String),
}

/// Login credentials for a provisioned node.
///
/// Always produced per provisioning call; nothing here is process-wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    /// Admin user name
    pub username: String,
    /// Admin password; absent when login is key-based only
    pub password: Option<String>,
}

impl LoginCredentials {
    /// Password-based credentials
    pub fn with_password(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: Some(password.to_string()),
        }
    }

    /// Key-based credentials (password authentication disabled)
    pub fn key_only(username: &str) -> Self {
        Self {
            username: username.to_string(),
            password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_round_trip() {
        let id = NodeId::new("webfarm", "node-1");
        assert_eq!(id.to_string(), "webfarm/node-1");

        let parsed = NodeId::parse("webfarm/node-1").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_node_id_rejects_malformed() {
        assert!(NodeId::parse("no-separator").is_err());
        assert!(NodeId::parse("/name").is_err());
        assert!(NodeId::parse("group/").is_err());
    }
}
