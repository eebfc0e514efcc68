//! Value types of the policy model.
//!
//! All of these are plain data. Identity is structural: two actors are the
//! same entity iff both `domain_id` and `issuer` match exactly, two roles iff
//! their names match.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A principal from an external identity domain.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Actor {
    /// Identifier assigned by the issuer.
    pub domain_id: String,
    /// The identity authority that assigned `domain_id`.
    pub issuer: String,
}

impl Actor {
    pub fn new(domain_id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            domain_id: domain_id.into(),
            issuer: issuer.into(),
        }
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({}@{})", self.domain_id, self.issuer)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.domain_id, self.issuer)
    }
}

/// A named bundle of permissions, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An action name paired with the resource scope it applies to.
///
/// Permissions are owned by exactly one role and have no identity of their
/// own. `resource_pattern` is compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    pub name: String,
    pub resource_pattern: String,
}

impl Permission {
    pub fn new(name: impl Into<String>, resource_pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_pattern: resource_pattern.into(),
        }
    }

    /// Exact match on both action and resource.
    pub fn grants(&self, name: &str, resource_id: &str) -> bool {
        self.name == name && self.resource_pattern == resource_id
    }
}

/// A membership edge between an actor and a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub actor: Actor,
    pub role_name: String,
}

impl RoleAssignment {
    pub fn new(actor: Actor, role_name: impl Into<String>) -> Self {
        Self {
            actor,
            role_name: role_name.into(),
        }
    }
}
