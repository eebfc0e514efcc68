//! Error vocabulary shared by every rolegate layer.
//!
//! These are structured values, not transport codes. Only the query facade
//! decides how (and whether) they surface to a caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Role,
    Actor,
    Assignment,
}

impl Entity {
    /// Stable lowercase name, used in messages and audit fields.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Entity::Role => "role",
            Entity::Actor => "actor",
            Entity::Assignment => "role assignment",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input field that must carry a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    RoleName,
    DomainId,
    Issuer,
    PermissionName,
    ResourcePattern,
}

impl Field {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Field::RoleName => "role name",
            Field::DomainId => "domain id",
            Field::Issuer => "issuer",
            Field::PermissionName => "permission name",
            Field::ResourcePattern => "resource pattern",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("{0} already exists")]
    AlreadyExists(Entity),

    #[error("{0} cannot be empty")]
    CannotBeEmpty(Field),
}

impl DomainError {
    /// True for `NotFound` of any entity kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
