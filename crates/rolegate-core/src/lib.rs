//! # Rolegate Core
//!
//! The domain model for rolegate: actors, roles, permissions and the role
//! assignments that connect them, plus the error vocabulary every other layer
//! speaks.
//!
//! This crate contains no I/O, no storage and no locking. It is pure data
//! plus validation.
//!
//! ## Key Types
//!
//! - [`Actor`] - A principal identified by `(domain_id, issuer)`
//! - [`Role`] - A named bundle of permissions, fixed at creation
//! - [`Permission`] - An `(action, resource)` pair owned by one role
//! - [`RoleAssignment`] - A membership edge between an actor and a role
//! - [`DomainError`] - `NotFound`, `AlreadyExists`, `CannotBeEmpty`

pub mod error;
pub mod types;
pub mod validation;

pub use error::{DomainError, Entity, Field};
pub use types::{Actor, Permission, Role, RoleAssignment};
pub use validation::{
    require, validate_actor, validate_new_role, validate_permission, validate_role_name,
};
