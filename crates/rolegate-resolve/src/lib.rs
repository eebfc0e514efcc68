//! # Rolegate Resolve
//!
//! The resolution engine: read-only algorithms that answer authorization
//! questions against the policy store.
//!
//! ## Overview
//!
//! Resolution is a pure function of one consistent read. The store hands out
//! an [`ActorGrants`](rolegate_store::ActorGrants) (the actor's roles with
//! their permissions) and the functions in [`engine`] answer from it:
//!
//! - [`engine::has_permission`] - some assigned role grants `(name, resource)`
//! - [`engine::has_role`] - the role is in the actor's assignment set
//! - [`engine::actor_roles`] - every assigned role
//! - [`engine::resource_patterns`] - distinct resources for one action
//!
//! Resource patterns are compared by exact string equality. There is no
//! wildcard or glob expansion.
//!
//! [`Resolver`] wraps a store and performs the read for you. Unknown actors
//! resolve to `false` or empty, never to an error.

pub mod engine;
pub mod resolver;

pub use resolver::Resolver;
