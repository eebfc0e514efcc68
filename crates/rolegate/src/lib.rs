//! # Rolegate
//!
//! Centralized role-based authorization: one place that knows which actors
//! hold which roles, and which permissions those roles carry.
//!
//! ## Overview
//!
//! Callers ask questions such as "does actor *A* hold permission *P* on
//! resource *R*?" and get a yes/no. Policy is managed through the same
//! facade:
//!
//! - **Roles**: Named bundles of `(action, resource)` permissions, fixed at creation
//! - **Actors**: Principals identified by `(domain_id, issuer)`, recorded lazily
//! - **Assignments**: Membership edges between actors and roles
//! - **Decisions**: `has_permission`, `has_role`, `list_actor_roles`,
//!   `list_resource_patterns`
//!
//! ## Key Concepts
//!
//! - **No leak**: decision calls answer `false` or empty for unknown actors
//!   and unknown roles alike. They never reveal which one was missing.
//! - **Cascade**: deleting a role removes its permissions and every
//!   assignment in one atomic step.
//! - **Exact match**: resource patterns are opaque strings compared for
//!   equality.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rolegate::{Actor, Authorizer, AuthorizerConfig, Permission};
//! use rolegate::store::SqliteStore;
//!
//! async fn example() -> rolegate::Result<()> {
//!     let store = SqliteStore::open("rolegate.db")?;
//!     let authz = Authorizer::new(store, AuthorizerConfig::default());
//!
//!     authz
//!         .create_role("billing-admin", &[Permission::new("invoice.read", "org:42")])
//!         .await?;
//!
//!     let alice = Actor::new("u1", "uaa");
//!     authz.assign_role("billing-admin", &alice).await?;
//!
//!     assert!(authz.has_permission(&alice, "invoice.read", "org:42").await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `rolegate::core` - Domain types and validation
//! - `rolegate::store` - Storage abstraction, memory and SQLite backends
//! - `rolegate::resolve` - Resolution algorithms

pub mod authorizer;
pub mod config;
pub mod error;

// Re-export component crates
pub use rolegate_core as core;
pub use rolegate_resolve as resolve;
pub use rolegate_store as store;

// Re-export main types for convenience
pub use authorizer::Authorizer;
pub use config::{AuthorizerConfig, ServiceConfig};
pub use error::{AuthzError, Result};

// Re-export commonly used core types
pub use rolegate_core::{Actor, DomainError, Entity, Field, Permission, Role, RoleAssignment};
pub use rolegate_store::{PolicyStore, StoreConfig};
