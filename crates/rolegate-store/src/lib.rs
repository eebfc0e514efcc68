//! # Rolegate Store
//!
//! The policy store: the mutable state of rolegate and the repository
//! operations over it. Provides a trait-based interface with an in-memory
//! reference implementation and a SQLite implementation.
//!
//! ## Overview
//!
//! The store module abstracts policy storage behind the [`PolicyStore`]
//! trait, allowing the query facade to be storage-agnostic. [`MemoryStore`]
//! is the reference implementation; [`SqliteStore`] is the persistent
//! substitute with the same atomicity.
//!
//! ## Key Types
//!
//! - [`PolicyStore`] - The async trait for all policy operations
//! - [`MemoryStore`] - One `RwLock` over every table
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`ActorGrants`] - An actor's roles and permissions, read atomically
//! - [`StoreConfig`] - Backend selection
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rolegate_core::{Actor, Permission};
//! use rolegate_store::{MemoryStore, PolicyStore};
//!
//! async fn example() {
//!     let store = MemoryStore::new();
//!
//!     store
//!         .create_role("billing-admin", &[Permission::new("invoice.read", "org:42")])
//!         .await
//!         .unwrap();
//!     store
//!         .assign_role("billing-admin", &Actor::new("u1", "uaa"))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Unique names**: Creating a role twice returns `AlreadyExists(role)`
//! - **Lazy actors**: The first assignment creates the actor record
//! - **Atomic cascade**: Deleting a role removes its permissions and
//!   assignments in the same critical section or transaction
//! - **Consistent reads**: [`PolicyStore::actor_grants`] never mixes
//!   pre- and post-delete state
//! - **Deadlines**: A write run under an expired [`CallDeadline`] rolls
//!   back instead of committing

pub mod config;
pub mod deadline;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use config::StoreConfig;
pub use deadline::CallDeadline;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ActorGrants, GrantedRole, PolicyStore, PolicyStoreExt};
