//! PolicyStore trait: the repository contract over the policy model.
//!
//! The query facade is storage-agnostic. Implementations include the
//! in-memory reference store and SQLite.

use std::sync::Arc;

use async_trait::async_trait;
use rolegate_core::{Actor, Permission, Role};

use crate::error::Result;

/// One role held by an actor, as seen inside an [`ActorGrants`] read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedRole {
    /// The assigned role name.
    pub name: String,
    /// The role's permissions, or `None` when the assignment names a role
    /// that is absent from the role table.
    pub permissions: Option<Vec<Permission>>,
}

impl GrantedRole {
    /// Whether the role still exists in the role table.
    pub fn is_live(&self) -> bool {
        self.permissions.is_some()
    }
}

/// Everything an actor holds, read in one consistent section.
///
/// This is the unit the resolution engine works on. A store must build it
/// under a single read lock or read transaction so that no decision can mix
/// state from before and after a cascading delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorGrants {
    pub actor: Actor,
    /// Assigned roles, sorted by name.
    pub roles: Vec<GrantedRole>,
}

/// The PolicyStore trait: async interface over roles, actors and assignments.
///
/// All methods are async to support both in-memory and I/O-backed stores.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Unique roles**: `create_role` on a taken name fails `AlreadyExists(role)`
///   and mutates nothing.
/// - **Lazy actors**: `assign_role` creates the actor record on first use.
///   Actor records are never removed.
/// - **Cascade**: `delete_role` removes the role, its permissions and every
///   assignment naming it in one atomic step.
/// - **Validation**: write operations reject empty identifiers with
///   `CannotBeEmpty`.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Role Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a role with a fixed permission list.
    async fn create_role(&self, name: &str, permissions: &[Permission]) -> Result<Role>;

    /// Look up a role by name.
    async fn find_role(&self, name: &str) -> Result<Role>;

    /// Delete a role, cascading its permissions and assignments.
    async fn delete_role(&self, name: &str) -> Result<()>;

    /// List the permissions of a role, in creation order.
    async fn list_role_permissions(&self, name: &str) -> Result<Vec<Permission>>;

    /// List all roles, sorted by name.
    async fn list_roles(&self) -> Result<Vec<Role>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Actor Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Record an actor explicitly.
    ///
    /// Fails `AlreadyExists(actor)` if the identity already has a record,
    /// including one created implicitly by `assign_role`.
    async fn create_actor(&self, actor: &Actor) -> Result<Actor>;

    /// Look up an actor record.
    async fn find_actor(&self, actor: &Actor) -> Result<Actor>;

    /// List all recorded actors, sorted.
    async fn list_actors(&self) -> Result<Vec<Actor>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Assignment Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Assign an existing role to an actor.
    ///
    /// # Errors
    /// - `NotFound(role)` if the role does not exist.
    /// - `AlreadyExists(assignment)` if the actor already holds the role.
    async fn assign_role(&self, role_name: &str, actor: &Actor) -> Result<()>;

    /// Remove a role from an actor.
    ///
    /// Checked in order: `NotFound(role)`, `NotFound(actor)`,
    /// `NotFound(assignment)`.
    async fn unassign_role(&self, role_name: &str, actor: &Actor) -> Result<()>;

    /// List the actors currently holding a role, sorted.
    async fn list_role_actors(&self, role_name: &str) -> Result<Vec<Actor>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Read an actor's roles and their permissions atomically.
    ///
    /// Returns `None` for an actor with no record.
    async fn actor_grants(&self, actor: &Actor) -> Result<Option<ActorGrants>>;
}

/// Extension trait for common store patterns.
pub trait PolicyStoreExt: PolicyStore {
    /// Whether a role exists, without surfacing `NotFound`.
    fn role_exists(&self, name: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Whether an actor has a record, without surfacing `NotFound`.
    fn actor_exists(&self, actor: &Actor)
        -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl<S: PolicyStore + ?Sized> PolicyStoreExt for S {
    async fn role_exists(&self, name: &str) -> Result<bool> {
        match self.find_role(name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn actor_exists(&self, actor: &Actor) -> Result<bool> {
        match self.find_actor(actor).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Shared stores: lets several facades and tasks hold one store.
#[async_trait]
impl<S: PolicyStore + ?Sized> PolicyStore for Arc<S> {
    async fn create_role(&self, name: &str, permissions: &[Permission]) -> Result<Role> {
        (**self).create_role(name, permissions).await
    }

    async fn find_role(&self, name: &str) -> Result<Role> {
        (**self).find_role(name).await
    }

    async fn delete_role(&self, name: &str) -> Result<()> {
        (**self).delete_role(name).await
    }

    async fn list_role_permissions(&self, name: &str) -> Result<Vec<Permission>> {
        (**self).list_role_permissions(name).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        (**self).list_roles().await
    }

    async fn create_actor(&self, actor: &Actor) -> Result<Actor> {
        (**self).create_actor(actor).await
    }

    async fn find_actor(&self, actor: &Actor) -> Result<Actor> {
        (**self).find_actor(actor).await
    }

    async fn list_actors(&self) -> Result<Vec<Actor>> {
        (**self).list_actors().await
    }

    async fn assign_role(&self, role_name: &str, actor: &Actor) -> Result<()> {
        (**self).assign_role(role_name, actor).await
    }

    async fn unassign_role(&self, role_name: &str, actor: &Actor) -> Result<()> {
        (**self).unassign_role(role_name, actor).await
    }

    async fn list_role_actors(&self, role_name: &str) -> Result<Vec<Actor>> {
        (**self).list_role_actors(role_name).await
    }

    async fn actor_grants(&self, actor: &Actor) -> Result<Option<ActorGrants>> {
        (**self).actor_grants(actor).await
    }
}
