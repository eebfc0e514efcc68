//! The Authorizer: the query facade over a policy store.
//!
//! Operations come in two classes:
//!
//! - **Administrative** calls manage policy. They need to know whether a role
//!   or assignment exists, so `NotFound` and `AlreadyExists` surface as errors.
//! - **Decision** calls answer "is this actor allowed". They never tell an
//!   unknown actor, an unknown role and a missing grant apart: all three come
//!   back as `false` or empty. Only genuine faults (backing store down,
//!   deadline passed, malformed input) are errors.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use rolegate_core::{require, validate_actor, Actor, Field, Permission, Role};
use rolegate_resolve::Resolver;
use rolegate_store::{CallDeadline, PolicyStore, PolicyStoreExt, StoreError};

use crate::config::AuthorizerConfig;
use crate::error::{AuthzError, Result};

/// The main facade struct.
///
/// Provides a unified API for:
/// - Managing roles, actors and assignments
/// - Answering authorization decisions without leaking existence
pub struct Authorizer<S: PolicyStore> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: AuthorizerConfig,
}

impl<S: PolicyStore> Authorizer<S> {
    /// Create a facade owning its store.
    pub fn new(store: S, config: AuthorizerConfig) -> Self {
        Self::from_shared(Arc::new(store), config)
    }

    /// Create a facade over a store shared with other owners.
    pub fn from_shared(store: Arc<S>, config: AuthorizerConfig) -> Self {
        Self { store, config }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    /// Run a store call under the configured deadline.
    ///
    /// The deadline is visible to the store while the call runs. On expiry
    /// the call is abandoned unless the store already began committing, in
    /// which case the committed outcome is returned instead of a timeout.
    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> Result<T> {
        let Some(limit) = self.config.op_timeout() else {
            return fut.await.map_err(AuthzError::from);
        };

        let deadline = CallDeadline::new(limit);
        let scoped = Arc::clone(&deadline).scope(fut);
        tokio::pin!(scoped);

        let result = match tokio::time::timeout(limit, scoped.as_mut()).await {
            Ok(result) => result,
            Err(_) if deadline.abandon() => Err(StoreError::DeadlineExceeded),
            Err(_) => {
                tracing::debug!(op, "deadline passed during commit, awaiting outcome");
                scoped.await
            }
        };

        result.map_err(|e| match e {
            StoreError::DeadlineExceeded => AuthzError::DeadlineExceeded { op, limit },
            e => AuthzError::from(e),
        })
    }

    /// Collapse absence into the negative answer for a decision call.
    fn absorb<T: Default>(op: &'static str, result: Result<T>) -> Result<T> {
        match result {
            Err(e) if e.is_absence() => {
                tracing::debug!(op, "absence resolved as negative decision");
                Ok(T::default())
            }
            other => other,
        }
    }

    fn check_actor(&self, actor: &Actor) -> Result<()> {
        if self.config.validate_inputs {
            validate_actor(actor)?;
        }
        Ok(())
    }

    fn check_field(&self, value: &str, field: Field) -> Result<()> {
        if self.config.validate_inputs {
            require(value, field)?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administrative Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a role with its fixed permission list.
    pub async fn create_role(&self, name: &str, permissions: &[Permission]) -> Result<Role> {
        self.bounded("create_role", self.store.create_role(name, permissions))
            .await
    }

    /// Look up a role by name.
    pub async fn find_role(&self, name: &str) -> Result<Role> {
        self.bounded("find_role", self.store.find_role(name)).await
    }

    /// Delete a role together with its permissions and assignments.
    pub async fn delete_role(&self, name: &str) -> Result<()> {
        self.bounded("delete_role", self.store.delete_role(name)).await
    }

    pub async fn list_role_permissions(&self, name: &str) -> Result<Vec<Permission>> {
        self.bounded(
            "list_role_permissions",
            self.store.list_role_permissions(name),
        )
        .await
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        self.bounded("list_roles", self.store.list_roles()).await
    }

    pub async fn create_actor(&self, actor: &Actor) -> Result<Actor> {
        self.bounded("create_actor", self.store.create_actor(actor))
            .await
    }

    pub async fn find_actor(&self, actor: &Actor) -> Result<Actor> {
        self.bounded("find_actor", self.store.find_actor(actor)).await
    }

    pub async fn list_actors(&self) -> Result<Vec<Actor>> {
        self.bounded("list_actors", self.store.list_actors()).await
    }

    /// Assign a role to an actor, recording the actor if needed.
    pub async fn assign_role(&self, role_name: &str, actor: &Actor) -> Result<()> {
        self.bounded("assign_role", self.store.assign_role(role_name, actor))
            .await
    }

    pub async fn unassign_role(&self, role_name: &str, actor: &Actor) -> Result<()> {
        self.bounded("unassign_role", self.store.unassign_role(role_name, actor))
            .await
    }

    pub async fn list_role_actors(&self, role_name: &str) -> Result<Vec<Actor>> {
        self.bounded("list_role_actors", self.store.list_role_actors(role_name))
            .await
    }

    /// Whether a role with this name exists.
    pub async fn role_exists(&self, name: &str) -> Result<bool> {
        self.bounded("role_exists", self.store.role_exists(name)).await
    }

    pub async fn actor_exists(&self, actor: &Actor) -> Result<bool> {
        self.bounded("actor_exists", self.store.actor_exists(actor))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Decision Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the actor holds `permission_name` on exactly `resource_id`.
    pub async fn has_permission(
        &self,
        actor: &Actor,
        permission_name: &str,
        resource_id: &str,
    ) -> Result<bool> {
        self.check_actor(actor)?;
        self.check_field(permission_name, Field::PermissionName)?;
        self.check_field(resource_id, Field::ResourcePattern)?;

        let resolver = Resolver::new(&*self.store);
        let result = self
            .bounded(
                "has_permission",
                resolver.has_permission(actor, permission_name, resource_id),
            )
            .await;
        Self::absorb("has_permission", result)
    }

    /// Whether the actor is assigned `role_name`.
    ///
    /// An unknown actor and an unknown role both answer `false`.
    pub async fn has_role(&self, actor: &Actor, role_name: &str) -> Result<bool> {
        self.check_actor(actor)?;
        self.check_field(role_name, Field::RoleName)?;

        let resolver = Resolver::new(&*self.store);
        let result = self
            .bounded("has_role", resolver.has_role(actor, role_name))
            .await;
        Self::absorb("has_role", result)
    }

    /// The roles assigned to the actor. Unknown actors hold none.
    pub async fn list_actor_roles(&self, actor: &Actor) -> Result<Vec<Role>> {
        self.check_actor(actor)?;

        let resolver = Resolver::new(&*self.store);
        let result = self
            .bounded("list_actor_roles", resolver.actor_roles(actor))
            .await;
        Self::absorb("list_actor_roles", result)
    }

    /// Distinct resource patterns the actor holds `permission_name` on.
    pub async fn list_resource_patterns(
        &self,
        actor: &Actor,
        permission_name: &str,
    ) -> Result<BTreeSet<String>> {
        self.check_actor(actor)?;
        self.check_field(permission_name, Field::PermissionName)?;

        let resolver = Resolver::new(&*self.store);
        let result = self
            .bounded(
                "list_resource_patterns",
                resolver.resource_patterns(actor, permission_name),
            )
            .await;
        Self::absorb("list_resource_patterns", result)
    }
}
