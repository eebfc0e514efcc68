//! The request handler.
//!
//! [`AuthzService`] turns a decoded [`Request`] into facade calls and the
//! result into a [`Reply`]. Each call runs on its own task so that a panic
//! anywhere below is contained and reported as `Internal`.

use std::sync::Arc;

use rolegate::{Actor, Authorizer, Permission, PolicyStore};

use crate::audit::{AuditEvent, AuditSink, Outcome, TracingAuditSink};
use crate::messages::{Reply, Request, Response, WireRole};
use crate::status::{Status, StatusCode, StatusMapping};

/// Serves decoded calls against one [`Authorizer`].
pub struct AuthzService<S: PolicyStore> {
    authorizer: Arc<Authorizer<S>>,
    audit: Arc<dyn AuditSink>,
    mapping: StatusMapping,
}

impl<S: PolicyStore + 'static> AuthzService<S> {
    pub fn new(authorizer: Authorizer<S>) -> Self {
        Self::from_shared(Arc::new(authorizer))
    }

    pub fn from_shared(authorizer: Arc<Authorizer<S>>) -> Self {
        Self {
            authorizer,
            audit: Arc::new(TracingAuditSink),
            mapping: StatusMapping::default(),
        }
    }

    /// Replace the audit collaborator.
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_status_mapping(mut self, mapping: StatusMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn authorizer(&self) -> &Authorizer<S> {
        &self.authorizer
    }

    /// Handle one call and audit it.
    ///
    /// The call runs to completion on its own task and records its audit
    /// event there, so dropping the returned future neither cancels the call
    /// nor loses the event. Only a panicking call is audited from here.
    pub async fn handle(&self, request: Request) -> Reply {
        let signature = request.signature();
        let name = request.display_name();
        let fields = request.audit_fields();

        let authorizer = Arc::clone(&self.authorizer);
        let audit = Arc::clone(&self.audit);
        let mapping = self.mapping;
        let task_fields = fields.clone();
        let task = tokio::spawn(async move {
            let reply = match dispatch(&authorizer, request).await {
                Ok(body) => Reply::ok(body),
                Err(e) => Reply::error(mapping.status_for(&e)),
            };
            record(audit.as_ref(), signature, name, task_fields, &reply);
            reply
        });

        match task.await {
            Ok(reply) => reply,
            Err(e) => {
                let reply = if e.is_panic() {
                    tracing::error!(signature, "request handler panicked");
                    Reply::error(Status::internal("request handler panicked"))
                } else {
                    Reply::error(Status::internal("request handler cancelled"))
                };
                record(self.audit.as_ref(), signature, name, fields, &reply);
                reply
            }
        }
    }

    /// Decode, handle and encode one call.
    ///
    /// Undecodable input gets an `InvalidArgument` reply and is not audited.
    pub async fn handle_bytes(&self, bytes: &[u8]) -> crate::Result<Vec<u8>> {
        let reply = match Request::from_bytes(bytes) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::debug!(error = %e, "rejected undecodable request");
                Reply::error(Status::new(StatusCode::InvalidArgument, e.to_string()))
            }
        };
        reply.to_bytes()
    }
}

fn record(
    sink: &dyn AuditSink,
    signature: &'static str,
    name: &'static str,
    fields: Vec<(&'static str, String)>,
    reply: &Reply,
) {
    sink.record(&AuditEvent {
        signature,
        name,
        outcome: if reply.is_ok() {
            Outcome::Success
        } else {
            Outcome::Failure
        },
        code: reply.status.code,
        fields,
    });
}

async fn dispatch<S: PolicyStore>(
    authz: &Authorizer<S>,
    request: Request,
) -> rolegate::Result<Response> {
    match request {
        Request::CreateRole { name, permissions } => {
            let permissions: Vec<Permission> =
                permissions.into_iter().map(Permission::from).collect();
            let role = authz.create_role(&name, &permissions).await?;
            Ok(Response::Role(WireRole::new(&role, &permissions)))
        }
        Request::GetRole { name } => {
            let role = authz.find_role(&name).await?;
            let permissions = authz.list_role_permissions(&role.name).await?;
            Ok(Response::Role(WireRole::new(&role, &permissions)))
        }
        Request::DeleteRole { name } => {
            authz.delete_role(&name).await?;
            Ok(Response::Done)
        }
        Request::AssignRole { role_name, actor } => {
            authz.assign_role(&role_name, &Actor::from(actor)).await?;
            Ok(Response::Done)
        }
        Request::UnassignRole { role_name, actor } => {
            authz.unassign_role(&role_name, &Actor::from(actor)).await?;
            Ok(Response::Done)
        }
        Request::HasRole { role_name, actor } => {
            let held = authz.has_role(&Actor::from(actor), &role_name).await?;
            Ok(Response::Decision(held))
        }
        Request::ListActorRoles { actor } => {
            let roles = authz.list_actor_roles(&Actor::from(actor)).await?;
            Ok(Response::Roles(roles.into_iter().map(|r| r.name).collect()))
        }
        Request::HasPermission {
            actor,
            permission_name,
            resource_id,
        } => {
            let allowed = authz
                .has_permission(&Actor::from(actor), &permission_name, &resource_id)
                .await?;
            Ok(Response::Decision(allowed))
        }
        Request::ListResourcePatterns {
            actor,
            permission_name,
        } => {
            let patterns = authz
                .list_resource_patterns(&Actor::from(actor), &permission_name)
                .await?;
            Ok(Response::ResourcePatterns(patterns.into_iter().collect()))
        }
    }
}
