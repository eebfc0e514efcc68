//! The adapter end to end: requests in, replies and audit events out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use rolegate::store::{ActorGrants, MemoryStore, Result as StoreResult, SqliteStore};
use rolegate::{Actor, Authorizer, AuthorizerConfig, Permission, PolicyStore, Role};
use rolegate_rpc::{
    AuthzService, Outcome, Reply, Request, Response, StatusCode, StatusMapping, WireActor,
    WirePermission, WireRole,
};
use rolegate_testkit::fixtures::RecordingAuditSink;

fn u1() -> WireActor {
    WireActor {
        id: "u1".into(),
        issuer: "uaa".into(),
    }
}

fn invoice_read() -> WirePermission {
    WirePermission {
        name: "invoice.read".into(),
        resource_pattern: "org:42".into(),
    }
}

fn service() -> (AuthzService<MemoryStore>, Arc<RecordingAuditSink>) {
    let sink = RecordingAuditSink::new();
    let authz = Authorizer::new(MemoryStore::new(), AuthorizerConfig::default());
    let service = AuthzService::new(authz).with_audit(sink.clone());
    (service, sink)
}

#[tokio::test]
async fn admin_and_decision_calls() {
    let (service, sink) = service();

    let reply = service
        .handle(Request::CreateRole {
            name: "billing-admin".into(),
            permissions: vec![invoice_read()],
        })
        .await;
    let role = WireRole {
        name: "billing-admin".into(),
        permissions: vec![invoice_read()],
    };
    assert_eq!(reply, Reply::ok(Response::Role(role.clone())));

    let reply = service
        .handle(Request::GetRole {
            name: "billing-admin".into(),
        })
        .await;
    assert_eq!(reply.body, Some(Response::Role(role)));

    let reply = service
        .handle(Request::AssignRole {
            role_name: "billing-admin".into(),
            actor: u1(),
        })
        .await;
    assert_eq!(reply.body, Some(Response::Done));

    let reply = service
        .handle(Request::HasPermission {
            actor: u1(),
            permission_name: "invoice.read".into(),
            resource_id: "org:42".into(),
        })
        .await;
    assert_eq!(reply.body, Some(Response::Decision(true)));

    let reply = service
        .handle(Request::ListActorRoles { actor: u1() })
        .await;
    assert_eq!(
        reply.body,
        Some(Response::Roles(vec!["billing-admin".to_string()]))
    );

    let reply = service
        .handle(Request::ListResourcePatterns {
            actor: u1(),
            permission_name: "invoice.read".into(),
        })
        .await;
    assert_eq!(
        reply.body,
        Some(Response::ResourcePatterns(vec!["org:42".to_string()]))
    );

    let events = sink.events();
    assert_eq!(events.len(), 6);
    assert!(events.iter().all(|e| e.outcome == Outcome::Success));
    assert_eq!(events[2].signature, "AssignRole");
    assert_eq!(events[2].field("actor"), Some("u1@uaa"));
}

#[tokio::test]
async fn domain_errors_map_to_typed_statuses() {
    let (service, sink) = service();

    let reply = service
        .handle(Request::AssignRole {
            role_name: "ghost-role".into(),
            actor: u1(),
        })
        .await;
    assert_eq!(reply.status.code, StatusCode::NotFound);
    assert_eq!(reply.status.message, "role not found");
    assert!(reply.body.is_none());

    let event = sink.last().unwrap();
    assert_eq!(event.outcome, Outcome::Failure);
    assert_eq!(event.code, StatusCode::NotFound);

    let create = Request::CreateRole {
        name: "viewer".into(),
        permissions: vec![],
    };
    assert!(service.handle(create.clone()).await.is_ok());
    let reply = service.handle(create).await;
    assert_eq!(reply.status.code, StatusCode::AlreadyExists);

    let reply = service
        .handle(Request::HasRole {
            role_name: "viewer".into(),
            actor: WireActor {
                id: String::new(),
                issuer: "uaa".into(),
            },
        })
        .await;
    assert_eq!(reply.status.code, StatusCode::InvalidArgument);
}

#[tokio::test]
async fn decisions_never_report_absence() {
    let (service, _) = service();

    for request in [
        Request::HasRole {
            role_name: "ghost-role".into(),
            actor: u1(),
        },
        Request::HasPermission {
            actor: u1(),
            permission_name: "invoice.read".into(),
            resource_id: "org:42".into(),
        },
    ] {
        let reply = service.handle(request).await;
        assert_eq!(reply.body, Some(Response::Decision(false)));
    }
}

#[tokio::test]
async fn collapsed_mapping_hides_error_kind() {
    let authz = Authorizer::new(MemoryStore::new(), AuthorizerConfig::default());
    let service = AuthzService::new(authz).with_status_mapping(StatusMapping::Collapsed);

    let missing = service
        .handle(Request::DeleteRole {
            name: "ghost-role".into(),
        })
        .await;

    let create = Request::CreateRole {
        name: "viewer".into(),
        permissions: vec![],
    };
    service.handle(create.clone()).await;
    let duplicate = service.handle(create).await;

    assert_eq!(missing.status.code, StatusCode::Unknown);
    assert_eq!(duplicate.status.code, StatusCode::Unknown);
    assert_eq!(missing.status.message, "role not found");
    assert_eq!(duplicate.status.message, "role already exists");
}

#[tokio::test]
async fn bytes_in_bytes_out() {
    let (service, sink) = service();

    let request = Request::HasRole {
        role_name: "viewer".into(),
        actor: u1(),
    };
    let bytes = service.handle_bytes(&request.to_bytes().unwrap()).await.unwrap();
    let reply = Reply::from_bytes(&bytes).unwrap();
    assert_eq!(reply.body, Some(Response::Decision(false)));

    let bytes = service.handle_bytes(b"not cbor at all").await.unwrap();
    let reply = Reply::from_bytes(&bytes).unwrap();
    assert_eq!(reply.status.code, StatusCode::InvalidArgument);
    assert_eq!(sink.events().len(), 1);
}

/// A store that panics on every decision read.
struct PanickingStore(MemoryStore);

#[async_trait]
impl PolicyStore for PanickingStore {
    async fn create_role(&self, name: &str, permissions: &[Permission]) -> StoreResult<Role> {
        self.0.create_role(name, permissions).await
    }
    async fn find_role(&self, name: &str) -> StoreResult<Role> {
        self.0.find_role(name).await
    }
    async fn delete_role(&self, name: &str) -> StoreResult<()> {
        self.0.delete_role(name).await
    }
    async fn list_role_permissions(&self, name: &str) -> StoreResult<Vec<Permission>> {
        self.0.list_role_permissions(name).await
    }
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        self.0.list_roles().await
    }
    async fn create_actor(&self, actor: &Actor) -> StoreResult<Actor> {
        self.0.create_actor(actor).await
    }
    async fn find_actor(&self, actor: &Actor) -> StoreResult<Actor> {
        self.0.find_actor(actor).await
    }
    async fn list_actors(&self) -> StoreResult<Vec<Actor>> {
        self.0.list_actors().await
    }
    async fn assign_role(&self, role_name: &str, actor: &Actor) -> StoreResult<()> {
        self.0.assign_role(role_name, actor).await
    }
    async fn unassign_role(&self, role_name: &str, actor: &Actor) -> StoreResult<()> {
        self.0.unassign_role(role_name, actor).await
    }
    async fn list_role_actors(&self, role_name: &str) -> StoreResult<Vec<Actor>> {
        self.0.list_role_actors(role_name).await
    }
    async fn actor_grants(&self, _: &Actor) -> StoreResult<Option<ActorGrants>> {
        panic!("grant table corrupted")
    }
}

#[tokio::test]
async fn panics_become_internal_status() {
    let sink = RecordingAuditSink::new();
    let authz = Authorizer::new(
        PanickingStore(MemoryStore::new()),
        AuthorizerConfig::default(),
    );
    let service = AuthzService::new(authz).with_audit(sink.clone());

    let reply = service
        .handle(Request::HasRole {
            role_name: "viewer".into(),
            actor: u1(),
        })
        .await;
    assert_eq!(reply.status.code, StatusCode::Internal);
    assert_eq!(sink.last().map(|e| e.outcome), Some(Outcome::Failure));

    // The service keeps serving after a panic
    let reply = service
        .handle(Request::CreateRole {
            name: "viewer".into(),
            permissions: vec![],
        })
        .await;
    assert!(reply.is_ok());
}

#[tokio::test]
async fn dropped_call_still_completes_and_audits() {
    let (service, sink) = service();
    service
        .handle(Request::CreateRole {
            name: "viewer".into(),
            permissions: vec![invoice_read()],
        })
        .await;

    // The caller gives up before the spawned call gets to run
    {
        let call = service.handle(Request::AssignRole {
            role_name: "viewer".into(),
            actor: u1(),
        });
        tokio::pin!(call);
        tokio::select! {
            biased;
            _ = &mut call => unreachable!("call finished before its task ran"),
            _ = std::future::ready(()) => {}
        }
    }
    assert_eq!(sink.events().len(), 1);

    for _ in 0..100 {
        if sink.events().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let event = sink.last().unwrap();
    assert_eq!(event.signature, "AssignRole");
    assert_eq!(event.outcome, Outcome::Success);
    assert!(service
        .authorizer()
        .has_role(&Actor::new("u1", "uaa"), "viewer")
        .await
        .unwrap());
}

#[tokio::test]
async fn sqlite_backed_service_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.db");
    let sink = RecordingAuditSink::new();

    {
        let authz = Authorizer::new(SqliteStore::open(&path).unwrap(), AuthorizerConfig::default());
        let service = AuthzService::new(authz).with_audit(sink.clone());
        for request in [
            Request::CreateRole {
                name: "billing-admin".into(),
                permissions: vec![invoice_read()],
            },
            Request::AssignRole {
                role_name: "billing-admin".into(),
                actor: u1(),
            },
        ] {
            assert!(service.handle(request).await.is_ok());
        }
    }

    let authz = Authorizer::new(SqliteStore::open(&path).unwrap(), AuthorizerConfig::default());
    let service = AuthzService::new(authz).with_audit(sink.clone());
    let reply = service
        .handle(Request::ListResourcePatterns {
            actor: u1(),
            permission_name: "invoice.read".into(),
        })
        .await;
    assert_eq!(reply.body, Some(Response::ResourcePatterns(vec!["org:42".into()])));
    assert_eq!(sink.events().len(), 3);
}
