//! Wire message types.
//!
//! A remote call arrives as a CBOR-encoded [`Request`] and leaves as a
//! CBOR-encoded [`Reply`]. Wire structs map 1:1 onto the domain types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use rolegate_core::{Actor, Permission, Role};

use crate::error::{Result, RpcError};
use crate::status::Status;

/// Message size limits.
pub mod limits {
    /// Max encoded size of one request or reply.
    pub const MAX_MESSAGE_BYTES: usize = 256 * 1024;
    /// Max permissions in CreateRole.permissions.
    pub const MAX_PERMISSIONS_PER_ROLE: usize = 1000;
}

/// An actor as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireActor {
    pub id: String,
    pub issuer: String,
}

impl From<WireActor> for Actor {
    fn from(w: WireActor) -> Self {
        Actor::new(w.id, w.issuer)
    }
}

impl From<&Actor> for WireActor {
    fn from(a: &Actor) -> Self {
        Self {
            id: a.domain_id.clone(),
            issuer: a.issuer.clone(),
        }
    }
}

/// A permission as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePermission {
    pub name: String,
    pub resource_pattern: String,
}

impl From<WirePermission> for Permission {
    fn from(w: WirePermission) -> Self {
        Permission::new(w.name, w.resource_pattern)
    }
}

impl From<&Permission> for WirePermission {
    fn from(p: &Permission) -> Self {
        Self {
            name: p.name.clone(),
            resource_pattern: p.resource_pattern.clone(),
        }
    }
}

/// A role together with its permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRole {
    pub name: String,
    pub permissions: Vec<WirePermission>,
}

impl WireRole {
    pub fn new(role: &Role, permissions: &[Permission]) -> Self {
        Self {
            name: role.name.clone(),
            permissions: permissions.iter().map(WirePermission::from).collect(),
        }
    }
}

/// Decoded remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    CreateRole {
        name: String,
        permissions: Vec<WirePermission>,
    },
    GetRole {
        name: String,
    },
    DeleteRole {
        name: String,
    },
    AssignRole {
        role_name: String,
        actor: WireActor,
    },
    UnassignRole {
        role_name: String,
        actor: WireActor,
    },
    HasRole {
        role_name: String,
        actor: WireActor,
    },
    ListActorRoles {
        actor: WireActor,
    },
    HasPermission {
        actor: WireActor,
        permission_name: String,
        resource_id: String,
    },
    ListResourcePatterns {
        actor: WireActor,
        permission_name: String,
    },
}

impl Request {
    /// Stable identifier of the call, used as the audit signature.
    pub fn signature(&self) -> &'static str {
        match self {
            Request::CreateRole { .. } => "CreateRole",
            Request::GetRole { .. } => "GetRole",
            Request::DeleteRole { .. } => "DeleteRole",
            Request::AssignRole { .. } => "AssignRole",
            Request::UnassignRole { .. } => "UnassignRole",
            Request::HasRole { .. } => "HasRole",
            Request::ListActorRoles { .. } => "ListActorRoles",
            Request::HasPermission { .. } => "HasPermission",
            Request::ListResourcePatterns { .. } => "ListResourcePatterns",
        }
    }

    /// Human-readable name of the call.
    pub fn display_name(&self) -> &'static str {
        match self {
            Request::CreateRole { .. } => "create role",
            Request::GetRole { .. } => "get role",
            Request::DeleteRole { .. } => "delete role",
            Request::AssignRole { .. } => "assign role",
            Request::UnassignRole { .. } => "unassign role",
            Request::HasRole { .. } => "check role",
            Request::ListActorRoles { .. } => "list actor roles",
            Request::HasPermission { .. } => "check permission",
            Request::ListResourcePatterns { .. } => "list resource patterns",
        }
    }

    /// Key/value pairs describing the call's arguments.
    pub fn audit_fields(&self) -> Vec<(&'static str, String)> {
        let actor = |a: &WireActor| ("actor", format!("{}@{}", a.id, a.issuer));
        match self {
            Request::CreateRole { name, permissions } => vec![
                ("role", name.clone()),
                ("permissions", permissions.len().to_string()),
            ],
            Request::GetRole { name } | Request::DeleteRole { name } => {
                vec![("role", name.clone())]
            }
            Request::AssignRole { role_name, actor: a }
            | Request::UnassignRole { role_name, actor: a }
            | Request::HasRole { role_name, actor: a } => {
                vec![("role", role_name.clone()), actor(a)]
            }
            Request::ListActorRoles { actor: a } => vec![actor(a)],
            Request::HasPermission {
                actor: a,
                permission_name,
                resource_id,
            } => vec![
                actor(a),
                ("permission", permission_name.clone()),
                ("resource", resource_id.clone()),
            ],
            Request::ListResourcePatterns {
                actor: a,
                permission_name,
            } => vec![actor(a), ("permission", permission_name.clone())],
        }
    }

    /// Check if this request respects size limits.
    pub fn validate_limits(&self) -> std::result::Result<(), &'static str> {
        if let Request::CreateRole { permissions, .. } = self {
            if permissions.len() > limits::MAX_PERMISSIONS_PER_ROLE {
                return Err("too many permissions");
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let request: Self = decode(bytes)?;
        request.validate_limits().map_err(RpcError::TooLarge)?;
        Ok(request)
    }
}

/// Successful results, one shape per call family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// CreateRole, GetRole.
    Role(WireRole),
    /// DeleteRole, AssignRole, UnassignRole.
    Done,
    /// HasRole, HasPermission.
    Decision(bool),
    /// ListActorRoles.
    Roles(Vec<String>),
    /// ListResourcePatterns, sorted and distinct.
    ResourcePatterns(Vec<String>),
}

/// What the adapter sends back for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub status: Status,
    /// Present iff `status` is OK.
    pub body: Option<Response>,
}

impl Reply {
    pub fn ok(body: Response) -> Self {
        Self {
            status: Status::ok(),
            body: Some(body),
        }
    }

    pub fn error(status: Status) -> Self {
        Self { status, body: None }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| RpcError::Encode(e.to_string()))?;
    if buf.len() > limits::MAX_MESSAGE_BYTES {
        return Err(RpcError::TooLarge("encoded message"));
    }
    Ok(buf)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() > limits::MAX_MESSAGE_BYTES {
        return Err(RpcError::TooLarge("incoming message"));
    }
    ciborium::from_reader(bytes).map_err(|e| RpcError::Decode(e.to_string()))
}
