//! # Rolegate RPC
//!
//! The adapter boundary: decoded remote calls in, replies out.
//!
//! ## Overview
//!
//! A transport (gRPC, HTTP, a message queue) decodes its wire format into a
//! [`Request`], hands it to [`AuthzService::handle`] and encodes the
//! [`Reply`] it gets back. Requests and replies also have a CBOR encoding for
//! transports that just move bytes ([`AuthzService::handle_bytes`]).
//!
//! The adapter owns three concerns the core does not:
//!
//! - **Status mapping**: facade errors become a [`Status`]. The default
//!   [`StatusMapping::Typed`] gives each domain error its own code;
//!   [`StatusMapping::Collapsed`] folds them into one generic code.
//! - **Audit**: one [`AuditEvent`] per call goes to an [`AuditSink`].
//! - **Panic recovery**: every call runs on its own task, a panic becomes
//!   an `Internal` status.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rolegate::{Authorizer, AuthorizerConfig};
//! use rolegate::store::MemoryStore;
//! use rolegate_rpc::{AuthzService, Request, WireActor};
//!
//! async fn example() {
//!     let authz = Authorizer::new(MemoryStore::new(), AuthorizerConfig::default());
//!     let service = AuthzService::new(authz);
//!
//!     let reply = service
//!         .handle(Request::HasRole {
//!             role_name: "billing-admin".into(),
//!             actor: WireActor { id: "u1".into(), issuer: "uaa".into() },
//!         })
//!         .await;
//!     assert!(reply.is_ok());
//! }
//! ```

pub mod audit;
pub mod error;
pub mod messages;
pub mod service;
pub mod status;

pub use audit::{AuditEvent, AuditSink, Outcome, TracingAuditSink};
pub use error::{Result, RpcError};
pub use messages::{limits, Reply, Request, Response, WireActor, WirePermission, WireRole};
pub use service::AuthzService;
pub use status::{Status, StatusCode, StatusMapping};
