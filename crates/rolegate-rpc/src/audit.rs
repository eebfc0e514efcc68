//! Audit hook.
//!
//! The adapter hands one [`AuditEvent`] to its [`AuditSink`] after every
//! call, whatever the outcome.

use std::fmt;

use crate::status::StatusCode;

/// Whether a call succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One handled call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Stable call identifier, e.g. `HasPermission`.
    pub signature: &'static str,
    /// Human-readable call name.
    pub name: &'static str,
    pub outcome: Outcome,
    pub code: StatusCode,
    /// Call arguments as key/value pairs.
    pub fields: Vec<(&'static str, String)>,
}

impl AuditEvent {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Receives audit events from the adapter.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Emits each event as a `tracing` event on target `rolegate::audit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        let fields = event
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");

        tracing::info!(
            target: "rolegate::audit",
            signature = event.signature,
            name = event.name,
            outcome = %event.outcome,
            code = ?event.code,
            fields = %fields,
            "authorization call"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let event = AuditEvent {
            signature: "HasRole",
            name: "check role",
            outcome: Outcome::Success,
            code: StatusCode::Ok,
            fields: vec![("role", "viewer".into()), ("actor", "u1@uaa".into())],
        };
        assert_eq!(event.field("actor"), Some("u1@uaa"));
        assert_eq!(event.field("resource"), None);
        TracingAuditSink.record(&event);
    }
}
