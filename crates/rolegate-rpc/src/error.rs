//! Error types for the adapter.

use thiserror::Error;

/// Errors that can occur while moving messages across the wire.
///
/// Failures of the operations themselves are not errors here: they travel
/// back to the caller as a [`Status`](crate::Status) inside the reply.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A message could not be encoded to CBOR.
    #[error("encode error: {0}")]
    Encode(String),

    /// Incoming bytes were not a valid message.
    #[error("decode error: {0}")]
    Decode(String),

    /// Message exceeds a size limit.
    #[error("message too large: {0}")]
    TooLarge(&'static str),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, RpcError>;
