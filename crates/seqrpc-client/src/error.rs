use std::time::Duration;

use seqrpc_wire::WireError;

/// Errors that can occur on the client side of a call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Failed to connect to the server address.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Wire-level error (framing, serialization, marshaling, or I/O).
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// No response arrived within the configured read timeout.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The connection closed before a response was delivered.
    #[error("connection closed before response")]
    Closed,

    /// A service name could not be resolved to a network address.
    #[error("service resolution failed for '{name}': {reason}")]
    Resolve { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;
