use seqrpc_wire::WireError;

/// Errors that can occur while setting up or running a server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind the listening socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Wire-level error (framing, serialization, or I/O).
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// A service definition had no usable methods.
    #[error("service '{0}' defines no invokable methods")]
    EmptyService(String),

    /// A service was registered without a name.
    #[error("service name must not be empty")]
    UnnamedService,

    /// A service of the same name is already registered.
    #[error("service '{0}' is already registered")]
    DuplicateService(String),

    /// An external registrar rejected the service announcement.
    #[error("registrar rejected service '{service}': {reason}")]
    RegistrarRejected { service: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ServerError>;
