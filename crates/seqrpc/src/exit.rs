use std::fmt;
use std::io;

use seqrpc_client::ClientError;
use seqrpc_server::ServerError;
use seqrpc_wire::WireError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrInUse => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    match err {
        WireError::Io(source) => io_error(context, source),
        WireError::StreamEnded => CliError::new(FAILURE, format!("{context}: {err}")),
        WireError::MalformedPayload(_)
        | WireError::UnknownTag(_)
        | WireError::BadValue { .. }
        | WireError::UnsupportedParam(_)
        | WireError::TypeMismatch { .. }
        | WireError::OutOfRange { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Connect { source, .. } => io_error(context, source),
        ClientError::Wire(err) => wire_error(context, err),
        ClientError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ClientError::Closed => CliError::new(FAILURE, format!("{context}: {err}")),
        ClientError::Resolve { .. } => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn server_error(context: &str, err: ServerError) -> CliError {
    match err {
        ServerError::Bind { source, .. } => io_error(context, source),
        ServerError::Wire(err) => wire_error(context, err),
        ServerError::EmptyService(_)
        | ServerError::UnnamedService
        | ServerError::DuplicateService(_)
        | ServerError::RegistrarRejected { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}
