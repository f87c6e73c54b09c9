use serde::{Deserialize, Serialize};

/// One RPC request on the wire.
///
/// `seq` is assigned by the client, unique within the lifetime of one
/// connection, monotonically increasing from 1. The server echoes it
/// verbatim in the matching [`Response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Request {
    pub seq: u64,
    pub service_name: String,
    pub method_name: String,
    #[serde(default)]
    pub params: Vec<RequestParam>,
}

/// One RPC response on the wire.
///
/// `code == 0` means success; nonzero codes are application-defined error
/// codes (see [`code`] for the ones the dispatcher itself produces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Response {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub seq: u64,
}

impl Response {
    /// Successful response carrying `data`.
    pub fn ok(data: impl Into<serde_json::Value>) -> Self {
        Self {
            code: code::OK,
            message: String::new(),
            data: data.into(),
            seq: 0,
        }
    }

    /// Error response with the given code and message. Carries no data.
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: serde_json::Value::Null,
            seq: 0,
        }
    }
}

/// Tagged-union wire encoding of one call argument.
///
/// The tag names a type in the fixed supported set; the value is its
/// canonical string encoding. See [`crate::value::Value`] for the
/// conversions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParam {
    #[serde(rename = "Type")]
    pub tag: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Response codes produced by the dispatcher itself.
///
/// Services are free to use any other nonzero code for their own errors.
pub mod code {
    pub const OK: i32 = 0;
    pub const SERVICE_NOT_FOUND: i32 = 1;
    pub const METHOD_NOT_FOUND: i32 = 2;
    pub const BAD_PARAMS: i32 = 3;
    pub const INVOKE_FAILED: i32 = 4;
}
