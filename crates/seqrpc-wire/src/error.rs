/// Errors that can occur while encoding, decoding, or marshaling wire data.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The stream ended cleanly before any header byte was read.
    #[error("stream ended")]
    StreamEnded,

    /// The stream ended partway through the 8-byte length header.
    #[error("truncated length header ({got} of 8 bytes)")]
    TruncatedHeader { got: usize },

    /// The length header contains non-digit bytes.
    #[error("length header is not 8 decimal ASCII digits")]
    BadLengthHeader,

    /// The stream ended before the declared payload length was read.
    #[error("truncated payload ({got} of {expected} bytes)")]
    TruncatedPayload { expected: usize, got: usize },

    /// The payload bytes do not deserialize as the expected envelope.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The serialized payload exceeds the 8-digit length capacity.
    #[error("payload too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A wire parameter carries a tag outside the supported set.
    #[error("unknown parameter tag '{0}'")]
    UnknownTag(String),

    /// A wire parameter's value string does not parse under its tag.
    #[error("invalid {tag} value '{value}'")]
    BadValue { tag: &'static str, value: String },

    /// A native value has no representation in the wire tag set.
    #[error("unsupported parameter type: {0}")]
    UnsupportedParam(String),

    /// A parameter does not fit the target argument slot.
    #[error("parameter type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },

    /// A numeric parameter is out of range for the target argument slot.
    #[error("parameter out of range for {target}: {value}")]
    OutOfRange {
        target: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, WireError>;
