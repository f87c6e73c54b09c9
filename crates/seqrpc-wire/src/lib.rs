//! Wire protocol for seqrpc: length-prefixed framing plus tagged-value
//! parameter marshaling.
//!
//! Every message on the wire is one frame:
//! - An 8-digit zero-padded decimal ASCII length header
//! - Exactly that many bytes of serialized payload
//!
//! The payload is a serialized [`Request`] or [`Response`] envelope. The
//! framing routine is identical for both directions; only the payload schema
//! differs. No partial reads, no buffer management in user code.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod value;

pub use codec::{Codec, JsonCodec, Protocol};
pub use envelope::{code, Request, RequestParam, Response};
pub use error::{Result, WireError};
pub use frame::{encode_frame, read_frame, FrameReader, FrameWriter, HEADER_LEN, MAX_PAYLOAD};
pub use value::{FromValue, ParamKind, Value};
