use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::envelope::{Request, Response};
use crate::error::{Result, WireError};
use crate::frame::{FrameReader, FrameWriter};

/// Payload serialization for request and response envelopes.
///
/// The framing layer is fixed; the codec decides how the bytes inside a
/// frame are laid out. Implementations must be symmetric: anything encoded
/// must decode back to an equal envelope.
pub trait Codec: Send + Sync {
    fn encode_request(&self, req: &Request) -> Result<Vec<u8>>;
    fn decode_request(&self, payload: &[u8]) -> Result<Request>;
    fn encode_response(&self, resp: &Response) -> Result<Vec<u8>>;
    fn decode_response(&self, payload: &[u8]) -> Result<Response>;
}

/// The default JSON codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode_request(&self, req: &Request) -> Result<Vec<u8>> {
        serde_json::to_vec(req).map_err(|err| WireError::MalformedPayload(err.to_string()))
    }

    fn decode_request(&self, payload: &[u8]) -> Result<Request> {
        serde_json::from_slice(payload).map_err(|err| WireError::MalformedPayload(err.to_string()))
    }

    fn encode_response(&self, resp: &Response) -> Result<Vec<u8>> {
        serde_json::to_vec(resp).map_err(|err| WireError::MalformedPayload(err.to_string()))
    }

    fn decode_response(&self, payload: &[u8]) -> Result<Response> {
        serde_json::from_slice(payload).map_err(|err| WireError::MalformedPayload(err.to_string()))
    }
}

/// Protocol descriptor: a name + version tag over a codec.
///
/// Both sides of a connection are expected to be constructed with the same
/// descriptor; there is no in-band negotiation.
#[derive(Clone)]
pub struct Protocol {
    name: String,
    version: String,
    codec: Arc<dyn Codec>,
}

impl Protocol {
    /// The default protocol: JSON payloads, version 1.
    pub fn json() -> Self {
        Self::new("json", "1", Arc::new(JsonCodec))
    }

    pub fn new(name: impl Into<String>, version: impl Into<String>, codec: Arc<dyn Codec>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            codec,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    /// Read and decode one request frame.
    pub fn read_request<R: Read>(&self, reader: &mut FrameReader<R>) -> Result<Request> {
        let payload = reader.read_frame()?;
        self.codec.decode_request(&payload)
    }

    /// Encode and send one request frame.
    pub fn write_request<W: Write>(&self, writer: &mut FrameWriter<W>, req: &Request) -> Result<()> {
        let payload = self.codec.encode_request(req)?;
        writer.send(&payload)
    }

    /// Read and decode one response frame.
    pub fn read_response<R: Read>(&self, reader: &mut FrameReader<R>) -> Result<Response> {
        let payload = reader.read_frame()?;
        self.codec.decode_response(&payload)
    }

    /// Encode and send one response frame.
    pub fn write_response<W: Write>(
        &self,
        writer: &mut FrameWriter<W>,
        resp: &Response,
    ) -> Result<()> {
        let payload = self.codec.encode_response(resp)?;
        writer.send(&payload)
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::json()
    }
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protocol")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}
