use std::io::{ErrorKind, Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{Result, WireError};

/// Length header: 8 zero-padded decimal ASCII digits.
pub const HEADER_LEN: usize = 8;

/// Maximum payload size representable in an 8-digit decimal header.
pub const MAX_PAYLOAD: usize = 99_999_999;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Encode one frame (header + payload) into `dst`.
///
/// Fails with [`WireError::FrameTooLarge`] rather than emitting a corrupt
/// header when the payload exceeds the 8-digit capacity. The header is
/// always exactly 8 digits.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(WireError::FrameTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_LEN + payload.len());
    let mut header = [b'0'; HEADER_LEN];
    let digits = payload.len().to_string();
    header[HEADER_LEN - digits.len()..].copy_from_slice(digits.as_bytes());
    dst.put_slice(&header);
    dst.put_slice(payload);
    Ok(())
}

/// Read one frame's payload from `src` (blocking).
///
/// Distinguishes a clean end of stream ([`WireError::StreamEnded`], zero
/// bytes before any header byte) from a header or payload cut short mid-read.
pub fn read_frame<R: Read>(src: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_LEN];
    let got = read_full(src, &mut header)?;
    if got == 0 {
        return Err(WireError::StreamEnded);
    }
    if got < HEADER_LEN {
        return Err(WireError::TruncatedHeader { got });
    }

    let len = parse_header(&header)?;
    let mut payload = vec![0u8; len];
    let got = read_full(src, &mut payload)?;
    if got < len {
        return Err(WireError::TruncatedPayload { expected: len, got });
    }
    Ok(payload)
}

/// Fill `buf` as far as the stream allows, returning the byte count.
///
/// Stops early only on EOF; `Interrupted` reads are retried.
fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(WireError::Io(err)),
        }
    }
    Ok(filled)
}

fn parse_header(header: &[u8; HEADER_LEN]) -> Result<usize> {
    let mut len = 0usize;
    for &byte in header {
        if !byte.is_ascii_digit() {
            return Err(WireError::BadLengthHeader);
        }
        len = len * 10 + usize::from(byte - b'0');
    }
    Ok(len)
}

/// Reads complete frame payloads from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete payloads.
pub struct FrameReader<T> {
    inner: T,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Read the next complete frame payload (blocking).
    pub fn read_frame(&mut self) -> Result<Vec<u8>> {
        read_frame(&mut self.inner)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Writes complete frames to any `Write` stream.
///
/// Header and payload are assembled into one buffer and written as a single
/// logical write, so a frame is never interleaved mid-header.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Frame and send one payload (blocking).
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => {
                    return Err(WireError::Io(std::io::Error::from(
                        ErrorKind::WriteZero,
                    )))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
