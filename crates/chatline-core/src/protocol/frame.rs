//! Length-prefixed frame codec (panic-free).
//!
//! Parsing rules:
//! - Never index (`buf[0]`), always use `Buf` and `remaining()` checks.
//! - A short prefix, a non-positive length, or a short payload is
//!   end-of-stream, not an error.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ChatError, Result};

/// Size of the big-endian i32 length prefix.
pub const LEN_PREFIX: usize = 4;

/// Outcome of reading one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRead {
    /// A complete payload.
    Frame(Bytes),
    /// Stream closed, truncated, or signalled close with a non-positive length.
    EndOfStream,
}

/// Prepend the length prefix to `payload`.
///
/// Payloads whose length is not a positive `i32` cannot be represented on the
/// wire and are rejected.
pub fn encode_frame(payload: &[u8]) -> Result<Bytes> {
    let len = i32::try_from(payload.len())
        .ok()
        .filter(|len| *len > 0)
        .ok_or(ChatError::PayloadTooLarge(payload.len()))?;

    let mut buf = BytesMut::with_capacity(LEN_PREFIX + payload.len());
    buf.put_i32(len);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Interpret a length prefix. `None` means end-of-stream (`len <= 0`).
pub fn payload_len(prefix: [u8; LEN_PREFIX]) -> Option<usize> {
    let len = i32::from_be_bytes(prefix);
    if len <= 0 {
        return None;
    }
    usize::try_from(len).ok()
}

/// Decode one frame from the front of `buf`, treating `buf` as the whole
/// remaining stream. On `EndOfStream` the buffer is drained.
pub fn decode_frame(buf: &mut Bytes) -> FrameRead {
    if buf.remaining() < LEN_PREFIX {
        buf.advance(buf.remaining());
        return FrameRead::EndOfStream;
    }

    let mut prefix = [0u8; LEN_PREFIX];
    buf.copy_to_slice(&mut prefix);

    let Some(len) = payload_len(prefix) else {
        buf.advance(buf.remaining());
        return FrameRead::EndOfStream;
    };

    if buf.remaining() < len {
        buf.advance(buf.remaining());
        return FrameRead::EndOfStream;
    }

    FrameRead::Frame(buf.split_to(len))
}
