//! Protocol modules (frame + envelope).
//!
//! The wire format is two layers:
//! - Frame: 4-byte big-endian signed length prefix followed by the payload.
//! - Envelope: the compact JSON object carried in each frame payload.
//!
//! Both parsers are panic-free: a short or non-positive frame is end-of-stream,
//! and a malformed envelope is a `ChatError::Parse`.

pub mod envelope;
pub mod frame;

pub use envelope::{kind, Envelope};
pub use frame::{decode_frame, encode_frame, payload_len, FrameRead, LEN_PREFIX};
