//! chatline core: transport-agnostic protocol primitives and the shared error type.
//!
//! This crate defines the wire-level contracts (length-prefixed frames carrying
//! JSON envelopes) and the error surface used by the client. No runtime
//! dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed input is
//! reported as `ChatError` or degraded to `EndOfStream`, never a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ChatError, ErrorCode, Result};
