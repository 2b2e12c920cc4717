//! Transport layer (TCP).
//!
//! Exposes the async frame codec and the connection type that owns the byte
//! stream, serializes writers, and feeds the single read loop.

pub mod codec;
pub mod connection;

pub use connection::{run_read_loop, ConnectOptions, Connection, FrameReader, ReadLoopExit};
