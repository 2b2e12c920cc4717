//! chatline client library entry.
//!
//! This crate wires the TCP transport, the envelope dispatcher and its
//! built-in handlers, and the session controller into one client engine. It is
//! consumed by the terminal frontend (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod events;
pub mod history;
pub mod services;
pub mod session;
pub mod transport;

pub use app_state::AppState;
pub use events::{EventSink, UiEvent};
pub use session::{ConnectionState, SessionController};
