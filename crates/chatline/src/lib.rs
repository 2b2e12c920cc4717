//! chatline: length-prefixed JSON chat client.
//!
//! `core` holds the frame codec, envelope schema and error type; `client`
//! holds the session controller and everything it drives.

pub mod core {
    pub use chatline_core::*;
}

pub mod client {
    pub use chatline_client::*;
}
