//! Session layer: connection lifecycle and the outward command surface.

pub mod command;
pub mod controller;
pub mod state;
pub mod throttle;

pub use command::{parse_address, parse_outgoing, Outgoing, PM_USAGE};
pub use controller::SessionController;
pub use state::ConnectionState;
pub use throttle::Throttle;
