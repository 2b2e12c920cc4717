//! Inbound envelope routing: handler registry keyed by `type` and the
//! per-connection context handlers render into.

pub mod dispatcher;

pub use dispatcher::{DispatchCtx, Dispatcher, EnvelopeHandler};
