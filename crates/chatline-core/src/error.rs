//! Shared error type across chatline crates.

use thiserror::Error;

/// Stable error codes (used in log fields and by frontends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid input / malformed command or config.
    BadRequest,
    /// Transport could not be opened.
    ConnectFailed,
    /// Write to a closed or broken transport.
    SendFailed,
    /// Incoming payload is not a valid envelope.
    ParseFailed,
    /// Read loop ended after a successful connect.
    ConnectionLost,
    /// Payload cannot be framed or exceeds the inbound limit.
    PayloadTooLarge,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::ConnectFailed => "CONNECT_FAILED",
            ErrorCode::SendFailed => "SEND_FAILED",
            ErrorCode::ParseFailed => "PARSE_FAILED",
            ErrorCode::ConnectionLost => "CONNECTION_LOST",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("username must not be blank")]
    BlankUsername,
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("invalid config: {0}")]
    Config(String),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("{kind} envelope is missing `{field}`")]
    MissingField {
        kind: String,
        field: &'static str,
    },
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("internal: {0}")]
    Internal(String),
}

impl ChatError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ChatError::InvalidAddress(_)
            | ChatError::BlankUsername
            | ChatError::AlreadyConnected
            | ChatError::Config(_) => ErrorCode::BadRequest,
            ChatError::Connect(_) => ErrorCode::ConnectFailed,
            ChatError::NotConnected | ChatError::Send(_) => ErrorCode::SendFailed,
            ChatError::Parse(_) | ChatError::MissingField { .. } => ErrorCode::ParseFailed,
            ChatError::ConnectionLost(_) => ErrorCode::ConnectionLost,
            ChatError::PayloadTooLarge(_) => ErrorCode::PayloadTooLarge,
            ChatError::Internal(_) => ErrorCode::Internal,
        }
    }
}
