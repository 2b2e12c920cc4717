//! Chat envelope (JSON payload of one frame).
//!
//! `type` is the only required field. Every other field is optional and
//! degrades to `None` when present but malformed, so a peer sending
//! `"ts": "soon"` or `"users": [1, "bob"]` never costs us the whole message.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ChatError, Result};

/// Known envelope type tags.
pub mod kind {
    pub const JOIN: &str = "join";
    pub const LEAVE: &str = "leave";
    pub const MSG: &str = "msg";
    pub const PM: &str = "pm";
    pub const SYS: &str = "sys";
    pub const TYPING: &str = "typing";
    pub const USERLIST: &str = "userlist";
}

/// One chat protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Type tag (field name is `type` in JSON).
    #[serde(rename = "type", deserialize_with = "de_kind")]
    pub kind: String,
    /// Sender identity.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Recipient identity (`pm` only).
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Body text.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Unix seconds set by the sender.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
    /// Connected users (`userlist` only).
    #[serde(default, deserialize_with = "de_users", skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<String>>,
}

impl Envelope {
    /// Bare envelope of the given kind, stamped with `ts`.
    pub fn new(kind: impl Into<String>, ts: i64) -> Self {
        Self {
            kind: kind.into(),
            from: None,
            to: None,
            text: None,
            ts: Some(ts),
            users: None,
        }
    }

    pub fn join(from: impl Into<String>, ts: i64) -> Self {
        Self::new(kind::JOIN, ts).with_from(from)
    }

    pub fn leave(from: impl Into<String>, ts: i64) -> Self {
        Self::new(kind::LEAVE, ts).with_from(from)
    }

    pub fn msg(from: impl Into<String>, text: impl Into<String>, ts: i64) -> Self {
        Self::new(kind::MSG, ts).with_from(from).with_text(text)
    }

    pub fn pm(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        ts: i64,
    ) -> Self {
        let mut env = Self::new(kind::PM, ts).with_from(from).with_text(text);
        env.to = Some(to.into());
        env
    }

    pub fn typing(from: impl Into<String>, text: impl Into<String>, ts: i64) -> Self {
        Self::new(kind::TYPING, ts).with_from(from).with_text(text)
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_users(mut self, users: Vec<String>) -> Self {
        self.users = Some(users);
        self
    }

    /// Parse a frame payload. Only a missing, empty, or non-string `type` fails.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let env: Envelope = serde_json::from_slice(payload)
            .map_err(|e| ChatError::Parse(format!("invalid envelope json: {e}")))?;
        if env.kind.is_empty() {
            return Err(ChatError::Parse("envelope type must not be empty".into()));
        }
        Ok(env)
    }

    /// Compact JSON with absent fields omitted.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| ChatError::Internal(format!("json encode failed: {e}")))
    }

    /// `text`, or `MissingField` for handlers that need it.
    pub fn require_text(&self) -> Result<&str> {
        self.text.as_deref().ok_or_else(|| self.missing("text"))
    }

    /// `users`, or `MissingField` for handlers that need it.
    pub fn require_users(&self) -> Result<&[String]> {
        self.users.as_deref().ok_or_else(|| self.missing("users"))
    }

    fn missing(&self, field: &'static str) -> ChatError {
        ChatError::MissingField {
            kind: self.kind.clone(),
            field,
        }
    }
}

fn de_kind<'de, D>(d: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!(
            "type must be a string, got {other}"
        ))),
    }
}

fn lenient<'de, D, T>(d: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(d)?;
    Ok(serde_json::from_value(v).ok())
}

fn de_users<'de, D>(d: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        )),
        _ => Ok(None),
    }
}
