use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chatline_core::error::{ChatError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub ui: UiSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            client: ClientSection::default(),
            ui: UiSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.client.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            connect_timeout_ms: None,
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.address.rsplit_once(':').is_none() {
            return Err(ChatError::Config(
                "server.address must be host:port".into(),
            ));
        }
        if let Some(ms) = self.connect_timeout_ms {
            if !(100..=120000).contains(&ms) {
                return Err(ChatError::Config(
                    "server.connect_timeout_ms must be between 100 and 120000".into(),
                ));
            }
        }
        if !(64..=16 * 1024 * 1024).contains(&self.max_frame_bytes) {
            return Err(ChatError::Config(
                "server.max_frame_bytes must be between 64 and 16777216".into(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default = "default_typing_throttle_ms")]
    pub typing_throttle_ms: u64,

    #[serde(default = "default_typing_clear_ms")]
    pub typing_clear_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<String>,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            username: None,
            typing_throttle_ms: default_typing_throttle_ms(),
            typing_clear_ms: default_typing_clear_ms(),
            history_path: None,
        }
    }
}

impl ClientSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=10000).contains(&self.typing_throttle_ms) {
            return Err(ChatError::Config(
                "client.typing_throttle_ms must be between 100 and 10000".into(),
            ));
        }
        if !(500..=60000).contains(&self.typing_clear_ms) {
            return Err(ChatError::Config(
                "client.typing_clear_ms must be between 500 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn typing_throttle(&self) -> Duration {
        Duration::from_millis(self.typing_throttle_ms)
    }

    pub fn typing_clear(&self) -> Duration {
        Duration::from_millis(self.typing_clear_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UiSection {
    #[serde(default)]
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ChatError::Config(format!(
                "unknown theme `{other}` (expected light or dark)"
            ))),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:9000".into()
}
fn default_max_frame_bytes() -> usize {
    1024 * 1024
}
fn default_typing_throttle_ms() -> u64 {
    1000
}
fn default_typing_clear_ms() -> u64 {
    3000
}
