//! Client config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io;

use chatline_core::error::{ChatError, Result};

pub use schema::{ClientConfig, ClientSection, ServerSection, Theme, UiSection};

pub fn load_from_file(path: &str) -> Result<ClientConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ChatError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

/// Like [`load_from_file`], but a missing file yields the defaults.
pub fn load_or_default(path: &str) -> Result<ClientConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ChatError::Config(format!("read config failed: {e}"))),
    }
}

/// Validate and write `cfg` back as YAML, replacing the file.
pub fn save_to_file(path: &str, cfg: &ClientConfig) -> Result<()> {
    cfg.validate()?;
    let s = serde_yaml::to_string(cfg)
        .map_err(|e| ChatError::Config(format!("encode yaml failed: {e}")))?;
    fs::write(path, s).map_err(|e| ChatError::Config(format!("write config failed: {e}")))
}

pub fn load_from_str(s: &str) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_yaml::from_str(s)
        .map_err(|e| ChatError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
