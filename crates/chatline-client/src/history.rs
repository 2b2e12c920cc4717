//! Chat log collaborator: append-only line sink plus startup replay.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use chatline_core::error::{ChatError, Result};

/// Consumes one formatted line per displayed msg/pm/sys event.
#[async_trait]
pub trait ChatLog: Send + Sync {
    async fn append(&self, line: &str);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullChatLog;

#[async_trait]
impl ChatLog for NullChatLog {
    async fn append(&self, _line: &str) {}
}

/// Appends lines to a text file, creating it on first use.
#[derive(Debug)]
pub struct FileChatLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileChatLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_line(&self, line: &str) -> io::Result<()> {
        let mut slot = self.file.lock().await;
        if slot.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            *slot = Some(file);
        }
        let Some(file) = slot.as_mut() else {
            return Ok(());
        };
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl ChatLog for FileChatLog {
    async fn append(&self, line: &str) {
        if let Err(e) = self.write_line(line).await {
            tracing::warn!(path = %self.path.display(), err = %e, "chat log append failed");
        }
    }
}

/// Prior log lines for replay. A missing file is an empty history.
pub async fn load_history(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    match fs::read_to_string(path).await {
        Ok(s) => Ok(s.lines().map(str::to_owned).collect()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(ChatError::Internal(format!(
            "read history {} failed: {e}",
            path.display()
        ))),
    }
}
