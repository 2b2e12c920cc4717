//! Shared application state for the chatline client.
//!
//! Wires the config, the dispatcher with its built-in handlers, and the chat
//! log collaborator. Cheap to clone; every session borrows from it.

use std::sync::Arc;

use chatline_core::error::Result;
use chatline_core::protocol::kind;

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::history::{ChatLog, FileChatLog, NullChatLog};
use crate::services::{ChatHandler, PrivateHandler, SystemHandler, TypingHandler, UserListHandler};
use crate::transport::ConnectOptions;

/// Server-to-client types that must have a handler.
const CONSUMED_KINDS: [&str; 5] = [kind::MSG, kind::PM, kind::SYS, kind::TYPING, kind::USERLIST];

#[derive(Clone)]
pub struct AppState {
    cfg: Arc<ClientConfig>,
    dispatcher: Arc<Dispatcher>,
    log: Arc<dyn ChatLog>,
}

impl AppState {
    /// Build state from config; `client.history_path` selects the file log.
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        let log: Arc<dyn ChatLog> = match cfg.client.history_path.as_deref() {
            Some(path) => Arc::new(FileChatLog::new(path)),
            None => Arc::new(NullChatLog),
        };
        Self::with_log(cfg, log)
    }

    /// Build state with an explicit log sink.
    pub fn with_log(cfg: ClientConfig, log: Arc<dyn ChatLog>) -> Result<Self> {
        cfg.validate()?;

        let dispatcher = Dispatcher::new();
        dispatcher.register(Arc::new(ChatHandler));
        dispatcher.register(Arc::new(PrivateHandler));
        dispatcher.register(Arc::new(SystemHandler));
        dispatcher.register(Arc::new(TypingHandler::new(cfg.client.typing_clear())));
        dispatcher.register(Arc::new(UserListHandler));

        let registered = dispatcher.registered_kinds();
        for k in CONSUMED_KINDS {
            if !registered.contains(&k) {
                tracing::warn!(kind = k, "no handler registered; envelopes will render as unknown");
            }
        }

        Ok(Self {
            cfg: Arc::new(cfg),
            dispatcher: Arc::new(dispatcher),
            log,
        })
    }

    pub fn cfg(&self) -> &ClientConfig {
        &self.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn log(&self) -> Arc<dyn ChatLog> {
        Arc::clone(&self.log)
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: self.cfg.server.connect_timeout(),
            max_frame_bytes: self.cfg.server.max_frame_bytes,
        }
    }
}
