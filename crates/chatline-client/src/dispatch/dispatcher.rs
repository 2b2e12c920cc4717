use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use chatline_core::error::Result;
use chatline_core::protocol::Envelope;

use crate::events::EventSink;
use crate::history::ChatLog;

/// Handler for one envelope type tag.
///
/// Returning an error (typically `MissingField`) makes the dispatcher render
/// the raw payload as an `[unknown]` line instead.
#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn handle(&self, ctx: &DispatchCtx, env: Envelope) -> Result<()>;
}

/// Per-connection context passed to handlers.
#[derive(Clone)]
pub struct DispatchCtx {
    events: EventSink,
    log: Arc<dyn ChatLog>,
}

impl DispatchCtx {
    pub fn new(events: EventSink, log: Arc<dyn ChatLog>) -> Self {
        Self { events, log }
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Show a chat line and append it to the log.
    pub async fn display(&self, line: String) {
        self.log.append(&line).await;
        self.events.line(line);
    }
}

/// Registry and router for envelope handlers, keyed by type tag.
#[derive(Default)]
pub struct Dispatcher {
    handlers: DashMap<&'static str, Arc<dyn EnvelopeHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn register(&self, handler: Arc<dyn EnvelopeHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn registered_kinds(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }

    /// Parse and route one frame payload. Never fails: anything that cannot be
    /// handled becomes an `[unknown] <raw>` line.
    pub async fn dispatch(&self, ctx: &DispatchCtx, payload: Bytes) {
        let env = match Envelope::parse(&payload) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(code = e.code().as_str(), err = %e, "dropping malformed frame");
                fallback(ctx, &payload);
                return;
            }
        };

        let handler = self
            .handlers
            .get(env.kind.as_str())
            .map(|e| Arc::clone(e.value()));
        let Some(handler) = handler else {
            tracing::debug!(kind = %env.kind, "no handler for envelope type");
            fallback(ctx, &payload);
            return;
        };

        let kind = handler.kind();
        if let Err(e) = handler.handle(ctx, env).await {
            tracing::debug!(kind, err = %e, "handler rejected envelope");
            fallback(ctx, &payload);
        }
    }
}

fn fallback(ctx: &DispatchCtx, raw: &[u8]) {
    ctx.events()
        .line(format!("[unknown] {}", String::from_utf8_lossy(raw)));
}
