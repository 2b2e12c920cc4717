use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use chatline_core::error::Result;
use chatline_core::protocol::{kind, Envelope};

use crate::dispatch::{DispatchCtx, EnvelopeHandler};
use crate::events::UiEvent;

/// `typing`: show the indicator, clear it after `clear_after` unless a newer
/// indicator arrived in the meantime.
pub struct TypingHandler {
    clear_after: Duration,
    generation: Arc<AtomicU64>,
}

impl TypingHandler {
    pub fn new(clear_after: Duration) -> Self {
        Self {
            clear_after,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for TypingHandler {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

#[async_trait]
impl EnvelopeHandler for TypingHandler {
    fn kind(&self) -> &'static str {
        kind::TYPING
    }

    async fn handle(&self, ctx: &DispatchCtx, env: Envelope) -> Result<()> {
        let text = env.require_text()?.to_owned();
        let shown = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        ctx.events().emit(UiEvent::TypingShown(text));

        let generation = Arc::clone(&self.generation);
        let events = ctx.events().clone();
        let delay = self.clear_after;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // superseded indicators own their own clear
            if generation.load(Ordering::SeqCst) == shown {
                events.emit(UiEvent::TypingCleared);
            }
        });
        Ok(())
    }
}
