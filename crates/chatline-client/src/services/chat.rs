use async_trait::async_trait;
use chrono::{Local, TimeZone};

use chatline_core::error::Result;
use chatline_core::protocol::{kind, Envelope};

use crate::dispatch::{DispatchCtx, EnvelopeHandler};

/// Sender shown when an envelope carries no `from`.
const DEFAULT_SENDER: &str = "server";
/// Recipient shown when a `pm` carries no `to`.
const DEFAULT_RECIPIENT: &str = "(you)";

/// Local wall-clock `HH:MM:SS` for a Unix timestamp; missing or out-of-range
/// timestamps render as now.
pub fn clock(ts: Option<i64>) -> String {
    ts.and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Local::now)
        .format("%H:%M:%S")
        .to_string()
}

/// `msg`: `[time] from: text`.
#[derive(Default)]
pub struct ChatHandler;

#[async_trait]
impl EnvelopeHandler for ChatHandler {
    fn kind(&self) -> &'static str {
        kind::MSG
    }

    async fn handle(&self, ctx: &DispatchCtx, env: Envelope) -> Result<()> {
        let text = env.require_text()?;
        let from = env.from.as_deref().unwrap_or(DEFAULT_SENDER);
        ctx.display(format!("[{}] {from}: {text}", clock(env.ts))).await;
        Ok(())
    }
}

/// `pm`: `[time] [PM] from -> to: text`.
#[derive(Default)]
pub struct PrivateHandler;

#[async_trait]
impl EnvelopeHandler for PrivateHandler {
    fn kind(&self) -> &'static str {
        kind::PM
    }

    async fn handle(&self, ctx: &DispatchCtx, env: Envelope) -> Result<()> {
        let text = env.require_text()?;
        let from = env.from.as_deref().unwrap_or(DEFAULT_SENDER);
        let to = env.to.as_deref().unwrap_or(DEFAULT_RECIPIENT);
        ctx.display(format!("[{}] [PM] {from} -> {to}: {text}", clock(env.ts))).await;
        Ok(())
    }
}

/// `sys`: `[system] text`.
#[derive(Default)]
pub struct SystemHandler;

#[async_trait]
impl EnvelopeHandler for SystemHandler {
    fn kind(&self) -> &'static str {
        kind::SYS
    }

    async fn handle(&self, ctx: &DispatchCtx, env: Envelope) -> Result<()> {
        let text = env.require_text()?;
        ctx.display(format!("[system] {text}")).await;
        Ok(())
    }
}
