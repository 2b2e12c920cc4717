use async_trait::async_trait;

use chatline_core::error::Result;
use chatline_core::protocol::{kind, Envelope};

use crate::dispatch::{DispatchCtx, EnvelopeHandler};
use crate::events::UiEvent;

/// `userlist`: replace the whole list (non-string entries were dropped at parse).
#[derive(Default)]
pub struct UserListHandler;

#[async_trait]
impl EnvelopeHandler for UserListHandler {
    fn kind(&self) -> &'static str {
        kind::USERLIST
    }

    async fn handle(&self, ctx: &DispatchCtx, env: Envelope) -> Result<()> {
        let users = env.require_users()?.to_vec();
        tracing::debug!(count = users.len(), "user list replaced");
        ctx.events().emit(UiEvent::UserList(users));
        Ok(())
    }
}
