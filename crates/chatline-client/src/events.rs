//! UI-facing events.
//!
//! Everything the presentation layer needs to render arrives on one channel
//! consumed by a single subscriber, so no UI state is mutated off that context.

use tokio::sync::mpsc;

use crate::session::ConnectionState;

/// One presentation update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A formatted line for the chat view (also what gets logged).
    ChatLine(String),
    /// Show the typing indicator with this text.
    TypingShown(String),
    /// Clear the typing indicator.
    TypingCleared,
    /// Replace the whole user list.
    UserList(Vec<String>),
    /// Connection state transition.
    State(ConnectionState),
}

/// Sending side of the UI event channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event. A dropped subscriber is not an error.
    pub fn emit(&self, ev: UiEvent) {
        if self.tx.send(ev).is_err() {
            tracing::trace!("ui subscriber gone; event dropped");
        }
    }

    pub fn line(&self, line: impl Into<String>) {
        self.emit(UiEvent::ChatLine(line.into()));
    }

    /// `[system] ...` line.
    pub fn system(&self, text: impl AsRef<str>) {
        self.line(format!("[system] {}", text.as_ref()));
    }
}
