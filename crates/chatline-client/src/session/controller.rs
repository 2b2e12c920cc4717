//! Session controller: the only place connection state changes.
//!
//! One [`ActiveSession`] (connection + cancellation token + reader handle)
//! exists per successful connect. It lives in a single slot and is taken out
//! atomically at teardown; whoever takes it runs the teardown, so cleanup
//! happens exactly once whether the user disconnects or the read loop dies.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use chatline_core::error::{ChatError, Result};
use chatline_core::protocol::Envelope;

use crate::app_state::AppState;
use crate::dispatch::DispatchCtx;
use crate::events::{EventSink, UiEvent};
use crate::session::command::{parse_address, parse_outgoing, Outgoing, PM_USAGE};
use crate::session::state::ConnectionState;
use crate::session::throttle::Throttle;
use crate::transport::{run_read_loop, Connection, FrameReader, ReadLoopExit};

/// How long `disconnect` waits to get `leave` onto the wire.
const LEAVE_GRACE: Duration = Duration::from_millis(500);

struct ActiveSession {
    id: u64,
    username: String,
    conn: Arc<Connection>,
    cancel: CancellationToken,
    reader: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Slot {
    state: ConnectionState,
    next_id: u64,
    /// Token of an in-flight connect attempt.
    pending: Option<CancellationToken>,
    active: Option<ActiveSession>,
}

struct Inner {
    app: AppState,
    events: EventSink,
    slot: Mutex<Slot>,
    typing: Mutex<Throttle>,
}

/// Command surface used by the presentation layer.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

impl SessionController {
    pub fn new(app: AppState, events: EventSink) -> Self {
        let typing = Throttle::new(app.cfg().client.typing_throttle());
        Self {
            inner: Arc::new(Inner {
                app,
                events,
                slot: Mutex::new(Slot::default()),
                typing: Mutex::new(typing),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.slot().state
    }

    /// Username of the active session.
    pub fn username(&self) -> Option<String> {
        self.inner
            .slot()
            .active
            .as_ref()
            .map(|s| s.username.clone())
    }

    /// Connect, announce with `join`, and start the read loop.
    ///
    /// Input is validated before any I/O. Failures leave the controller
    /// `Disconnected` and ready for another attempt.
    pub async fn connect(&self, address: &str, username: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChatError::BlankUsername);
        }
        let (host, port) = parse_address(address)?;

        let cancel = CancellationToken::new();
        {
            let mut slot = self.inner.slot();
            if slot.state != ConnectionState::Disconnected {
                return Err(ChatError::AlreadyConnected);
            }
            slot.pending = Some(cancel.clone());
            self.inner.set_state(&mut slot, ConnectionState::Connecting);
        }

        tracing::info!(%host, port, user = %username, "connecting");
        let opts = self.inner.app.connect_options();
        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChatError::Connect("cancelled".into())),
            res = Connection::connect(&host, port, &opts) => res,
        };
        let (conn, reader) = match attempt {
            Ok(pair) => pair,
            Err(e) => return Err(self.inner.abort_connect(e)),
        };
        let conn = Arc::new(conn);

        if let Err(e) = conn.send_envelope(&Envelope::join(username, now_unix())).await {
            conn.close().await;
            return Err(self
                .inner
                .abort_connect(ChatError::Connect(format!("join failed: {e}"))));
        }

        let id = {
            let mut slot = self.inner.slot();
            slot.pending = None;
            if cancel.is_cancelled() {
                self.inner.set_state(&mut slot, ConnectionState::Disconnected);
                None
            } else {
                let id = slot.next_id;
                slot.next_id += 1;
                slot.active = Some(ActiveSession {
                    id,
                    username: username.to_owned(),
                    conn: Arc::clone(&conn),
                    cancel: cancel.clone(),
                    reader: None,
                });
                self.inner.set_state(&mut slot, ConnectionState::Connected);
                Some(id)
            }
        };
        let Some(id) = id else {
            conn.close().await;
            return Err(ChatError::Connect("cancelled".into()));
        };

        self.inner.typing_throttle().reset();
        tracing::info!(peer = %conn.peer(), user = %username, session = id, "connected");
        self.inner.events.system("Connected");

        let handle = tokio::spawn(Arc::clone(&self.inner).run_reader(id, reader, cancel));
        {
            let mut slot = self.inner.slot();
            match slot.active.as_mut() {
                Some(active) if active.id == id => active.reader = Some(handle),
                // already torn down; the task finishes on its own
                _ => drop(handle),
            }
        }
        Ok(())
    }

    /// Send user input: `/w <user> <message>` becomes a `pm`, anything else a `msg`.
    ///
    /// Does nothing when disconnected or when `text` is blank.
    pub async fn send(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let Some((conn, username)) = self.inner.current() else {
            return Ok(());
        };

        let env = match parse_outgoing(text) {
            Outgoing::Public(body) => Envelope::msg(&username, body, now_unix()),
            Outgoing::Private { to, text } => Envelope::pm(&username, to, text, now_unix()),
            Outgoing::PrivateUsage => {
                self.inner.events.system(PM_USAGE);
                return Ok(());
            }
        };
        self.inner.deliver(&conn, env).await
    }

    /// Send a `pm` to `user`. Blank target or body shows the usage hint.
    pub async fn send_private(&self, user: &str, text: &str) -> Result<()> {
        let Some((conn, username)) = self.inner.current() else {
            return Ok(());
        };
        let (user, text) = (user.trim(), text.trim());
        if user.is_empty() || text.is_empty() {
            self.inner.events.system(PM_USAGE);
            return Ok(());
        }
        self.inner
            .deliver(&conn, Envelope::pm(&username, user, text, now_unix()))
            .await
    }

    /// Best-effort `typing` hint, at most once per throttle window.
    pub async fn notify_typing(&self) {
        let Some((conn, username)) = self.inner.current() else {
            return;
        };
        if !self.inner.typing_throttle().allow(Instant::now()) {
            return;
        }
        let env = Envelope::typing(&username, format!("{username} is typing..."), now_unix());
        if let Err(e) = conn.send_envelope(&env).await {
            tracing::debug!(err = %e, "typing hint not delivered");
        }
    }

    /// Cancel the reader, send a best-effort `leave`, close the transport.
    ///
    /// An active session always ends `Disconnected` before this returns, even
    /// when `leave` cannot be written. A connect attempt still in flight is
    /// cancelled instead; that `connect` call resets the state and reports
    /// the failure.
    pub async fn disconnect(&self) {
        let session = {
            let mut slot = self.inner.slot();
            if let Some(pending) = slot.pending.take() {
                pending.cancel();
            }
            let Some(session) = slot.active.take() else {
                return;
            };
            self.inner.set_state(&mut slot, ConnectionState::Disconnecting);
            session
        };

        session.cancel.cancel();
        let leave = Envelope::leave(&session.username, now_unix());
        match tokio::time::timeout(LEAVE_GRACE, session.conn.send_envelope(&leave)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(session = session.id, err = %e, "leave not delivered"),
            Err(_) => tracing::debug!(session = session.id, "leave timed out on a stalled write"),
        }
        self.inner.teardown(session).await;
        self.inner.events.system("Disconnected");
    }
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn typing_throttle(&self) -> MutexGuard<'_, Throttle> {
        self.typing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, slot: &mut Slot, next: ConnectionState) {
        if slot.state == next {
            return;
        }
        tracing::debug!(from = %slot.state, to = %next, "state transition");
        slot.state = next;
        self.events.emit(UiEvent::State(next));
    }

    /// Connection and username of the active session, when connected.
    fn current(&self) -> Option<(Arc<Connection>, String)> {
        let slot = self.slot();
        if !slot.state.is_connected() {
            return None;
        }
        slot.active
            .as_ref()
            .map(|s| (Arc::clone(&s.conn), s.username.clone()))
    }

    fn abort_connect(&self, err: ChatError) -> ChatError {
        {
            let mut slot = self.slot();
            slot.pending = None;
            self.set_state(&mut slot, ConnectionState::Disconnected);
        }
        tracing::warn!(code = err.code().as_str(), err = %err, "connect failed");
        self.events.system(format!("Could not connect: {err}"));
        err
    }

    /// User-initiated send: failures are shown and returned.
    async fn deliver(&self, conn: &Connection, env: Envelope) -> Result<()> {
        match conn.send_envelope(&env).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(kind = %env.kind, code = e.code().as_str(), err = %e, "send failed");
                let cause = match &e {
                    ChatError::Send(cause) => cause.clone(),
                    other => other.to_string(),
                };
                self.events.system(format!("Send failed: {cause}"));
                Err(e)
            }
        }
    }

    fn take_session(&self, id: u64) -> Option<ActiveSession> {
        let mut slot = self.slot();
        if slot.active.as_ref().map(|s| s.id) != Some(id) {
            return None;
        }
        let session = slot.active.take();
        self.set_state(&mut slot, ConnectionState::Disconnecting);
        session
    }

    /// Final step for every session, whatever ended it.
    async fn teardown(&self, mut session: ActiveSession) {
        session.cancel.cancel();
        session.conn.close().await;
        if let Some(reader) = session.reader.take() {
            if let Err(e) = reader.await {
                tracing::warn!(session = session.id, err = %e, "read loop task failed");
            }
        }

        {
            let mut slot = self.slot();
            self.set_state(&mut slot, ConnectionState::Disconnected);
        }
        self.events.emit(UiEvent::TypingCleared);
        self.events.emit(UiEvent::UserList(Vec::new()));
        tracing::info!(session = session.id, "session closed");
    }

    async fn run_reader(self: Arc<Self>, id: u64, reader: FrameReader, cancel: CancellationToken) {
        let ctx = DispatchCtx::new(self.events.clone(), self.app.log());
        let exit = run_read_loop(reader, cancel, self.app.dispatcher(), ctx).await;

        let lost = match &exit {
            ReadLoopExit::Cancelled => None,
            ReadLoopExit::EndOfStream => Some("server closed the connection".to_owned()),
            ReadLoopExit::Failed(e) => Some(e.to_string()),
        };
        tracing::debug!(session = id, ?exit, "read loop ended");

        // a user disconnect already took the session and owns its teardown
        let Some(mut session) = self.take_session(id) else {
            return;
        };
        // this task is the reader; never await our own handle
        session.reader = None;

        if let Some(cause) = lost {
            self.events.system(format!("Connection lost: {cause}"));
            let err = ChatError::ConnectionLost(cause);
            tracing::warn!(session = id, code = err.code().as_str(), err = %err, "connection lost");
        }
        self.teardown(session).await;
    }
}
