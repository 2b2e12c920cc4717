//! One client connection: write gate, idempotent close, and the read loop.
//!
//! The write side sits behind a single-slot async mutex so concurrent senders
//! (user text, typing hints, the leave notice) never interleave frames. The
//! read side is handed out once as a [`FrameReader`] and consumed by exactly
//! one [`run_read_loop`] task.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use chatline_core::error::{ChatError, Result};
use chatline_core::protocol::{encode_frame, Envelope, FrameRead};

use crate::dispatch::{DispatchCtx, Dispatcher};
use crate::transport::codec;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Knobs for opening a connection.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// `None` leaves the attempt bounded only by the OS.
    pub connect_timeout: Option<Duration>,
    /// Inbound frames above this size end the read loop.
    pub max_frame_bytes: usize,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

/// Write half of a connection plus the gate that serializes senders.
///
/// `closing` fires when [`Connection::close`] starts, so a send stuck behind a
/// peer that stopped reading gives up the gate instead of holding it forever.
pub struct Connection {
    peer: String,
    gate: Mutex<Option<BoxedWriter>>,
    closing: CancellationToken,
}

/// Read half of a connection. Owned by the read loop.
pub struct FrameReader {
    inner: BoxedReader,
    max_frame_bytes: usize,
}

impl FrameReader {
    pub async fn next_frame(&mut self) -> io::Result<FrameRead> {
        codec::read_frame(&mut self.inner, self.max_frame_bytes).await
    }
}

impl Connection {
    /// Open a TCP connection. One attempt, no retry.
    pub async fn connect(
        host: &str,
        port: u16,
        opts: &ConnectOptions,
    ) -> Result<(Self, FrameReader)> {
        let attempt = TcpStream::connect((host, port));
        let stream = match opts.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, attempt).await.map_err(|_| {
                ChatError::Connect(format!("timed out after {}ms", limit.as_millis()))
            })?,
            None => attempt.await,
        }
        .map_err(|e| ChatError::Connect(format!("{host}:{port}: {e}")))?;

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(err = %e, "set_nodelay failed");
        }
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| format!("{host}:{port}"));

        Ok(Self::from_stream(peer, stream, opts.max_frame_bytes))
    }

    /// Wrap an already-open byte stream (used by tests with in-memory pipes).
    pub fn from_stream<S>(
        peer: impl Into<String>,
        stream: S,
        max_frame_bytes: usize,
    ) -> (Self, FrameReader)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (r, w) = tokio::io::split(stream);
        let conn = Self {
            peer: peer.into(),
            gate: Mutex::new(Some(Box::new(w))),
            closing: CancellationToken::new(),
        };
        let reader = FrameReader {
            inner: Box::new(r),
            max_frame_bytes,
        };
        (conn, reader)
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Serialize, frame, and write one envelope.
    ///
    /// Waiting for the gate and the write itself both stop once [`close`]
    /// begins. A failed write leaves the connection as is; closing is the
    /// caller's call.
    ///
    /// [`close`]: Connection::close
    pub async fn send_envelope(&self, env: &Envelope) -> Result<()> {
        let payload = env.to_payload()?;
        let frame = encode_frame(&payload)?;

        let mut gate = tokio::select! {
            biased;
            _ = self.closing.cancelled() => return Err(ChatError::NotConnected),
            gate = self.gate.lock() => gate,
        };
        let writer = gate.as_mut().ok_or(ChatError::NotConnected)?;
        tokio::select! {
            biased;
            _ = self.closing.cancelled() => {
                return Err(ChatError::Send("connection closed during write".into()));
            }
            res = codec::write_frame(writer, &frame) => {
                res.map_err(|e| ChatError::Send(e.to_string()))?;
            }
        }

        tracing::trace!(peer = %self.peer, kind = %env.kind, len = frame.len(), "frame sent");
        Ok(())
    }

    /// Release the write half. Safe to call repeatedly and while a send is
    /// blocked on a peer that stopped reading.
    pub async fn close(&self) {
        self.closing.cancel();
        let writer = self.gate.lock().await.take();
        let Some(mut writer) = writer else {
            return;
        };
        // shutdown may also stall behind unsent bytes; dropping closes anyway
        match tokio::time::timeout(SHUTDOWN_GRACE, writer.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(peer = %self.peer, err = %e, "shutdown on close failed");
            }
            Err(_) => tracing::debug!(peer = %self.peer, "shutdown on close timed out"),
        }
        tracing::debug!(peer = %self.peer, "connection closed");
    }

    pub async fn is_open(&self) -> bool {
        self.gate.lock().await.is_some()
    }
}

/// Why the read loop stopped.
#[derive(Debug)]
pub enum ReadLoopExit {
    /// The cancellation token fired. Not an error.
    Cancelled,
    /// Peer closed the stream or sent a non-positive length.
    EndOfStream,
    /// Transport error or oversized frame.
    Failed(io::Error),
}

/// Decode and dispatch frames until cancellation or end of stream.
///
/// Parse problems are contained in the dispatcher; only transport-level
/// failures end the loop.
pub async fn run_read_loop(
    mut reader: FrameReader,
    cancel: CancellationToken,
    dispatcher: Arc<Dispatcher>,
    ctx: DispatchCtx,
) -> ReadLoopExit {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ReadLoopExit::Cancelled,
            next = reader.next_frame() => next,
        };

        match next {
            Ok(FrameRead::Frame(payload)) => {
                tracing::trace!(len = payload.len(), "frame received");
                dispatcher.dispatch(&ctx, payload).await;
            }
            Ok(FrameRead::EndOfStream) => return ReadLoopExit::EndOfStream,
            Err(e) => return ReadLoopExit::Failed(e),
        }
    }
}
