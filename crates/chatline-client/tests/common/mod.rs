//! Helpers shared by client integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use chatline_client::history::ChatLog;
use chatline_client::transport::codec::read_frame;
use chatline_client::{ConnectionState, UiEvent};
use chatline_core::protocol::{encode_frame, Envelope, FrameRead};

pub const WAIT: Duration = Duration::from_secs(5);

/// Chat log that keeps lines in memory.
#[derive(Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatLog for MemoryLog {
    async fn append(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_owned());
    }
}

pub fn memory_log() -> Arc<MemoryLog> {
    Arc::new(MemoryLog::default())
}

/// Loopback listener standing in for the chat server.
pub async fn listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

pub async fn accept(listener: &TcpListener) -> TcpStream {
    let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    stream
}

/// Next envelope from the peer, `None` on end of stream.
pub async fn recv_envelope<R: AsyncRead + Unpin>(r: &mut R) -> Option<Envelope> {
    match timeout(WAIT, read_frame(r, 1 << 20)).await.unwrap().unwrap() {
        FrameRead::Frame(payload) => Some(Envelope::parse(&payload).unwrap()),
        FrameRead::EndOfStream => None,
    }
}

pub async fn send_raw<W: AsyncWrite + Unpin>(w: &mut W, payload: &[u8]) {
    w.write_all(&encode_frame(payload).unwrap()).await.unwrap();
    w.flush().await.unwrap();
}

pub async fn send_envelope<W: AsyncWrite + Unpin>(w: &mut W, env: &Envelope) {
    send_raw(w, &env.to_payload().unwrap()).await;
}

pub async fn next_event(rx: &mut UnboundedReceiver<UiEvent>) -> UiEvent {
    timeout(WAIT, rx.recv()).await.unwrap().expect("event channel closed")
}

/// Skip events until the next chat line.
pub async fn next_line(rx: &mut UnboundedReceiver<UiEvent>) -> String {
    loop {
        if let UiEvent::ChatLine(line) = next_event(rx).await {
            return line;
        }
    }
}

/// Skip events until `state` is reported.
pub async fn wait_state(rx: &mut UnboundedReceiver<UiEvent>, state: ConnectionState) {
    loop {
        if next_event(rx).await == UiEvent::State(state) {
            return;
        }
    }
}
