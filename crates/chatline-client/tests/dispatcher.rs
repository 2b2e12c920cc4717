//! Dispatcher routing and built-in handler output.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

use chatline_client::config::ClientConfig;
use chatline_client::dispatch::{DispatchCtx, Dispatcher};
use chatline_client::services::chat::clock;
use chatline_client::{AppState, EventSink, UiEvent};
use chatline_core::protocol::Envelope;

use common::{memory_log, MemoryLog};

struct Harness {
    dispatcher: Arc<Dispatcher>,
    ctx: DispatchCtx,
    rx: UnboundedReceiver<UiEvent>,
    log: Arc<MemoryLog>,
}

impl Harness {
    fn new() -> Self {
        let log = memory_log();
        let app = AppState::with_log(ClientConfig::default(), log.clone()).unwrap();
        let (events, rx) = EventSink::channel();
        Self {
            dispatcher: app.dispatcher(),
            ctx: DispatchCtx::new(events, app.log()),
            rx,
            log,
        }
    }

    async fn feed(&self, raw: &str) {
        self.dispatcher
            .dispatch(&self.ctx, Bytes::copy_from_slice(raw.as_bytes()))
            .await;
    }

    async fn feed_env(&self, env: Envelope) {
        self.dispatcher
            .dispatch(&self.ctx, Bytes::from(env.to_payload().unwrap()))
            .await;
    }

    fn next(&mut self) -> UiEvent {
        self.rx.try_recv().expect("event expected")
    }

    fn line(&mut self) -> String {
        match self.next() {
            UiEvent::ChatLine(line) => line,
            other => panic!("expected chat line, got {other:?}"),
        }
    }
}

#[test]
fn builtin_handlers_are_registered() {
    let app = AppState::with_log(ClientConfig::default(), memory_log()).unwrap();
    let mut kinds = app.dispatcher().registered_kinds();
    kinds.sort_unstable();
    assert_eq!(kinds, vec!["msg", "pm", "sys", "typing", "userlist"]);
}

#[tokio::test]
async fn msg_renders_time_sender_and_text() {
    let mut h = Harness::new();
    h.feed_env(Envelope::msg("alice", "hello", 1_700_000_000)).await;

    let expected = format!("[{}] alice: hello", clock(Some(1_700_000_000)));
    assert_eq!(h.line(), expected);
    assert_eq!(h.log.lines(), vec![expected]);
}

#[tokio::test]
async fn msg_without_sender_is_from_server() {
    let mut h = Harness::new();
    h.feed(r#"{"type":"msg","text":"maintenance at noon","ts":1700000000}"#).await;
    assert!(h.line().ends_with("] server: maintenance at noon"));
}

#[tokio::test]
async fn pm_renders_direction_and_defaults_recipient() {
    let mut h = Harness::new();
    h.feed_env(Envelope::pm("bob", "alice", "psst", 1_700_000_000)).await;
    assert_eq!(
        h.line(),
        format!("[{}] [PM] bob -> alice: psst", clock(Some(1_700_000_000)))
    );

    h.feed(r#"{"type":"pm","from":"bob","text":"to you","ts":1700000000}"#).await;
    assert!(h.line().ends_with("[PM] bob -> (you): to you"));
    assert_eq!(h.log.lines().len(), 2);
}

#[tokio::test]
async fn sys_renders_system_line() {
    let mut h = Harness::new();
    h.feed(r#"{"type":"sys","text":"carol joined"}"#).await;
    assert_eq!(h.line(), "[system] carol joined");
    assert_eq!(h.log.lines(), vec!["[system] carol joined"]);
}

#[tokio::test]
async fn missing_or_malformed_ts_uses_local_now() {
    let mut h = Harness::new();
    for raw in [
        r#"{"type":"msg","from":"bob","text":"hi"}"#,
        r#"{"type":"msg","from":"bob","text":"hi","ts":"noon"}"#,
        r#"{"type":"msg","from":"bob","text":"hi","ts":12.5}"#,
    ] {
        let before = clock(None);
        h.feed(raw).await;
        let line = h.line();
        let after = clock(None);
        assert!(
            line == format!("[{before}] bob: hi") || line == format!("[{after}] bob: hi"),
            "raw={raw} line={line}"
        );
    }
}

#[tokio::test]
async fn unknown_type_falls_back_to_raw_line() {
    let mut h = Harness::new();
    let raw = r#"{"type":"nonsense","payload":[1,2,3]}"#;
    h.feed(raw).await;
    assert_eq!(h.line(), format!("[unknown] {raw}"));
    assert!(h.log.lines().is_empty());
}

#[tokio::test]
async fn missing_expected_field_falls_back_to_raw_line() {
    let mut h = Harness::new();
    for raw in [
        r#"{"type":"msg","from":"bob"}"#,
        r#"{"type":"sys"}"#,
        r#"{"type":"userlist","users":"everyone"}"#,
        r#"{"type":"typing","from":"bob"}"#,
    ] {
        h.feed(raw).await;
        assert_eq!(h.line(), format!("[unknown] {raw}"));
    }
}

#[tokio::test]
async fn unparsable_payload_falls_back_to_raw_line() {
    let mut h = Harness::new();
    h.feed(r#"{"text":"no type"}"#).await;
    assert_eq!(h.line(), r#"[unknown] {"text":"no type"}"#);
    h.feed("[1,2,3]").await;
    assert_eq!(h.line(), "[unknown] [1,2,3]");
}

#[tokio::test]
async fn userlist_replaces_whole_list() {
    let mut h = Harness::new();
    h.feed(r#"{"type":"userlist","users":["alice",3,"bob",{"x":1}]}"#).await;
    assert_eq!(h.next(), UiEvent::UserList(vec!["alice".into(), "bob".into()]));

    h.feed(r#"{"type":"userlist","users":[]}"#).await;
    assert_eq!(h.next(), UiEvent::UserList(Vec::new()));
}

#[tokio::test(start_paused = true)]
async fn typing_indicator_clears_unless_superseded() {
    let mut h = Harness::new();
    h.feed_env(Envelope::typing("bob", "bob is typing...", 1)).await;
    assert_eq!(h.next(), UiEvent::TypingShown("bob is typing...".into()));

    tokio::time::sleep(Duration::from_secs(2)).await;
    h.feed_env(Envelope::typing("carol", "carol is typing...", 2)).await;
    assert_eq!(h.next(), UiEvent::TypingShown("carol is typing...".into()));

    // bob's clear is due at 3s but carol's indicator superseded it
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(h.rx.try_recv(), Err(TryRecvError::Empty));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.next(), UiEvent::TypingCleared);
    assert!(h.log.lines().is_empty());
}
