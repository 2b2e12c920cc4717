#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chatline_client::session::{parse_address, parse_outgoing, Outgoing, Throttle};
use chatline_core::error::ChatError;
use tokio::time::Instant;

#[test]
fn plain_text_is_public() {
    assert_eq!(parse_outgoing("hello"), Outgoing::Public("hello"));
    assert_eq!(parse_outgoing("/whisper x"), Outgoing::Public("/whisper x"));
    assert_eq!(parse_outgoing("/w"), Outgoing::Public("/w"));
}

#[test]
fn whisper_splits_target_and_body() {
    assert_eq!(
        parse_outgoing("/w bob hello there"),
        Outgoing::Private {
            to: "bob",
            text: "hello there"
        }
    );
    assert_eq!(
        parse_outgoing("/w  bob   spaced  "),
        Outgoing::Private {
            to: "bob",
            text: "spaced"
        }
    );
}

#[test]
fn whisper_without_body_is_usage() {
    assert_eq!(parse_outgoing("/w bob"), Outgoing::PrivateUsage);
    assert_eq!(parse_outgoing("/w bob   "), Outgoing::PrivateUsage);
    assert_eq!(parse_outgoing("/w "), Outgoing::PrivateUsage);
}

#[test]
fn address_forms() {
    assert_eq!(
        parse_address("127.0.0.1:9000").unwrap(),
        ("127.0.0.1".to_owned(), 9000)
    );
    assert_eq!(
        parse_address(" chat.example.org:65535 ").unwrap(),
        ("chat.example.org".to_owned(), 65535)
    );
    assert_eq!(parse_address("[::1]:9000").unwrap(), ("::1".to_owned(), 9000));
}

#[test]
fn bad_addresses() {
    for addr in ["", "localhost", "localhost:", ":80", "host:0", "host:70000", "host:-1"] {
        assert!(
            matches!(parse_address(addr), Err(ChatError::InvalidAddress(_))),
            "{addr:?}"
        );
    }
}

#[test]
fn throttle_is_leading_edge() {
    let window = Duration::from_secs(1);
    let mut t = Throttle::new(window);
    let t0 = Instant::now();

    assert!(t.allow(t0));
    assert!(!t.allow(t0 + Duration::from_millis(10)));
    assert!(!t.allow(t0 + Duration::from_millis(999)));
    assert!(t.allow(t0 + window));
    assert!(!t.allow(t0 + window + Duration::from_millis(500)));

    t.reset();
    assert!(t.allow(t0 + window + Duration::from_millis(600)));
}
