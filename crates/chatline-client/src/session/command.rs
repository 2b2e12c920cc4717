//! Pure parsing for user input: chat text routing and server addresses.

use chatline_core::error::{ChatError, Result};

/// Hint shown when `/w` lacks a target or a body.
pub const PM_USAGE: &str = "PM usage: /w username message";

const PM_PREFIX: &str = "/w ";

/// What a line of user input turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outgoing<'a> {
    /// Plain `msg` to the room.
    Public(&'a str),
    /// `pm` to one user.
    Private { to: &'a str, text: &'a str },
    /// `/w` without both target and body: show [`PM_USAGE`], send nothing.
    PrivateUsage,
}

/// Route already-trimmed input by the `/w <user> <message>` convention.
pub fn parse_outgoing(text: &str) -> Outgoing<'_> {
    let Some(rest) = text.strip_prefix(PM_PREFIX) else {
        return Outgoing::Public(text);
    };
    match rest.trim_start().split_once(' ') {
        Some((to, body)) if !body.trim().is_empty() => Outgoing::Private {
            to,
            text: body.trim(),
        },
        _ => Outgoing::PrivateUsage,
    }
}

/// Split `host:port` (IPv6 hosts may be bracketed). Port 0 is rejected.
pub fn parse_address(address: &str) -> Result<(String, u16)> {
    let address = address.trim();
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| ChatError::InvalidAddress(format!("{address}: expected host:port")))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(ChatError::InvalidAddress(format!("{address}: empty host")));
    }

    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| ChatError::InvalidAddress(format!("{address}: invalid port")))?;

    Ok((host.to_owned(), port))
}
