//! Minimal Socket.IO v4 / Engine.IO v4 text codec.
//!
//! The push server is a Socket.IO server. Over a raw WebSocket the exchange
//! is: server sends Engine.IO `0{..}` (open), client sends `40` (join the
//! default namespace), server acks with `40{..}`, then events arrive as
//! `42["name", payload]`. The server pings with `2`; the client must answer
//! `3` or it gets dropped.
//!
//! Plain JSON frames of the form `{"event": "...", "data": {...}}` decode to
//! the same `Packet::Event`, which keeps the channel usable against a
//! bare WebSocket relay.

#[cfg(test)]
#[path = "socketio_test.rs"]
mod socketio_test;

use serde_json::Value;

/// Namespace connect request for the default namespace.
pub const CONNECT: &str = "40";
/// Engine.IO pong.
pub const PONG: &str = "3";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SocketIoError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet type `{0}`")]
    UnknownType(String),
    #[error("malformed packet: {0}")]
    Malformed(String),
    #[error("invalid push URL: {0}")]
    InvalidUrl(String),
}

/// Decoded inbound packet.
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    /// Engine.IO handshake (`sid`, `pingInterval`, ...).
    Open(Value),
    Close,
    Ping,
    Pong,
    Noop,
    /// Namespace connected.
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, payload: Value },
    ConnectError(Value),
}

/// Decode one text frame.
///
/// # Errors
///
/// Returns an error for empty frames, unknown packet types, and event
/// packets whose body is not `["name", ...]`.
pub fn decode(text: &str) -> Result<Packet, SocketIoError> {
    let text = text.trim();
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Err(SocketIoError::Empty);
    };
    let rest = chars.as_str();

    match kind {
        '{' => decode_plain_json(text),
        '0' => Ok(Packet::Open(parse_optional_json(rest)?.unwrap_or(Value::Null))),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_socket_packet(rest),
        '6' => Ok(Packet::Noop),
        other => Err(SocketIoError::UnknownType(other.to_string())),
    }
}

fn decode_socket_packet(text: &str) -> Result<Packet, SocketIoError> {
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Err(SocketIoError::Malformed("engine message without socket packet".to_owned()));
    };
    let body = strip_namespace(chars.as_str());

    match kind {
        '0' => Ok(Packet::Connect(parse_optional_json(body)?)),
        '1' => Ok(Packet::Disconnect),
        '2' => decode_event(body.trim_start_matches(|c: char| c.is_ascii_digit())),
        '4' => Ok(Packet::ConnectError(parse_optional_json(body)?.unwrap_or(Value::Null))),
        other => Err(SocketIoError::UnknownType(format!("4{other}"))),
    }
}

/// Drop a leading `/namespace,` if present.
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        body.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        body
    }
}

fn decode_event(body: &str) -> Result<Packet, SocketIoError> {
    let value = serde_json::from_str::<Value>(body).map_err(|e| SocketIoError::Malformed(e.to_string()))?;
    let Value::Array(mut items) = value else {
        return Err(SocketIoError::Malformed("event body is not an array".to_owned()));
    };
    if items.is_empty() {
        return Err(SocketIoError::Malformed("event array is empty".to_owned()));
    }
    let Value::String(name) = items.remove(0) else {
        return Err(SocketIoError::Malformed("event name is not a string".to_owned()));
    };
    let payload = if items.is_empty() { Value::Null } else { items.remove(0) };
    Ok(Packet::Event { name, payload })
}

fn decode_plain_json(text: &str) -> Result<Packet, SocketIoError> {
    let value = serde_json::from_str::<Value>(text).map_err(|e| SocketIoError::Malformed(e.to_string()))?;
    let name = value
        .get("event")
        .and_then(Value::as_str)
        .ok_or_else(|| SocketIoError::Malformed("json frame missing `event`".to_owned()))?
        .to_owned();
    let payload = value.get("data").cloned().unwrap_or(Value::Null);
    Ok(Packet::Event { name, payload })
}

fn parse_optional_json(text: &str) -> Result<Option<Value>, SocketIoError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| SocketIoError::Malformed(e.to_string()))
}

/// Build the WebSocket endpoint for a Socket.IO server at `base`.
///
/// `http`/`https` map to `ws`/`wss`; `ws`/`wss` are kept.
///
/// # Errors
///
/// Returns `InvalidUrl` when `base` does not parse or uses another scheme.
pub fn websocket_url(base: &str) -> Result<String, SocketIoError> {
    let mut url = url::Url::parse(base).map_err(|e| SocketIoError::InvalidUrl(format!("{base}: {e}")))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(SocketIoError::InvalidUrl(format!("unsupported scheme `{other}`"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| SocketIoError::InvalidUrl(format!("cannot use scheme `{scheme}` for {base}")))?;
    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url.to_string())
}
