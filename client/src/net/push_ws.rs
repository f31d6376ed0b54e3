//! WebSocket push transport speaking Socket.IO v4.
//!
//! SYSTEM CONTEXT
//! ==============
//! `WsPushTransport::open` spawns one connection task per subscription. The
//! task connects, joins the default namespace, answers pings, and forwards
//! events as `TransportSignal`s. On loss it reports `Disconnected` and
//! reconnects with exponential backoff (1s doubling to 10s). Dropping the
//! `Subscription` aborts the task, which closes the socket.

#[cfg(test)]
#[path = "push_ws_test.rs"]
mod push_ws_test;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::push::{PushTransport, Subscription, TransportSignal};
use super::socketio::{self, Packet, SocketIoError};

const INITIAL_BACKOFF: Duration = Duration::from_millis(1000);
const MAX_BACKOFF: Duration = Duration::from_millis(10_000);

#[derive(Debug, thiserror::Error)]
pub enum PushTransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),
    #[error("server rejected namespace connect: {0}")]
    Rejected(String),
    #[error(transparent)]
    Url(#[from] SocketIoError),
}

impl From<tokio_tungstenite::tungstenite::Error> for PushTransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

/// Production push transport.
#[derive(Clone, Copy, Debug)]
pub struct WsPushTransport {
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for WsPushTransport {
    fn default() -> Self {
        Self { initial_backoff: INITIAL_BACKOFF, max_backoff: MAX_BACKOFF }
    }
}

impl WsPushTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_backoff(initial: Duration, max: Duration) -> Self {
        Self { initial_backoff: initial, max_backoff: max.max(initial) }
    }
}

impl PushTransport for WsPushTransport {
    fn open(&self, url: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(socket_loop(url.to_owned(), tx, *self));
        Subscription::new(rx, Some(task))
    }
}

/// Connection loop with reconnect logic. Exits once the subscription is gone.
async fn socket_loop(url: String, tx: mpsc::UnboundedSender<TransportSignal>, config: WsPushTransport) {
    let ws_url = match socketio::websocket_url(&url) {
        Ok(ws_url) => ws_url,
        Err(e) => {
            warn!(url, error = %e, "push channel cannot start");
            let _ = tx.send(TransportSignal::Disconnected);
            return;
        }
    };

    let mut backoff = config.initial_backoff;
    loop {
        if tx.send(TransportSignal::Connecting).is_err() {
            return;
        }

        match connect_and_run(&ws_url, &tx).await {
            Ok(true) => {
                info!(url = %ws_url, "push socket closed");
                backoff = config.initial_backoff;
            }
            Ok(false) => debug!(url = %ws_url, "push socket closed before namespace connect"),
            Err(e) => warn!(url = %ws_url, error = %e, "push socket error"),
        }

        if tx.send(TransportSignal::Disconnected).is_err() {
            return;
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(config.max_backoff);
    }
}

/// Run one socket until it closes. Returns whether the namespace connected.
async fn connect_and_run(url: &str, tx: &mpsc::UnboundedSender<TransportSignal>) -> Result<bool, PushTransportError> {
    let (stream, _) = connect_async(url).await?;
    let (mut write, mut read) = stream.split();
    let mut connected = false;

    while let Some(message) = read.next().await {
        let text = match message? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let packet = match socketio::decode(text.as_str()) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(error = %e, "ignoring undecodable push frame");
                continue;
            }
        };

        match packet {
            Packet::Open(_) => write.send(Message::Text(socketio::CONNECT.to_owned().into())).await?,
            Packet::Ping => write.send(Message::Text(socketio::PONG.to_owned().into())).await?,
            Packet::Connect(_) => {
                if !connected {
                    connected = true;
                    if tx.send(TransportSignal::Connected).is_err() {
                        return Ok(connected);
                    }
                }
            }
            Packet::Event { name, payload } => {
                // Plain JSON relays never send a namespace ack.
                if !connected {
                    connected = true;
                    if tx.send(TransportSignal::Connected).is_err() {
                        return Ok(connected);
                    }
                }
                if tx.send(TransportSignal::Event { name, payload }).is_err() {
                    return Ok(connected);
                }
            }
            Packet::ConnectError(context) => return Err(PushTransportError::Rejected(context.to_string())),
            Packet::Close | Packet::Disconnect => break,
            Packet::Pong | Packet::Noop => {}
        }
    }

    Ok(connected)
}
