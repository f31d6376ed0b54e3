//! Push channel: connection lifecycle and typed update events.
//!
//! SYSTEM CONTEXT
//! ==============
//! The channel owns at most one `Subscription` to a `PushTransport`. The
//! subscription is the listener set: every inbound signal flows through it,
//! and dropping it deregisters everything before the socket closes. Because
//! `disconnect` always drops the old subscription before `connect` opens a
//! new one, a reconnect can never leave two listener sets delivering the
//! same server event.
//!
//! STATE MACHINE
//! =============
//! `Disconnected -> Connecting -> Connected -> Disconnected -> Connecting ...`
//! Automatic reconnects after a network loss are the transport's job; the
//! channel just follows its signals. `is_initializing` rejects re-entrant
//! `connect` calls while an attempt is still in progress.

#[cfg(test)]
#[path = "push_test.rs"]
mod push_test;

use std::rc::Rc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::types::PushEvent;

// =============================================================================
// TRANSPORT SEAM
// =============================================================================

/// Raw signal from a transport.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportSignal {
    /// A (re)connection attempt started.
    Connecting,
    Connected,
    Disconnected,
    Event { name: String, payload: Value },
}

/// Live registration with a transport. Dropping it stops delivery and
/// aborts the transport task, if any.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<TransportSignal>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    #[must_use]
    pub fn new(rx: mpsc::UnboundedReceiver<TransportSignal>, task: Option<JoinHandle<()>>) -> Self {
        Self { rx, task }
    }

    /// Next signal, or `None` once the transport side has gone away.
    pub async fn recv(&mut self) -> Option<TransportSignal> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Opens push subscriptions. Implementations reconnect on their own after a
/// network loss and report it through `Disconnected` / `Connecting` /
/// `Connected` signals.
pub trait PushTransport {
    fn open(&self, url: &str) -> Subscription;
}

// =============================================================================
// CHANNEL
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// What the channel reports to the driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushSignal {
    /// Status indicator change. Only emitted when the value actually flips.
    Status { connected: bool },
    Event(PushEvent),
}

pub struct PushChannel {
    transport: Rc<dyn PushTransport>,
    state: ConnectionState,
    is_initializing: bool,
    subscription: Option<Subscription>,
    /// Whether the status indicator currently shows "connected".
    indicator: bool,
}

impl PushChannel {
    #[must_use]
    pub fn new(transport: Rc<dyn PushTransport>) -> Self {
        Self { transport, state: ConnectionState::Disconnected, is_initializing: false, subscription: None, indicator: false }
    }

    /// Open a subscription to `url`.
    ///
    /// Returns `false` without doing anything when an attempt is already in
    /// progress or a subscription already exists.
    pub fn connect(&mut self, url: &str) -> bool {
        if self.is_initializing || self.subscription.is_some() {
            debug!(url, "push connect ignored; channel already active");
            return false;
        }
        info!(url, "push channel connecting");
        self.is_initializing = true;
        self.state = ConnectionState::Connecting;
        self.subscription = Some(self.transport.open(url));
        true
    }

    /// Deregister listeners, then close.
    ///
    /// Returns a status signal when the indicator flips to disconnected.
    pub fn disconnect(&mut self) -> Option<PushSignal> {
        if let Some(subscription) = self.subscription.take() {
            drop(subscription);
            info!("push channel disconnected");
        }
        self.is_initializing = false;
        self.apply(ConnectionState::Disconnected)
    }

    /// Tear down any existing subscription and open a fresh one.
    pub fn reconnect(&mut self, url: &str) -> Option<PushSignal> {
        let status = self.disconnect();
        self.connect(url);
        status
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.is_initializing
    }

    /// Whether a listener set is registered.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next signal worth reporting.
    ///
    /// Returns `None` when there is no subscription, or when the transport
    /// ended and the indicator already showed disconnected. Unknown events
    /// are dropped here.
    pub async fn next_signal(&mut self) -> Option<PushSignal> {
        loop {
            let subscription = self.subscription.as_mut()?;
            let Some(signal) = subscription.recv().await else {
                self.subscription = None;
                self.is_initializing = false;
                return self.apply(ConnectionState::Disconnected);
            };

            let reported = match signal {
                TransportSignal::Connecting => self.apply(ConnectionState::Connecting),
                TransportSignal::Connected => {
                    self.is_initializing = false;
                    self.apply(ConnectionState::Connected)
                }
                TransportSignal::Disconnected => {
                    self.is_initializing = false;
                    self.apply(ConnectionState::Disconnected)
                }
                TransportSignal::Event { name, payload } => {
                    let event = PushEvent::from_wire(&name, &payload);
                    if event.is_none() {
                        debug!(event = %name, "ignoring unrecognized push event");
                    }
                    event.map(PushSignal::Event)
                }
            };
            if reported.is_some() {
                return reported;
            }
        }
    }

    /// Move to `next`, returning a status signal if the indicator flips.
    fn apply(&mut self, next: ConnectionState) -> Option<PushSignal> {
        self.state = next;
        let connected = match next {
            ConnectionState::Connected => true,
            ConnectionState::Disconnected => false,
            ConnectionState::Connecting => return None,
        };
        if connected == self.indicator {
            return None;
        }
        self.indicator = connected;
        Some(PushSignal::Status { connected })
    }
}
