use super::*;
use crate::net::types::{DisasterId, PushEventKind};
use crate::testing::FakePushTransport;
use serde_json::json;

const URL: &str = "https://relief.example";

fn channel() -> (PushChannel, Rc<FakePushTransport>) {
    let transport = FakePushTransport::new();
    (PushChannel::new(transport.clone()), transport)
}

fn disaster_event(id: &str) -> TransportSignal {
    TransportSignal::Event { name: "disaster_updated".to_owned(), payload: json!({ "disasterId": id }) }
}

// =============================================================
// Lifecycle
// =============================================================

#[test]
fn connect_opens_one_subscription_and_enters_connecting() {
    let (mut channel, transport) = channel();
    assert!(channel.connect(URL));
    assert_eq!(channel.state(), ConnectionState::Connecting);
    assert!(channel.is_initializing());
    assert_eq!(transport.open_count(), 1);
    assert_eq!(transport.url(0).as_deref(), Some(URL));
}

#[test]
fn connect_is_rejected_while_initializing() {
    let (mut channel, transport) = channel();
    assert!(channel.connect(URL));
    assert!(!channel.connect(URL));
    assert_eq!(transport.open_count(), 1);
}

#[tokio::test]
async fn connect_is_rejected_while_a_subscription_exists() {
    let (mut channel, transport) = channel();
    channel.connect(URL);
    transport.emit(0, TransportSignal::Connected);
    assert_eq!(channel.next_signal().await, Some(PushSignal::Status { connected: true }));
    assert!(!channel.is_initializing());

    assert!(!channel.connect(URL));
    assert_eq!(transport.open_count(), 1);
}

#[tokio::test]
async fn disconnect_deregisters_before_reporting() {
    let (mut channel, transport) = channel();
    channel.connect(URL);
    transport.emit(0, TransportSignal::Connected);
    channel.next_signal().await;

    assert_eq!(channel.disconnect(), Some(PushSignal::Status { connected: false }));
    assert_eq!(channel.state(), ConnectionState::Disconnected);
    assert!(!channel.is_subscribed());
    assert_eq!(transport.active_count(), 0);
    assert!(!transport.emit(0, disaster_event("1")));
    assert_eq!(channel.next_signal().await, None);
}

#[test]
fn disconnect_when_idle_reports_nothing() {
    let (mut channel, _transport) = channel();
    assert_eq!(channel.disconnect(), None);
}

// =============================================================
// Listener sets
// =============================================================

#[tokio::test]
async fn reconnecting_twice_leaves_exactly_one_listener_set() {
    let (mut channel, transport) = channel();
    channel.connect(URL);
    channel.reconnect(URL);
    channel.reconnect(URL);

    assert_eq!(transport.open_count(), 3);
    assert_eq!(transport.active_count(), 1);

    let delivered = transport.broadcast(&disaster_event("9"));
    assert_eq!(delivered, 1, "only the newest subscription may accept events");

    let expected = PushEvent::new(PushEventKind::DisasterUpdated, DisasterId::from("9"));
    assert_eq!(channel.next_signal().await, Some(PushSignal::Event(expected)));
}

#[tokio::test]
async fn one_server_event_is_delivered_once_after_reconnect() {
    let (mut channel, transport) = channel();
    channel.connect(URL);
    channel.reconnect(URL);
    transport.broadcast(&disaster_event("4"));
    transport.emit(1, TransportSignal::Disconnected);

    assert!(matches!(channel.next_signal().await, Some(PushSignal::Event(_))));
    // The trailing disconnect does not flip an indicator that never showed connected.
    transport.close(1);
    assert_eq!(channel.next_signal().await, None);
    assert!(!channel.is_subscribed());
}

// =============================================================
// Signals
// =============================================================

#[tokio::test]
async fn status_signals_only_fire_on_change() {
    let (mut channel, transport) = channel();
    channel.connect(URL);
    transport.emit(0, TransportSignal::Connected);
    transport.emit(0, TransportSignal::Connected);
    transport.emit(0, TransportSignal::Disconnected);
    transport.emit(0, TransportSignal::Connecting);
    transport.emit(0, TransportSignal::Disconnected);
    transport.emit(0, TransportSignal::Connected);

    assert_eq!(channel.next_signal().await, Some(PushSignal::Status { connected: true }));
    assert_eq!(channel.next_signal().await, Some(PushSignal::Status { connected: false }));
    assert_eq!(channel.next_signal().await, Some(PushSignal::Status { connected: true }));
    assert_eq!(channel.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn transport_reconnect_keeps_the_same_subscription() {
    let (mut channel, transport) = channel();
    channel.connect(URL);
    transport.emit(0, TransportSignal::Connected);
    transport.emit(0, TransportSignal::Disconnected);
    transport.emit(0, TransportSignal::Connecting);
    channel.next_signal().await;
    channel.next_signal().await;

    assert!(channel.is_subscribed());
    assert!(!channel.is_initializing());
    assert!(!channel.connect(URL), "automatic reconnection belongs to the transport");
    assert_eq!(transport.open_count(), 1);
}

#[tokio::test]
async fn unknown_events_are_skipped() {
    let (mut channel, transport) = channel();
    channel.connect(URL);
    transport.emit(0, TransportSignal::Event { name: "chat".to_owned(), payload: json!({}) });
    transport.emit(0, TransportSignal::Event { name: "resources_updated".to_owned(), payload: json!({}) });
    transport.emit(
        0,
        TransportSignal::Event { name: "resources_updated".to_owned(), payload: json!({ "disasterId": 12 }) },
    );

    let expected = PushEvent::new(PushEventKind::ResourcesUpdated, DisasterId::from("12"));
    assert_eq!(channel.next_signal().await, Some(PushSignal::Event(expected)));
}

#[tokio::test]
async fn transport_ending_reports_disconnect_once() {
    let (mut channel, transport) = channel();
    channel.connect(URL);
    transport.emit(0, TransportSignal::Connected);
    channel.next_signal().await;

    transport.close(0);
    assert_eq!(channel.next_signal().await, Some(PushSignal::Status { connected: false }));
    assert_eq!(channel.next_signal().await, None);
    assert!(channel.connect(URL), "a dead subscription no longer blocks connect");
}
