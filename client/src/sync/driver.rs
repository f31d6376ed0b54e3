//! Single-threaded event loop tying the sync layer together.
//!
//! SYSTEM CONTEXT
//! ==============
//! The driver multiplexes three sources: operator actions from the console,
//! signals from the push channel, and debounce deadlines. Status signals go
//! straight to the orchestrator; push events are parked in the debouncer and
//! handed over when their window closes. Each action and each fired event
//! runs as its own local task, so a slow fetch never blocks the loop.
//!
//! Must run inside a `tokio::task::LocalSet`.

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;

use std::rc::Rc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::debounce::Debouncer;
use super::orchestrator::Orchestrator;
use super::throttle::Category;
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::net::push::{ConnectionState, PushChannel, PushSignal, PushTransport};
use crate::net::types::{DisasterDraft, DisasterId, PushEvent, ReportDraft};

/// Operator request, as parsed from console input.
#[derive(Clone, Debug, PartialEq)]
pub enum UserAction {
    SelectDisaster { id: DisasterId, latitude: Option<f64>, longitude: Option<f64> },
    SelectUser(String),
    SetTag(Option<String>),
    Refresh(Category),
    LoadCatalog,
    Create(DisasterDraft),
    Update(DisasterDraft),
    Report(ReportDraft),
    Geocode(String),
    Reconnect,
    Status,
}

pub struct SyncDriver {
    orchestrator: Orchestrator,
    push: PushChannel,
    debouncer: Debouncer,
    clock: Rc<dyn Clock>,
    push_url: String,
}

impl SyncDriver {
    #[must_use]
    pub fn new(
        config: &SyncConfig,
        orchestrator: Orchestrator,
        push_transport: Rc<dyn PushTransport>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            orchestrator,
            push: PushChannel::new(push_transport),
            debouncer: Debouncer::new(config.debounce, Rc::clone(&clock)),
            clock,
            push_url: config.push_url.clone(),
        }
    }

    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub fn push(&self) -> &PushChannel {
        &self.push
    }

    #[must_use]
    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Open the push channel if it is not already up.
    pub fn connect(&mut self) -> bool {
        self.push.connect(&self.push_url)
    }

    /// Tear the push channel down and open a fresh one.
    pub fn reconnect(&mut self) {
        info!(url = %self.push_url, "push channel reconnect requested");
        self.orchestrator.push_reconnecting();
        if let Some(signal) = self.push.reconnect(&self.push_url) {
            self.handle_signal(signal);
        }
    }

    /// Route one push signal.
    pub fn handle_signal(&mut self, signal: PushSignal) {
        match signal {
            PushSignal::Status { connected } => self.orchestrator.push_status(connected),
            PushSignal::Event(event) => {
                debug!(event = event.kind().event_name(), disaster_id = %event.disaster_id(), "push event debounced");
                self.debouncer.submit(event);
            }
        }
    }

    /// Events whose debounce window has closed.
    pub fn due_events(&mut self) -> Vec<PushEvent> {
        self.debouncer.take_due()
    }

    /// Display the selection and the push indicator.
    pub fn report_status(&self) {
        self.orchestrator.announce_selection();
        self.orchestrator
            .push_status(self.push.state() == ConnectionState::Connected);
    }

    /// Run until the action channel closes.
    pub async fn run(mut self, mut actions: mpsc::UnboundedReceiver<UserAction>) {
        self.connect();
        let orchestrator = self.orchestrator.clone();
        tokio::task::spawn_local(async move {
            if let Err(e) = orchestrator.bootstrap().await {
                debug!(error = %e, "bootstrap finished with errors");
            }
        });

        loop {
            let wait = self
                .debouncer
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(self.clock.now()));

            tokio::select! {
                action = actions.recv() => match action {
                    Some(UserAction::Reconnect) => self.reconnect(),
                    Some(UserAction::Status) => self.report_status(),
                    Some(action) => {
                        tokio::task::spawn_local(perform(self.orchestrator.clone(), action));
                    }
                    None => break,
                },
                Some(signal) = self.push.next_signal() => self.handle_signal(signal),
                () = sleep_for(wait) => {
                    for event in self.due_events() {
                        let orchestrator = self.orchestrator.clone();
                        tokio::task::spawn_local(async move {
                            if let Err(e) = orchestrator.handle_push_event(event).await {
                                debug!(error = %e, "push-triggered refresh failed");
                            }
                        });
                    }
                }
            }
        }

        info!("sync driver stopping");
        if let Some(signal) = self.push.disconnect() {
            self.handle_signal(signal);
        }
    }
}

async fn sleep_for(wait: Option<std::time::Duration>) {
    match wait {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Carry out one action. Failures were already rendered by the orchestrator.
async fn perform(orchestrator: Orchestrator, action: UserAction) {
    let result = match action {
        UserAction::SelectDisaster { id, latitude, longitude } => {
            orchestrator.select_disaster(id, latitude, longitude).await;
            Ok(())
        }
        UserAction::SelectUser(user_id) => {
            orchestrator.select_user(&user_id);
            Ok(())
        }
        UserAction::SetTag(tag) => orchestrator.set_tag_filter(tag).await.map(|_| ()),
        UserAction::Refresh(category) => orchestrator.refresh(category).await.map(|_| ()),
        UserAction::LoadCatalog => orchestrator.load_catalog().await.map(|_| ()),
        UserAction::Create(draft) => orchestrator.create_disaster(&draft).await.map(|_| ()),
        UserAction::Update(draft) => orchestrator.update_disaster(&draft).await.map(|_| ()),
        UserAction::Report(draft) => orchestrator.submit_report(&draft).await.map(|_| ()),
        UserAction::Geocode(description) => orchestrator.geocode(&description).await.map(|_| ()),
        UserAction::Reconnect | UserAction::Status => Ok(()),
    };
    if let Err(e) = result {
        debug!(error = %e, "action failed");
    }
}
