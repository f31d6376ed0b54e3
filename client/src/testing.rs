//! Test doubles shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::error::TransportError;
use crate::net::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::net::push::{PushTransport, Subscription, TransportSignal};
use crate::render::{NotificationKind, Panel, Renderer, View};
use crate::state::session::SessionContext;

// =============================================================================
// HTTP
// =============================================================================

struct Route {
    fragment: String,
    outcome: Result<HttpResponse, String>,
}

/// Scripted HTTP transport. Routes match on a URL substring; the most
/// recently registered match wins. Unmatched requests get `200 {}`.
#[derive(Default)]
pub struct FakeTransport {
    routes: RefCell<Vec<Route>>,
    requests: RefCell<Vec<HttpRequest>>,
    holds: RefCell<Vec<(String, oneshot::Receiver<()>)>>,
}

impl FakeTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn respond(&self, fragment: &str, status: u16, body: &str) {
        self.routes.borrow_mut().push(Route {
            fragment: fragment.to_owned(),
            outcome: Ok(HttpResponse { status, body: body.to_owned() }),
        });
    }

    pub fn respond_json(&self, fragment: &str, body: &serde_json::Value) {
        self.respond(fragment, 200, &body.to_string());
    }

    pub fn fail(&self, fragment: &str, message: &str) {
        self.routes
            .borrow_mut()
            .push(Route { fragment: fragment.to_owned(), outcome: Err(message.to_owned()) });
    }

    /// Hold the next request matching `fragment` until the returned sender
    /// fires (or is dropped). The request is recorded before it blocks.
    pub fn hold(&self, fragment: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.borrow_mut().push((fragment.to_owned(), rx));
        tx
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }

    pub fn count_matching(&self, fragment: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.url.contains(fragment)).count()
    }
}

#[async_trait(?Send)]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.requests.borrow_mut().push(request);

        let hold = {
            let mut holds = self.holds.borrow_mut();
            holds
                .iter()
                .position(|(fragment, _)| url.contains(fragment.as_str()))
                .map(|index| holds.remove(index).1)
        };
        if let Some(rx) = hold {
            let _ = rx.await;
        }

        let routes = self.routes.borrow();
        match routes.iter().rev().find(|route| url.contains(route.fragment.as_str())) {
            Some(Route { outcome: Ok(response), .. }) => Ok(response.clone()),
            Some(Route { outcome: Err(message), .. }) => Err(TransportError(message.clone())),
            None => Ok(HttpResponse { status: 200, body: "{}".to_owned() }),
        }
    }
}

// =============================================================================
// RENDERER
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum RenderCall {
    Render(View),
    Loading(Panel, String),
    Error(Panel, String),
    Success(Panel, String),
    Notification(String, NotificationKind),
    Connection(bool),
    Selection(SessionContext),
}

#[derive(Default)]
pub struct RecordingRenderer {
    calls: RefCell<Vec<RenderCall>>,
}

impl RecordingRenderer {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Views rendered into `panel`, oldest first.
    pub fn views(&self, panel: Panel) -> Vec<View> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                RenderCall::Render(view) if view.panel() == panel => Some(view.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(Panel, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                RenderCall::Error(panel, message) => Some((*panel, message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<(Panel, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                RenderCall::Success(panel, message) => Some((*panel, message.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                RenderCall::Notification(message, _) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn connection_updates(&self) -> Vec<bool> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                RenderCall::Connection(connected) => Some(*connected),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, view: View) {
        self.calls.borrow_mut().push(RenderCall::Render(view));
    }

    fn show_loading(&self, panel: Panel, message: &str) {
        self.calls.borrow_mut().push(RenderCall::Loading(panel, message.to_owned()));
    }

    fn show_error(&self, panel: Panel, message: &str) {
        self.calls.borrow_mut().push(RenderCall::Error(panel, message.to_owned()));
    }

    fn show_success(&self, panel: Panel, message: &str) {
        self.calls.borrow_mut().push(RenderCall::Success(panel, message.to_owned()));
    }

    fn show_notification(&self, message: &str, kind: NotificationKind) {
        self.calls.borrow_mut().push(RenderCall::Notification(message.to_owned(), kind));
    }

    fn show_connection(&self, connected: bool) {
        self.calls.borrow_mut().push(RenderCall::Connection(connected));
    }

    fn show_selection(&self, session: &SessionContext) {
        self.calls.borrow_mut().push(RenderCall::Selection(session.clone()));
    }
}

// =============================================================================
// PUSH
// =============================================================================

/// Push transport that hands each subscription's sender back to the test.
#[derive(Default)]
pub struct FakePushTransport {
    opened: RefCell<Vec<(String, mpsc::UnboundedSender<TransportSignal>)>>,
}

impl FakePushTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn open_count(&self) -> usize {
        self.opened.borrow().len()
    }

    /// Subscriptions whose receiving side is still registered.
    pub fn active_count(&self) -> usize {
        self.opened.borrow().iter().filter(|(_, tx)| !tx.is_closed()).count()
    }

    pub fn url(&self, index: usize) -> Option<String> {
        self.opened.borrow().get(index).map(|(url, _)| url.clone())
    }

    /// Deliver `signal` on subscription `index`. Returns `false` when that
    /// subscription is gone.
    pub fn emit(&self, index: usize, signal: TransportSignal) -> bool {
        self.opened
            .borrow()
            .get(index)
            .is_some_and(|(_, tx)| tx.send(signal).is_ok())
    }

    /// Deliver `signal` on every subscription ever opened; returns how many
    /// accepted it.
    pub fn broadcast(&self, signal: &TransportSignal) -> usize {
        self.opened
            .borrow()
            .iter()
            .filter(|(_, tx)| tx.send(signal.clone()).is_ok())
            .count()
    }

    /// Drop the sending side of subscription `index`, as a transport task
    /// that gave up would.
    pub fn close(&self, index: usize) {
        let mut opened = self.opened.borrow_mut();
        if let Some(entry) = opened.get_mut(index) {
            let (tx, _) = mpsc::unbounded_channel();
            entry.1 = tx;
        }
    }
}

impl PushTransport for FakePushTransport {
    fn open(&self, url: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.opened.borrow_mut().push((url.to_owned(), tx));
        Subscription::new(rx, None)
    }
}
