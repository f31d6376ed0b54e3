//! Session context: acting user plus the current disaster selection.
//!
//! DESIGN
//! ======
//! One `SessionContext` lives behind an `Rc<RefCell<..>>` owned by the
//! orchestrator. Mutation goes through the narrow methods on `Session`;
//! the API client only receives a `SessionReader`, which can read the acting
//! user but cannot change the selection. Borrows are never held across an
//! `.await`, so every accessor returns owned values.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::RefCell;
use std::rc::Rc;

use crate::net::types::DisasterId;

/// Snapshot of the session at one point in time.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionContext {
    /// User sent in the `X-User-ID` header.
    pub acting_user_id: String,
    /// Disaster every dependent view is keyed by.
    pub selected_disaster_id: Option<DisasterId>,
    pub selected_latitude: Option<f64>,
    pub selected_longitude: Option<f64>,
}

impl SessionContext {
    #[must_use]
    pub fn new(acting_user_id: impl Into<String>) -> Self {
        Self {
            acting_user_id: acting_user_id.into(),
            selected_disaster_id: None,
            selected_latitude: None,
            selected_longitude: None,
        }
    }

    /// Both coordinates, when both are known.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.selected_latitude.zip(self.selected_longitude)
    }
}

/// Shared handle to the single session context.
#[derive(Clone, Debug)]
pub struct Session {
    inner: Rc<RefCell<SessionContext>>,
}

impl Session {
    #[must_use]
    pub fn new(acting_user_id: impl Into<String>) -> Self {
        Self { inner: Rc::new(RefCell::new(SessionContext::new(acting_user_id))) }
    }

    /// Owned snapshot of the current context.
    #[must_use]
    pub fn current(&self) -> SessionContext {
        self.inner.borrow().clone()
    }

    #[must_use]
    pub fn selected_disaster(&self) -> Option<DisasterId> {
        self.inner.borrow().selected_disaster_id.clone()
    }

    #[must_use]
    pub fn is_selected(&self, id: &DisasterId) -> bool {
        self.inner.borrow().selected_disaster_id.as_ref() == Some(id)
    }

    /// Replace the selected disaster and its coordinates in one step.
    pub fn select_disaster(&self, id: DisasterId, latitude: Option<f64>, longitude: Option<f64>) {
        let mut ctx = self.inner.borrow_mut();
        ctx.selected_disaster_id = Some(id);
        ctx.selected_latitude = latitude;
        ctx.selected_longitude = longitude;
    }

    pub fn select_user(&self, user_id: impl Into<String>) {
        self.inner.borrow_mut().acting_user_id = user_id.into();
    }

    /// Overwrite coordinates without touching the selected disaster.
    pub fn set_coordinates(&self, latitude: Option<f64>, longitude: Option<f64>) {
        let mut ctx = self.inner.borrow_mut();
        ctx.selected_latitude = latitude;
        ctx.selected_longitude = longitude;
    }

    /// Read-only view handed to the API client.
    #[must_use]
    pub fn reader(&self) -> SessionReader {
        SessionReader { inner: Rc::clone(&self.inner) }
    }
}

/// Read-only view of the session that exposes the acting user only.
#[derive(Clone, Debug)]
pub struct SessionReader {
    inner: Rc<RefCell<SessionContext>>,
}

impl SessionReader {
    #[must_use]
    pub fn acting_user(&self) -> String {
        self.inner.borrow().acting_user_id.clone()
    }
}
