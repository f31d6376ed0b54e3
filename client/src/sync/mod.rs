//! Refresh triggers: throttles, push debouncing, and the orchestrator.
//!
//! SYSTEM CONTEXT
//! ==============
//! `throttle` and `debounce` are the timing primitives, `orchestrator` turns
//! triggers into fetches, and `driver` runs the event loop that feeds it.

pub mod debounce;
pub mod driver;
pub mod orchestrator;
pub mod throttle;
