//! # relief-client
//!
//! Client-side state synchronization for the disaster-response console.
//!
//! This crate owns the current selection, decides when server views are
//! re-fetched (operator action, push notification, or throttle), and keeps a
//! reconnecting push channel alive. Display and raw I/O sit behind the
//! `Renderer`, `HttpTransport`, and `PushTransport` traits.

pub mod clock;
pub mod config;
pub mod error;
pub mod net;
pub mod render;
pub mod state;
pub mod sync;

#[cfg(test)]
mod testing;
