//! Networking modules for the REST gateway and the push channel.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles REST calls over the `http` transport seam, `push` manages
//! the push-channel lifecycle over a `push_ws` Socket.IO transport, and
//! `types` defines the shared wire schema.

pub mod api;
pub mod http;
pub mod push;
pub mod push_ws;
pub mod socketio;
pub mod types;
