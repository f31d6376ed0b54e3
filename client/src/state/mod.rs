//! Client-side state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` is the only mutable state the sync layer keeps between calls:
//! who is acting and which disaster and coordinates are selected. Fetched
//! server data is never cached here; it flows straight to the renderer.

pub mod session;
