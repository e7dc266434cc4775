//! Realtime chat synchronization core.
//!
//! Layers, from the inside out:
//!
//! - [`domain`]: entities, the ordered message store, typing state machines
//!   and the channel / history traits
//! - [`usecase`]: room membership and the chat controller that drives a UI
//! - [`infrastructure`]: WebSocket channel with reconnect, HTTP history fetch
//!   and the wire DTOs
//! - [`ui`]: the interactive terminal client

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
