//! Realtime channel over WebSocket.

pub mod client;
pub mod config;
pub mod registry;

pub use client::ChannelClient;
pub use config::{ChannelConfig, RetryPolicy};
pub use registry::HandlerRegistry;
