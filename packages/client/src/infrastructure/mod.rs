//! Infrastructure layer
//!
//! Implementations of the domain traits: the WebSocket channel and the HTTP
//! history fetcher, plus the wire DTOs they share.

pub mod channel;
pub mod dto;
pub mod history;

pub use channel::{ChannelClient, ChannelConfig, HandlerRegistry, RetryPolicy};
pub use history::HttpHistoryFetcher;
