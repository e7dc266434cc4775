//! History fetch over HTTP.

pub mod http;

pub use http::HttpHistoryFetcher;
