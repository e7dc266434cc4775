//! Data transfer objects for the wire formats.

pub mod websocket;
