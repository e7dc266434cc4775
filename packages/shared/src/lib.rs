//! Shared utilities for Kaiwa.

pub mod logger;
pub mod time;
