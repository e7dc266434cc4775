//! Channel configuration: endpoint, retry budget and reconnect buffer.

use std::time::Duration;

/// Default number of connection attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the second attempt
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default upper bound of the backoff delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Default capacity of the outbound buffer used while disconnected
pub const DEFAULT_OUTBOX_CAPACITY: usize = 16;

/// Exponential backoff with a capped number of attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the `failed_attempt`-th failure (1-based):
    /// `base_delay * 2^(failed_attempt - 1)`, capped at `max_delay`.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/// Configuration of a [`super::ChannelClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    pub url: String,
    pub retry: RetryPolicy,
    /// Events kept while disconnected; the oldest is dropped on overflow
    pub outbox_capacity: usize,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            retry: RetryPolicy::default(),
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity;
        self
    }
}
