//! Typing indicator state machines.
//!
//! Both machines are driven with explicit instants. They never own a timer:
//! each exposes the single deadline it is waiting for, and the controller's
//! event loop sleeps until the earliest one. Redundant events move the
//! deadline instead of adding a second one.

use std::time::Duration;

use tokio::time::Instant;

use super::value_object::DisplayName;

/// Default window after which a remote "typing" state expires
pub const DEFAULT_TYPING_TIMEOUT: Duration = Duration::from_secs(3);

/// Default minimum interval between two outbound "typing" emits
pub const DEFAULT_TYPING_EMIT_INTERVAL: Duration = Duration::from_secs(1);

/// Default idle period after the last keystroke before "stop typing" is sent
pub const DEFAULT_STOP_TYPING_AFTER: Duration = Duration::from_secs(2);

/// Remote typing state of the active room
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypingState {
    #[default]
    Idle,
    Typing {
        display_name: DisplayName,
        until: Instant,
    },
}

/// Tracks whether the remote participant is currently typing
#[derive(Debug)]
pub struct TypingIndicator {
    timeout: Duration,
    state: TypingState,
}

impl TypingIndicator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            state: TypingState::Idle,
        }
    }

    pub fn state(&self) -> &TypingState {
        &self.state
    }

    /// Name of the participant currently typing
    pub fn typing_name(&self) -> Option<&DisplayName> {
        match &self.state {
            TypingState::Idle => None,
            TypingState::Typing { display_name, .. } => Some(display_name),
        }
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.state, TypingState::Typing { .. })
    }

    /// Instant at which the typing state expires
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            TypingState::Idle => None,
            TypingState::Typing { until, .. } => Some(*until),
        }
    }

    /// Remote "typing": enter or stay in typing and restart the window.
    ///
    /// Returns `true` if the visible state changed (idle → typing, or a
    /// different participant is now typing).
    pub fn on_typing(&mut self, display_name: DisplayName, now: Instant) -> bool {
        let changed = self.typing_name() != Some(&display_name);
        self.state = TypingState::Typing {
            display_name,
            until: now + self.timeout,
        };
        changed
    }

    /// Remote "stop typing". Returns `true` if the state changed.
    pub fn on_stop_typing(&mut self) -> bool {
        let changed = self.is_typing();
        self.state = TypingState::Idle;
        changed
    }

    /// Expire the typing state if its window has elapsed at `now`.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(until) if now >= until => {
                self.state = TypingState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Back to idle, dropping the deadline (room change or teardown).
    pub fn reset(&mut self) {
        self.state = TypingState::Idle;
    }
}

impl Default for TypingIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_TIMEOUT)
    }
}

/// Rate-limits the local "typing" emits of one composing burst
#[derive(Debug)]
pub struct TypingDebouncer {
    emit_interval: Duration,
    stop_after: Duration,
    last_emit: Option<Instant>,
    stop_at: Option<Instant>,
}

impl TypingDebouncer {
    pub fn new(emit_interval: Duration, stop_after: Duration) -> Self {
        Self {
            emit_interval,
            stop_after,
            last_emit: None,
            stop_at: None,
        }
    }

    /// Register a keystroke.
    ///
    /// Returns `true` if a "typing" event should be emitted now.
    pub fn on_keystroke(&mut self, now: Instant) -> bool {
        self.stop_at = Some(now + self.stop_after);
        let due = self
            .last_emit
            .is_none_or(|last| now.duration_since(last) >= self.emit_interval);
        if due {
            self.last_emit = Some(now);
        }
        due
    }

    /// Instant at which "stop typing" becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.stop_at
    }

    /// Returns `true` exactly once per burst, when the idle period elapsed.
    pub fn poll_stop(&mut self, now: Instant) -> bool {
        match self.stop_at {
            Some(stop_at) if now >= stop_at => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// End the burst early (message sent, room closed).
    ///
    /// Returns `true` if a "stop typing" event is owed.
    pub fn finish(&mut self) -> bool {
        let active = self.stop_at.is_some();
        self.reset();
        active
    }

    pub fn reset(&mut self) {
        self.last_emit = None;
        self.stop_at = None;
    }
}

impl Default for TypingDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_EMIT_INTERVAL, DEFAULT_STOP_TYPING_AFTER)
    }
}
