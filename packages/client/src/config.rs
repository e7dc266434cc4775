//! Explicit configuration passed into the controller at construction.
//!
//! Identity and display settings never come from ambient global state; the
//! binary builds these values from its command-line arguments.

use std::time::Duration;

use crate::domain::{
    DisplayName, ParticipantId,
    typing::{DEFAULT_STOP_TYPING_AFTER, DEFAULT_TYPING_EMIT_INTERVAL, DEFAULT_TYPING_TIMEOUT},
};

/// UI surface a controller serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Surface {
    /// End-user chat widget
    #[default]
    Widget,
    /// Operator / coach console
    Console,
}

/// Who is chatting, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    pub participant_id: ParticipantId,
    pub display_name: DisplayName,
    pub surface: Surface,
}

impl ChatContext {
    pub fn new(participant_id: ParticipantId, display_name: DisplayName, surface: Surface) -> Self {
        Self {
            participant_id,
            display_name,
            surface,
        }
    }
}

/// Timing of the typing indicator machines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Remote "typing" expires after this window without renewal
    pub typing_timeout: Duration,
    /// Minimum interval between two outbound "typing" emits
    pub typing_emit_interval: Duration,
    /// Idle period after the last keystroke before "stop typing" is sent
    pub stop_typing_after: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
            typing_emit_interval: DEFAULT_TYPING_EMIT_INTERVAL,
            stop_typing_after: DEFAULT_STOP_TYPING_AFTER,
        }
    }
}
