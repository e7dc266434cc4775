//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::RoomId;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ParticipantId validation error
    #[error("ParticipantId cannot be empty")]
    ParticipantIdEmpty,

    /// ParticipantId too long error
    #[error("ParticipantId cannot exceed {max} characters (got {actual})")]
    ParticipantIdTooLong { max: usize, actual: usize },

    /// RoomId validation error
    #[error("RoomId cannot be empty")]
    RoomIdEmpty,

    /// RoomId too long error
    #[error("RoomId cannot exceed {max} characters (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },

    /// MessageId validation error
    #[error("MessageId cannot be empty")]
    MessageIdEmpty,

    /// MessageBody validation error (empty or whitespace only)
    #[error("MessageBody cannot be blank")]
    MessageBodyBlank,

    /// MessageBody too long error
    #[error("MessageBody cannot exceed {max} characters (got {actual})")]
    MessageBodyTooLong { max: usize, actual: usize },

    /// DisplayName validation error
    #[error("DisplayName cannot be empty")]
    DisplayNameEmpty,

    /// DisplayName too long error
    #[error("DisplayName cannot exceed {max} characters (got {actual})")]
    DisplayNameTooLong { max: usize, actual: usize },

    /// ClientRef is not a UUID
    #[error("ClientRef must be a valid UUID (got: {0})")]
    ClientRefInvalidFormat(String),
}

/// Errors raised by the message store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store has not been hydrated for any room yet
    #[error("Message store is not hydrated for any room")]
    NotHydrated,

    /// The message belongs to a room other than the hydrated one
    #[error("Message for room '{actual}' rejected: store holds room '{expected}'")]
    RoomMismatch { expected: RoomId, actual: RoomId },
}

/// An event arrived for a room that is no longer the active one.
///
/// Never surfaced to the user; callers drop the event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Stale event for room '{event_room}' (active: {active_room:?})")]
pub struct StaleEventError {
    pub event_room: RoomId,
    pub active_room: Option<RoomId>,
}

/// The transport could not be (re)established within the retry budget.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Every attempt of the retry budget failed
    #[error("Connection failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The channel was shut down while connecting
    #[error("Channel was closed")]
    Closed,
}

/// The history request failed; the room can still be joined for live events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryFetchError {
    /// Request could not be sent or the response could not be read
    #[error("History request failed: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("History request returned status {0}")]
    Status(u16),

    /// Response body did not contain valid messages
    #[error("History response could not be decoded: {0}")]
    Decode(String),
}
