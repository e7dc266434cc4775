//! Core domain models for the chat synchronization core.

use std::cmp::Ordering;

use super::value_object::{
    ClientRef, DisplayName, MessageBody, MessageId, ParticipantId, RoomId, Timestamp,
};

/// Delivery status of a message held by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Added optimistically on send, not yet confirmed by the server
    Pending,
    /// Received from the server (live event or history)
    Confirmed,
}

/// Represents a chat message in the domain model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message identifier (server-assigned, or `tmp-...` while pending)
    pub id: MessageId,
    /// Room the message belongs to
    pub room_id: RoomId,
    /// Sender's participant ID
    pub sender_id: ParticipantId,
    /// Message body
    pub body: MessageBody,
    /// Creation time (Unix milliseconds)
    pub created_at: Timestamp,
    /// Correlation reference of an optimistic send, echoed by the server
    pub client_ref: Option<ClientRef>,
    /// Pending or confirmed
    pub delivery: Delivery,
}

impl Message {
    /// Create a server-confirmed message
    pub fn confirmed(
        id: MessageId,
        room_id: RoomId,
        sender_id: ParticipantId,
        body: MessageBody,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            room_id,
            sender_id,
            body,
            created_at,
            client_ref: None,
            delivery: Delivery::Confirmed,
        }
    }

    /// Create an optimistic local message with a temporary id
    pub fn pending(
        client_ref: ClientRef,
        room_id: RoomId,
        sender_id: ParticipantId,
        body: MessageBody,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::pending(client_ref),
            room_id,
            sender_id,
            body,
            created_at,
            client_ref: Some(client_ref),
            delivery: Delivery::Pending,
        }
    }

    /// Attach the correlation reference echoed by the server
    pub fn with_client_ref(mut self, client_ref: Option<ClientRef>) -> Self {
        self.client_ref = client_ref;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.delivery == Delivery::Pending
    }

    /// Display order: creation timestamp ascending, ties broken by id.
    pub fn display_order(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Represents a conversation room as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Room identifier
    pub id: RoomId,
    /// Participants of the conversation (end user and coach/operator)
    pub participants: Vec<ParticipantId>,
    /// Most recent message known for the room
    pub latest_message: Option<LatestMessage>,
}

impl Room {
    /// Create a room without a known latest message
    pub fn new(id: RoomId, participants: Vec<ParticipantId>) -> Self {
        Self {
            id,
            participants,
            latest_message: None,
        }
    }

    /// The first participant that is not `me`, if any
    pub fn counterpart_of(&self, me: &ParticipantId) -> Option<&ParticipantId> {
        self.participants.iter().find(|p| *p != me)
    }

    /// Update the summary if `message` is newer than the current one
    pub fn observe(&mut self, message: &Message) {
        let newer = self
            .latest_message
            .as_ref()
            .is_none_or(|latest| latest.created_at <= message.created_at);
        if newer {
            self.latest_message = Some(LatestMessage {
                sender_id: message.sender_id.clone(),
                body: message.body.clone(),
                created_at: message.created_at,
            });
        }
    }
}

/// "Latest message" summary shown next to a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestMessage {
    pub sender_id: ParticipantId,
    pub body: MessageBody,
    pub created_at: Timestamp,
}

/// Typing notification for a room; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingEvent {
    pub room_id: RoomId,
    pub display_name: DisplayName,
}

impl TypingEvent {
    pub fn new(room_id: RoomId, display_name: DisplayName) -> Self {
        Self {
            room_id,
            display_name,
        }
    }
}
