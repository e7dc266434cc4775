//! Realtime events exchanged over the channel, in domain terms.
//!
//! The wire representation lives in `infrastructure::dto::websocket`; these
//! types are what the rest of the crate sees after decoding and validation.

use std::fmt;

use super::{
    entity::{Message, TypingEvent},
    value_object::{ClientRef, DisplayName, MessageBody, ParticipantId, RoomId},
};

/// Connection state of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// Event kinds handlers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ReceiveMessage,
    Typing,
    StopTyping,
    ConnectionStateChanged,
}

/// Events delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `receive_message`
    Message(Message),
    /// `typing`
    Typing(TypingEvent),
    /// `stop_typing`
    StopTyping(TypingEvent),
    /// Local notification raised by the channel itself
    ConnectionStateChanged(ConnectionState),
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Message(_) => EventKind::ReceiveMessage,
            Self::Typing(_) => EventKind::Typing,
            Self::StopTyping(_) => EventKind::StopTyping,
            Self::ConnectionStateChanged(_) => EventKind::ConnectionStateChanged,
        }
    }

    /// Room the event is scoped to; `None` for channel-level events.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            Self::Message(message) => Some(&message.room_id),
            Self::Typing(event) | Self::StopTyping(event) => Some(&event.room_id),
            Self::ConnectionStateChanged(_) => None,
        }
    }
}

/// Events emitted by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    JoinRoom {
        room_id: RoomId,
        participant_id: ParticipantId,
    },
    LeaveRoom {
        room_id: RoomId,
        participant_id: ParticipantId,
    },
    SendMessage {
        room_id: RoomId,
        recipient_id: Option<ParticipantId>,
        body: MessageBody,
        client_ref: ClientRef,
    },
    Typing {
        room_id: RoomId,
        display_name: DisplayName,
    },
    StopTyping {
        room_id: RoomId,
        display_name: DisplayName,
    },
}

impl OutboundEvent {
    /// Wire event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join_room",
            Self::LeaveRoom { .. } => "leave_room",
            Self::SendMessage { .. } => "send_message",
            Self::Typing { .. } => "typing",
            Self::StopTyping { .. } => "stop_typing",
        }
    }

    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::LeaveRoom { room_id, .. }
            | Self::SendMessage { room_id, .. }
            | Self::Typing { room_id, .. }
            | Self::StopTyping { room_id, .. } => room_id,
        }
    }
}
