//! WebSocket frame DTOs and the decode/validate step at the channel boundary.
//!
//! Frames are JSON objects `{"event": "<name>", "data": {...}}`. Outbound and
//! inbound directions are two closed enums; anything else fails to decode and
//! is dropped by the channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    ClientRef, DisplayName, InboundEvent, Message, MessageBody, MessageId, OutboundEvent,
    ParticipantId, RoomId, Timestamp, TypingEvent, ValueObjectError,
};

/// Errors raised while decoding an inbound frame
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame is not valid JSON or not a known event
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// A field failed domain validation
    #[error("Invalid field '{field}': {source}")]
    InvalidField {
        field: &'static str,
        #[source]
        source: ValueObjectError,
    },

    /// `createdAt` is neither Unix milliseconds nor RFC 3339
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Frames sent by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    JoinRoom(MembershipPayload),
    LeaveRoom(MembershipPayload),
    SendMessage(SendMessagePayload),
    Typing(TypingPayload),
    StopTyping(TypingPayload),
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    ReceiveMessage(MessagePayload),
    Typing(TypingPayload),
    StopTyping(TypingPayload),
}

/// `join_room` / `leave_room` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPayload {
    pub room_id: String,
    pub participant_id: String,
}

/// `send_message` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub room_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    pub body: String,
    pub client_ref: String,
}

/// `typing` / `stop_typing` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub room_id: String,
    pub display_name: String,
}

/// Message object shared by `receive_message` and the history endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: CreatedAt,
    #[serde(default)]
    pub client_ref: Option<String>,
}

/// Creation time as sent by the server: Unix milliseconds or RFC 3339
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CreatedAt {
    Millis(i64),
    Rfc3339(String),
}

impl CreatedAt {
    fn to_timestamp(&self) -> Result<Timestamp, DecodeError> {
        match self {
            Self::Millis(millis) => Ok(Timestamp::new(*millis)),
            Self::Rfc3339(value) => kaiwa_shared::time::rfc3339_to_timestamp(value)
                .map(Timestamp::new)
                .ok_or_else(|| DecodeError::InvalidTimestamp(value.clone())),
        }
    }
}

fn field<T>(
    name: &'static str,
    value: Result<T, ValueObjectError>,
) -> Result<T, DecodeError> {
    value.map_err(|source| DecodeError::InvalidField {
        field: name,
        source,
    })
}

impl MessagePayload {
    /// Validate and convert into a confirmed domain message.
    pub fn into_message(self) -> Result<Message, DecodeError> {
        let created_at = self.created_at.to_timestamp()?;
        let client_ref = self
            .client_ref
            .as_deref()
            .map(|value| field("clientRef", ClientRef::parse(value)))
            .transpose()?;
        let message = Message::confirmed(
            field("id", MessageId::new(self.id))?,
            field("roomId", RoomId::new(self.room_id))?,
            field("senderId", ParticipantId::new(self.sender_id))?,
            field("body", MessageBody::new(self.body))?,
            created_at,
        );
        Ok(message.with_client_ref(client_ref))
    }
}

impl TypingPayload {
    fn into_event(self) -> Result<TypingEvent, DecodeError> {
        Ok(TypingEvent::new(
            field("roomId", RoomId::new(self.room_id))?,
            field("displayName", DisplayName::new(self.display_name))?,
        ))
    }
}

impl From<&OutboundEvent> for ClientFrame {
    fn from(event: &OutboundEvent) -> Self {
        match event {
            OutboundEvent::JoinRoom {
                room_id,
                participant_id,
            } => Self::JoinRoom(MembershipPayload {
                room_id: room_id.as_str().to_string(),
                participant_id: participant_id.as_str().to_string(),
            }),
            OutboundEvent::LeaveRoom {
                room_id,
                participant_id,
            } => Self::LeaveRoom(MembershipPayload {
                room_id: room_id.as_str().to_string(),
                participant_id: participant_id.as_str().to_string(),
            }),
            OutboundEvent::SendMessage {
                room_id,
                recipient_id,
                body,
                client_ref,
            } => Self::SendMessage(SendMessagePayload {
                room_id: room_id.as_str().to_string(),
                recipient_id: recipient_id.as_ref().map(|id| id.as_str().to_string()),
                body: body.as_str().to_string(),
                client_ref: client_ref.to_string(),
            }),
            OutboundEvent::Typing {
                room_id,
                display_name,
            } => Self::Typing(TypingPayload {
                room_id: room_id.as_str().to_string(),
                display_name: display_name.as_str().to_string(),
            }),
            OutboundEvent::StopTyping {
                room_id,
                display_name,
            } => Self::StopTyping(TypingPayload {
                room_id: room_id.as_str().to_string(),
                display_name: display_name.as_str().to_string(),
            }),
        }
    }
}

impl TryFrom<ServerFrame> for InboundEvent {
    type Error = DecodeError;

    fn try_from(frame: ServerFrame) -> Result<Self, Self::Error> {
        Ok(match frame {
            ServerFrame::ReceiveMessage(payload) => Self::Message(payload.into_message()?),
            ServerFrame::Typing(payload) => Self::Typing(payload.into_event()?),
            ServerFrame::StopTyping(payload) => Self::StopTyping(payload.into_event()?),
        })
    }
}

/// Serialize an outbound event into a text frame.
pub fn encode(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ClientFrame::from(event))
}

/// Parse and validate an inbound text frame.
pub fn decode(text: &str) -> Result<InboundEvent, DecodeError> {
    let frame: ServerFrame = serde_json::from_str(text)?;
    InboundEvent::try_from(frame)
}
