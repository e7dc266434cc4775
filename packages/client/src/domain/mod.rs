//! Domain layer for the chat synchronization core.
//!
//! This module contains the entities, the ordered message store and the typing
//! state machines, plus the traits the outer layers implement. It has no
//! knowledge of the wire format or of the transport.

pub mod channel;
pub mod entity;
pub mod error;
pub mod event;
pub mod history;
pub mod message_store;
pub mod typing;
pub mod value_object;

pub use channel::{ChatChannel, EventHandler, SubscriptionId};
pub use entity::{Delivery, LatestMessage, Message, Room, TypingEvent};
pub use error::{
    ConnectionError, HistoryFetchError, StaleEventError, StoreError, ValueObjectError,
};
pub use event::{ConnectionState, EventKind, InboundEvent, OutboundEvent};
pub use history::HistoryFetcher;
pub use message_store::{AppendOutcome, MessageStore};
pub use typing::{TypingDebouncer, TypingIndicator, TypingState};
pub use value_object::{
    ClientRef, DisplayName, MessageBody, MessageId, ParticipantId, RoomId, Timestamp,
};
