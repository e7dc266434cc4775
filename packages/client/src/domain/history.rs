//! Abstraction of the history fetch collaborator.

use async_trait::async_trait;

use super::{entity::Message, error::HistoryFetchError, value_object::RoomId};

/// Retrieves the message history of a room
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    /// Fetch the room's messages, ordered oldest first.
    async fn fetch(&self, room_id: &RoomId) -> Result<Vec<Message>, HistoryFetchError>;
}
