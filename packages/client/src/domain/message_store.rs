//! Ordered, deduplicated view of the active room's messages.
//!
//! The store is hydrated once per room activation with the history result and
//! then fed live events through [`MessageStore::append`]. The sequence returned
//! by [`MessageStore::snapshot`] is always sorted by (created_at, id) and holds
//! each id at most once.

use std::cmp::Ordering;

use super::{
    entity::Message,
    error::StoreError,
    value_object::{MessageId, RoomId},
};

/// What `append` did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// New entry
    Inserted,
    /// An entry with the same id was replaced in place
    Replaced,
    /// A pending optimistic entry was replaced by its confirmed copy
    Reconciled { pending_id: MessageId },
}

/// In-memory message collection for one room
#[derive(Debug, Default)]
pub struct MessageStore {
    room_id: Option<RoomId>,
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Room the store is currently hydrated for
    pub fn room_id(&self) -> Option<&RoomId> {
        self.room_id.as_ref()
    }

    /// Replace the contents with a history result for `room_id`.
    ///
    /// Messages of other rooms are dropped and duplicate ids collapse to the
    /// last occurrence.
    pub fn hydrate(&mut self, room_id: RoomId, messages: Vec<Message>) {
        self.messages.clear();
        let total = messages.len();
        for message in messages {
            if message.room_id != room_id {
                tracing::warn!(
                    "Dropping history message '{}' of room '{}' while hydrating '{}'",
                    message.id,
                    message.room_id,
                    room_id
                );
                continue;
            }
            self.upsert(message);
        }
        tracing::debug!(
            "Hydrated room '{}' with {} messages ({} received)",
            room_id,
            self.messages.len(),
            total
        );
        self.room_id = Some(room_id);
    }

    /// Insert a message keeping the (created_at, id) order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RoomMismatch` if the message belongs to another
    /// room, and `StoreError::NotHydrated` before the first `hydrate`.
    pub fn append(&mut self, message: Message) -> Result<AppendOutcome, StoreError> {
        let Some(room_id) = &self.room_id else {
            tracing::warn!("Rejected message '{}': store not hydrated", message.id);
            return Err(StoreError::NotHydrated);
        };
        if &message.room_id != room_id {
            tracing::warn!(
                "Rejected message '{}' for room '{}': active room is '{}'",
                message.id,
                message.room_id,
                room_id
            );
            return Err(StoreError::RoomMismatch {
                expected: room_id.clone(),
                actual: message.room_id,
            });
        }

        if self.position_of(&message.id).is_some() {
            self.upsert(message);
            return Ok(AppendOutcome::Replaced);
        }

        if !message.is_pending()
            && let Some(index) = self.pending_counterpart(&message)
        {
            let pending = self.messages.remove(index);
            tracing::debug!("Reconciled '{}' with '{}'", pending.id, message.id);
            self.insert_sorted(message);
            return Ok(AppendOutcome::Reconciled {
                pending_id: pending.id,
            });
        }

        self.insert_sorted(message);
        Ok(AppendOutcome::Inserted)
    }

    /// Append every message, skipping (and logging) rejected ones.
    ///
    /// Returns the number of messages applied.
    pub fn extend(&mut self, messages: Vec<Message>) -> usize {
        messages
            .into_iter()
            .map(|message| self.append(message))
            .filter(Result::is_ok)
            .count()
    }

    /// Current ordered messages (read-only)
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Evict everything; the store must be hydrated again before use.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.room_id = None;
    }

    fn position_of(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|m| &m.id == id)
    }

    /// Pending entry matching a confirmed message.
    ///
    /// Matches on the echoed `client_ref`. Without one, falls back to the
    /// oldest pending entry of the same sender with an identical body.
    fn pending_counterpart(&self, confirmed: &Message) -> Option<usize> {
        match confirmed.client_ref {
            Some(client_ref) => self
                .messages
                .iter()
                .position(|m| m.is_pending() && m.client_ref == Some(client_ref)),
            None => self.messages.iter().position(|m| {
                m.is_pending() && m.sender_id == confirmed.sender_id && m.body == confirmed.body
            }),
        }
    }

    fn upsert(&mut self, message: Message) {
        if let Some(index) = self.position_of(&message.id) {
            self.messages.remove(index);
        }
        self.insert_sorted(message);
    }

    fn insert_sorted(&mut self, message: Message) {
        let index = self
            .messages
            .partition_point(|m| m.display_order(&message) == Ordering::Less);
        self.messages.insert(index, message);
    }
}
