//! Abstraction of the realtime channel.
//!
//! The domain depends on this trait only; the WebSocket implementation lives
//! in the infrastructure layer (dependency inversion).

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    error::ConnectionError,
    event::{ConnectionState, EventKind, InboundEvent, OutboundEvent},
    value_object::RoomId,
};

/// Callback invoked for every event of the kind it was registered for.
///
/// Handlers run on the channel's IO task and must not block; the usual
/// handler forwards the event into an mpsc channel.
pub type EventHandler = Arc<dyn Fn(&InboundEvent) + Send + Sync>;

/// Handle returned by [`ChatChannel::on`], used to deregister the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Persistent bidirectional connection to the chat server
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Establish the transport.
    ///
    /// Resolves once connected; fails after the retry budget is exhausted.
    async fn connect(&self) -> Result<(), ConnectionError>;

    /// Fire-and-forget send; buffered while not connected.
    fn emit(&self, event: OutboundEvent);

    /// Event written first on every (re)connect, ahead of the buffered ones.
    /// `None` clears it.
    fn set_rejoin(&self, event: Option<OutboundEvent>);

    /// Drop the buffered events of `room_id`. Returns how many were dropped.
    fn discard_buffered(&self, room_id: &RoomId) -> usize;

    /// Register a handler. Handlers of one kind run in registration order.
    fn on(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId;

    /// Deregister a handler. Returns `false` if it was not registered.
    fn off(&self, id: SubscriptionId) -> bool;

    /// Current connection state
    fn connection_state(&self) -> ConnectionState;
}
