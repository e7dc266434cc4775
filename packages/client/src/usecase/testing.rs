//! In-memory channel used by the usecase tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    domain::{
        ChatChannel, ConnectionError, ConnectionState, EventHandler, EventKind, InboundEvent,
        OutboundEvent, RoomId, SubscriptionId,
    },
    infrastructure::HandlerRegistry,
};

/// Records emitted events and lets tests push inbound events
pub struct FakeChannel {
    registry: HandlerRegistry,
    state: Mutex<ConnectionState>,
    emitted: Mutex<Vec<OutboundEvent>>,
    rejoin: Mutex<Option<OutboundEvent>>,
    discarded: Mutex<Vec<RoomId>>,
    connect_error: Mutex<Option<ConnectionError>>,
}

impl FakeChannel {
    fn with_state(state: ConnectionState) -> Arc<Self> {
        Arc::new(Self {
            registry: HandlerRegistry::new(),
            state: Mutex::new(state),
            emitted: Mutex::new(Vec::new()),
            rejoin: Mutex::new(None),
            discarded: Mutex::new(Vec::new()),
            connect_error: Mutex::new(None),
        })
    }

    pub fn connected() -> Arc<Self> {
        Self::with_state(ConnectionState::Connected)
    }

    pub fn disconnected() -> Arc<Self> {
        Self::with_state(ConnectionState::Disconnected)
    }

    /// Make the next `connect` calls fail with `error`
    pub fn fail_connect(&self, error: ConnectionError) {
        *self.connect_error.lock().unwrap() = Some(error);
    }

    /// Dispatch an event to the registered handlers, as the transport would
    pub fn deliver(&self, event: InboundEvent) -> usize {
        self.registry.dispatch(&event)
    }

    /// Change the state and notify subscribers
    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap() = state;
        self.registry
            .dispatch(&InboundEvent::ConnectionStateChanged(state));
    }

    pub fn emitted(&self) -> Vec<OutboundEvent> {
        self.emitted.lock().unwrap().clone()
    }

    /// Event the transport would re-announce on the next connect
    pub fn rejoin(&self) -> Option<OutboundEvent> {
        self.rejoin.lock().unwrap().clone()
    }

    /// Rooms whose buffered events were discarded
    pub fn discarded(&self) -> Vec<RoomId> {
        self.discarded.lock().unwrap().clone()
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registry.count(kind)
    }
}

#[async_trait]
impl ChatChannel for FakeChannel {
    async fn connect(&self) -> Result<(), ConnectionError> {
        let failure = self.connect_error.lock().unwrap().clone();
        match failure {
            Some(error) => {
                self.set_state(ConnectionState::Disconnected);
                Err(error)
            }
            None => {
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
        }
    }

    fn emit(&self, event: OutboundEvent) {
        self.emitted.lock().unwrap().push(event);
    }

    fn set_rejoin(&self, event: Option<OutboundEvent>) {
        *self.rejoin.lock().unwrap() = event;
    }

    fn discard_buffered(&self, room_id: &RoomId) -> usize {
        self.discarded.lock().unwrap().push(room_id.clone());
        0
    }

    fn on(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        self.registry.register(kind, handler)
    }

    fn off(&self, id: SubscriptionId) -> bool {
        self.registry.remove(id)
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }
}
