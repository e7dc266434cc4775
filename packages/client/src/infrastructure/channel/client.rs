//! WebSocket implementation of [`ChatChannel`].
//!
//! One `ChannelClient` owns one connection. `connect` performs the first
//! connection (with backoff) and spawns the IO driver; the driver forwards
//! outbound events to the socket, decodes inbound frames for the handler
//! registry and reconnects on transport loss until the retry budget runs out.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsMessage,
};

use super::{config::ChannelConfig, registry::HandlerRegistry};
use crate::{
    domain::{
        ChatChannel, ConnectionError, ConnectionState, EventHandler, EventKind, InboundEvent,
        OutboundEvent, RoomId, SubscriptionId,
    },
    infrastructure::dto::websocket::{decode, encode},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound events: the live writer while connected, the buffer otherwise
#[derive(Default)]
struct Outbox {
    writer: Option<mpsc::UnboundedSender<OutboundEvent>>,
    buffered: VecDeque<OutboundEvent>,
    /// Membership re-announced on attach before the buffer is flushed
    rejoin: Option<OutboundEvent>,
}

impl Outbox {
    fn trim_to(&mut self, capacity: usize) {
        while self.buffered.len() > capacity {
            if let Some(dropped) = self.buffered.pop_front() {
                tracing::warn!(
                    "Outbound buffer full ({}), dropped oldest '{}' event",
                    capacity,
                    dropped.name()
                );
            }
        }
    }
}

/// Why the IO loop stopped
struct Disconnect {
    reason: String,
    /// Event taken from the queue whose write failed
    unsent: Option<OutboundEvent>,
}

struct Inner {
    config: ChannelConfig,
    registry: HandlerRegistry,
    state: watch::Sender<ConnectionState>,
    outbox: Mutex<Outbox>,
    last_error: Mutex<Option<ConnectionError>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    connect_lock: tokio::sync::Mutex<()>,
}

/// WebSocket channel with reconnect and a bounded outbound buffer
#[derive(Clone)]
pub struct ChannelClient {
    inner: Arc<Inner>,
}

impl ChannelClient {
    pub fn new(config: ChannelConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                config,
                registry: HandlerRegistry::new(),
                state,
                outbox: Mutex::new(Outbox::default()),
                last_error: Mutex::new(None),
                driver: Mutex::new(None),
                connect_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.inner.config
    }

    /// Watch connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Number of events waiting for a connection
    pub fn buffered_len(&self) -> usize {
        self.inner.lock_outbox().buffered.len()
    }

    /// Stop the IO driver and close the socket. Buffered events are kept.
    pub fn disconnect(&self) {
        if let Some(handle) = lock(&self.inner.driver).take() {
            handle.abort();
        }
        self.inner.lock_outbox().writer = None;
        self.inner.set_state(ConnectionState::Disconnected);
    }

    fn driver_running(&self) -> bool {
        lock(&self.inner.driver)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for an in-flight reconnect of the driver to settle.
    async fn wait_for_driver(&self) -> Result<(), ConnectionError> {
        let mut state = self.subscribe_state();
        let settled = state
            .wait_for(|s| *s != ConnectionState::Connecting)
            .await
            .map(|s| *s)
            .unwrap_or(ConnectionState::Disconnected);
        if settled == ConnectionState::Connected {
            return Ok(());
        }
        Err(lock(&self.inner.last_error)
            .clone()
            .unwrap_or(ConnectionError::Closed))
    }
}

#[async_trait]
impl ChatChannel for ChannelClient {
    async fn connect(&self) -> Result<(), ConnectionError> {
        let _guard = self.inner.connect_lock.lock().await;
        if *self.inner.state.borrow() == ConnectionState::Connected {
            return Ok(());
        }
        if self.driver_running() {
            return self.wait_for_driver().await;
        }

        self.inner.set_state(ConnectionState::Connecting);
        let stream = match establish(&self.inner.config).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("Could not connect to '{}': {}", self.inner.config.url, e);
                *lock(&self.inner.last_error) = Some(e.clone());
                self.inner.set_state(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        let outbound = self.inner.attach();
        let handle = tokio::spawn(drive(self.inner.clone(), stream, outbound));
        *lock(&self.inner.driver) = Some(handle);
        Ok(())
    }

    fn emit(&self, event: OutboundEvent) {
        let capacity = self.inner.config.outbox_capacity;
        let mut outbox = self.inner.lock_outbox();
        let event = match &outbox.writer {
            Some(writer) => match writer.send(event) {
                Ok(()) => return,
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };
        tracing::debug!("Not connected, buffering '{}' event", event.name());
        outbox.buffered.push_back(event);
        outbox.trim_to(capacity);
    }

    fn set_rejoin(&self, event: Option<OutboundEvent>) {
        self.inner.lock_outbox().rejoin = event;
    }

    fn discard_buffered(&self, room_id: &RoomId) -> usize {
        let mut outbox = self.inner.lock_outbox();
        let before = outbox.buffered.len();
        outbox.buffered.retain(|event| event.room_id() != room_id);
        let dropped = before - outbox.buffered.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} buffered events of room '{}'", dropped, room_id);
        }
        dropped
    }

    fn on(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        self.inner.registry.register(kind, handler)
    }

    fn off(&self, id: SubscriptionId) -> bool {
        self.inner.registry.remove(id)
    }

    fn connection_state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }
}

impl Inner {
    fn lock_outbox(&self) -> MutexGuard<'_, Outbox> {
        lock(&self.outbox)
    }

    fn set_state(&self, next: ConnectionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::info!("Channel {}", next);
            self.registry
                .dispatch(&InboundEvent::ConnectionStateChanged(next));
        }
    }

    /// Install a fresh writer, flush the buffer into it and report connected.
    ///
    /// The rejoin event is written before any buffered event.
    fn attach(&self) -> mpsc::UnboundedReceiver<OutboundEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut outbox = self.lock_outbox();
            if let Some(rejoin) = outbox.rejoin.clone() {
                outbox.buffered.retain(|event| *event != rejoin);
                tracing::debug!(
                    "Re-announcing '{}' for room '{}'",
                    rejoin.name(),
                    rejoin.room_id()
                );
                let _ = tx.send(rejoin);
            }
            let flushed = outbox.buffered.len();
            for event in outbox.buffered.drain(..) {
                // rx is alive, send cannot fail
                let _ = tx.send(event);
            }
            outbox.writer = Some(tx);
            if flushed > 0 {
                tracing::info!("Flushing {} buffered events", flushed);
            }
        }
        *lock(&self.last_error) = None;
        self.set_state(ConnectionState::Connected);
        rx
    }

    /// Drop the writer and move everything not yet written back to the buffer.
    fn detach(
        &self,
        mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
        unsent: Option<OutboundEvent>,
    ) {
        let mut outbox = self.lock_outbox();
        outbox.writer = None;
        let mut requeued: Vec<OutboundEvent> = unsent.into_iter().collect();
        while let Ok(event) = outbound.try_recv() {
            requeued.push(event);
        }
        for event in requeued.into_iter().rev() {
            outbox.buffered.push_front(event);
        }
        outbox.trim_to(self.config.outbox_capacity);
    }

    fn deliver(&self, text: &str) {
        match decode(text) {
            Ok(event) => {
                let handled = self.registry.dispatch(&event);
                if handled == 0 {
                    tracing::debug!("No handler for {:?}", event.kind());
                }
            }
            Err(e) => tracing::warn!("Dropping inbound frame: {}", e),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Open the socket, retrying with exponential backoff.
async fn establish(config: &ChannelConfig) -> Result<WsStream, ConnectionError> {
    let policy = config.retry;
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match connect_async(config.url.as_str()).await {
            Ok((stream, _response)) => {
                tracing::info!("Connected to '{}' (attempt {})", config.url, attempt);
                return Ok(stream);
            }
            Err(e) if attempt >= max_attempts => {
                return Err(ConnectionError::RetriesExhausted {
                    attempts: attempt,
                    last_error: e.to_string(),
                });
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    "Connection attempt {}/{} to '{}' failed: {}. Retrying in {:?}",
                    attempt,
                    max_attempts,
                    config.url,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// IO driver: pump the socket, reconnect on loss, stop when the budget is spent.
async fn drive(
    inner: Arc<Inner>,
    mut stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<OutboundEvent>,
) {
    loop {
        let disconnect = pump(&inner, stream, &mut outbound).await;
        tracing::warn!("Connection lost: {}", disconnect.reason);
        inner.detach(outbound, disconnect.unsent);
        inner.set_state(ConnectionState::Connecting);

        match establish(&inner.config).await {
            Ok(next) => {
                stream = next;
                outbound = inner.attach();
            }
            Err(e) => {
                tracing::error!("Giving up reconnecting: {}", e);
                *lock(&inner.last_error) = Some(e);
                inner.set_state(ConnectionState::Disconnected);
                return;
            }
        }
    }
}

async fn pump(
    inner: &Inner,
    stream: WsStream,
    outbound: &mut mpsc::UnboundedReceiver<OutboundEvent>,
) -> Disconnect {
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            event = outbound.recv() => {
                let Some(event) = event else {
                    return Disconnect { reason: "writer dropped".to_string(), unsent: None };
                };
                let text = match encode(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to encode '{}' event: {}", event.name(), e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                    return Disconnect { reason: e.to_string(), unsent: Some(event) };
                }
                tracing::debug!("Sent '{}' event", event.name());
            }
            frame = source.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => inner.deliver(text.as_str()),
                Some(Ok(WsMessage::Close(_))) | None => {
                    return Disconnect { reason: "closed by server".to_string(), unsent: None };
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Disconnect { reason: e.to_string(), unsent: None };
                }
            },
        }
    }
}
