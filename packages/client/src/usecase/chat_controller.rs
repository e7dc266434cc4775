//! UseCase: チャット画面のコントローラ
//!
//! The controller owns the state of the active conversation: the room
//! session, the message store, both typing machines and the connection
//! status. All of it is mutated from a single task. Channel handlers and
//! background fetches only post into queues; [`ChatController::process_next`]
//! drains those queues and the timer deadlines one input at a time and
//! republishes the derived [`ChatView`].
//!
//! Opening a room is two-phase: the history fetch is started first, and the
//! room is joined once it completed (successfully or not) for the room that is
//! still active. Completions for a room that was closed or switched away from
//! are discarded.

use std::sync::Arc;

use tokio::{
    sync::{mpsc, watch},
    time::Instant,
};

use crate::{
    config::{ChatContext, ControllerConfig},
    domain::{
        AppendOutcome, ChatChannel, ClientRef, ConnectionError, ConnectionState, EventKind,
        HistoryFetchError, HistoryFetcher, InboundEvent, Message, MessageBody, MessageId,
        MessageStore, OutboundEvent, Room, RoomId, StaleEventError, StoreError, SubscriptionId,
        Timestamp, TypingDebouncer, TypingIndicator,
    },
};

use super::{
    error::{ChatError, ValidationError},
    room_session::RoomSession,
    view::ChatView,
};

/// Which history request a completion answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// First fetch of an activation; hydrates, then joins
    Initial,
    /// User-triggered retry; merged into the hydrated store
    Retry,
}

/// Completion of a background task
enum TaskOutcome {
    History {
        activation: u64,
        room_id: RoomId,
        mode: FetchMode,
        result: Result<Vec<Message>, HistoryFetchError>,
    },
    Connect(Result<(), ConnectionError>),
}

/// What a call to [`ChatController::process_next`] handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    MessageApplied(AppendOutcome),
    MessageRejected(StoreError),
    StaleDiscarded(StaleEventError),
    TypingChanged,
    TypingExpired,
    StopTypingSent,
    HistoryLoaded { room_id: RoomId, count: usize },
    HistoryFailed(HistoryFetchError),
    HistoryDiscarded { room_id: RoomId },
    ConnectionChanged(ConnectionState),
    Connected,
    ConnectFailed(ConnectionError),
    /// Nothing visible changed
    Ignored,
}

/// Orchestrates one chat surface
pub struct ChatController {
    context: ChatContext,
    channel: Arc<dyn ChatChannel>,
    history: Arc<dyn HistoryFetcher>,
    session: RoomSession,
    store: MessageStore,
    typing: TypingIndicator,
    debouncer: TypingDebouncer,
    room: Option<Room>,
    /// Incremented on every `open`; tags history requests
    activation: u64,
    connection: ConnectionState,
    connecting: bool,
    offline: bool,
    history_error: Option<HistoryFetchError>,
    /// Sends made before the first history fetch completed, with their events
    queued_sends: Vec<(Message, OutboundEvent)>,
    inbox: mpsc::UnboundedReceiver<InboundEvent>,
    task_tx: mpsc::UnboundedSender<TaskOutcome>,
    task_rx: mpsc::UnboundedReceiver<TaskOutcome>,
    state_subscription: SubscriptionId,
    view: watch::Sender<ChatView>,
}

impl ChatController {
    pub fn new(
        context: ChatContext,
        config: ControllerConfig,
        channel: Arc<dyn ChatChannel>,
        history: Arc<dyn HistoryFetcher>,
    ) -> Self {
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        let (task_tx, task_rx) = mpsc::unbounded_channel();

        let state_subscription = {
            let inbox_tx = inbox_tx.clone();
            channel.on(
                EventKind::ConnectionStateChanged,
                Arc::new(move |event: &InboundEvent| {
                    let _ = inbox_tx.send(event.clone());
                }),
            )
        };
        let session = RoomSession::new(
            channel.clone(),
            context.participant_id.clone(),
            inbox_tx,
        );

        let connection = channel.connection_state();
        let (view, _) = watch::channel(ChatView {
            surface: context.surface,
            connection,
            ..ChatView::default()
        });

        Self {
            context,
            channel,
            history,
            session,
            store: MessageStore::new(),
            typing: TypingIndicator::new(config.typing_timeout),
            debouncer: TypingDebouncer::new(config.typing_emit_interval, config.stop_typing_after),
            room: None,
            activation: 0,
            connection,
            connecting: false,
            offline: false,
            history_error: None,
            queued_sends: Vec::new(),
            inbox,
            task_tx,
            task_rx,
            state_subscription,
            view,
        }
    }

    /// Receiver of the derived view; the current value is available at once.
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> ChatView {
        self.view.borrow().clone()
    }

    pub fn context(&self) -> &ChatContext {
        &self.context
    }

    pub fn active_room(&self) -> Option<&RoomId> {
        self.room.as_ref().map(|room| &room.id)
    }

    /// Activate `room`: leave the previous one, start the connection if
    /// needed and fetch the history. Joining happens when the fetch completes.
    pub fn open(&mut self, room: Room) {
        if self.active_room() == Some(&room.id) {
            tracing::debug!("Room '{}' is already open", room.id);
            return;
        }

        self.teardown();
        self.ensure_connected();

        self.activation += 1;
        let room_id = room.id.clone();
        tracing::info!("Opening room '{}'", room_id);
        self.room = Some(room);
        self.spawn_history(room_id, FetchMode::Initial);
        self.publish();
    }

    /// Deactivate the current room. Returns `false` if none was open.
    pub fn close(&mut self) -> bool {
        let Some(room_id) = self.active_room().cloned() else {
            return false;
        };
        self.teardown();
        tracing::info!("Closed room '{}'", room_id);
        self.publish();
        true
    }

    /// Validate, show optimistically and emit a message to the counterpart.
    ///
    /// While the room's history is still loading the message is queued; it is
    /// stored and emitted right after the room is joined. Returns the
    /// temporary id of the pending entry.
    pub fn send_message(&mut self, text: &str) -> Result<MessageId, ChatError> {
        let body = MessageBody::new(text.to_string()).map_err(ValidationError::from)?;
        let room = self.room.as_ref().ok_or(ChatError::NoActiveRoom)?;
        let room_id = room.id.clone();
        let recipient_id = room.counterpart_of(&self.context.participant_id).cloned();

        if self.debouncer.finish() {
            self.emit_stop_typing();
        }

        let client_ref = ClientRef::generate();
        let message = Message::pending(
            client_ref,
            room_id.clone(),
            self.context.participant_id.clone(),
            body.clone(),
            Timestamp::now(),
        );
        let pending_id = message.id.clone();
        let event = OutboundEvent::SendMessage {
            room_id: room_id.clone(),
            recipient_id,
            body,
            client_ref,
        };

        if self.store.room_id() != Some(&room_id) {
            tracing::debug!("Room '{}' is loading, queueing message", room_id);
            self.queued_sends.push((message, event));
        } else {
            self.apply_message(message)?;
            self.channel.emit(event);
        }
        self.publish();
        Ok(pending_id)
    }

    /// Local keystroke. Returns `true` if a "typing" event was emitted.
    pub fn notify_typing(&mut self) -> bool {
        let Some(room) = &self.room else {
            return false;
        };
        if !self.debouncer.on_keystroke(Instant::now()) {
            return false;
        }
        self.channel.emit(OutboundEvent::Typing {
            room_id: room.id.clone(),
            display_name: self.context.display_name.clone(),
        });
        true
    }

    /// Fetch the history of the active room again and merge the result.
    ///
    /// Returns `false` while no room is open or its first fetch is in flight.
    pub fn retry_history(&mut self) -> bool {
        let Some(room_id) = self.active_room().cloned() else {
            return false;
        };
        if self.store.room_id() != Some(&room_id) {
            tracing::debug!("History of room '{}' is still loading", room_id);
            return false;
        }
        tracing::info!("Retrying history of room '{}'", room_id);
        self.spawn_history(room_id, FetchMode::Retry);
        true
    }

    /// Start connecting unless the channel is already up or on its way.
    pub fn reconnect(&mut self) -> bool {
        self.ensure_connected()
    }

    /// Wait for the next input and apply it.
    pub async fn process_next(&mut self) -> Step {
        let typing_deadline = self.typing.deadline();
        let stop_deadline = self.debouncer.deadline();

        tokio::select! {
            Some(event) = self.inbox.recv() => self.on_inbound(event),
            Some(outcome) = self.task_rx.recv() => self.on_task(outcome),
            () = sleep_until(typing_deadline) => self.on_typing_deadline(),
            () = sleep_until(stop_deadline) => self.on_stop_deadline(),
        }
    }

    fn on_inbound(&mut self, event: InboundEvent) -> Step {
        let event = match self.session.accept(event) {
            Ok(event) => event,
            Err(stale) => {
                tracing::debug!("Discarding event: {}", stale);
                return Step::StaleDiscarded(stale);
            }
        };

        match event {
            InboundEvent::Message(message) => self.on_message(message),
            InboundEvent::Typing(event) | InboundEvent::StopTyping(event)
                if event.display_name == self.context.display_name =>
            {
                Step::Ignored
            }
            InboundEvent::Typing(event) => {
                if self.typing.on_typing(event.display_name, Instant::now()) {
                    self.publish();
                    Step::TypingChanged
                } else {
                    Step::Ignored
                }
            }
            InboundEvent::StopTyping(_) => {
                if self.typing.on_stop_typing() {
                    self.publish();
                    Step::TypingChanged
                } else {
                    Step::Ignored
                }
            }
            InboundEvent::ConnectionStateChanged(state) => self.on_connection_state(state),
        }
    }

    fn on_message(&mut self, message: Message) -> Step {
        match self.apply_message(message) {
            Ok(outcome) => {
                self.publish();
                Step::MessageApplied(outcome)
            }
            Err(error) => Step::MessageRejected(error),
        }
    }

    fn on_connection_state(&mut self, state: ConnectionState) -> Step {
        tracing::debug!("Connection state: {} -> {}", self.connection, state);
        self.connection = state;
        match state {
            ConnectionState::Connected => self.offline = false,
            ConnectionState::Disconnected => self.offline = true,
            ConnectionState::Connecting => {}
        }
        self.publish();
        Step::ConnectionChanged(state)
    }

    fn on_task(&mut self, outcome: TaskOutcome) -> Step {
        match outcome {
            TaskOutcome::History {
                activation,
                room_id,
                mode,
                result,
            } => self.on_history(activation, room_id, mode, result),
            TaskOutcome::Connect(result) => {
                self.connecting = false;
                match result {
                    Ok(()) => Step::Connected,
                    Err(error) => {
                        tracing::warn!("Could not connect: {}", error);
                        self.offline = true;
                        self.publish();
                        Step::ConnectFailed(error)
                    }
                }
            }
        }
    }

    fn on_history(
        &mut self,
        activation: u64,
        room_id: RoomId,
        mode: FetchMode,
        result: Result<Vec<Message>, HistoryFetchError>,
    ) -> Step {
        if activation != self.activation || self.active_room() != Some(&room_id) {
            tracing::debug!("Discarding history of inactive room '{}'", room_id);
            return Step::HistoryDiscarded { room_id };
        }

        let step = match (mode, result) {
            (FetchMode::Initial, Ok(messages)) => {
                self.store.hydrate(room_id.clone(), messages);
                self.history_error = None;
                Step::HistoryLoaded {
                    room_id: room_id.clone(),
                    count: self.store.len(),
                }
            }
            (FetchMode::Initial, Err(error)) => {
                tracing::warn!("Failed to load history of room '{}': {}", room_id, error);
                self.store.hydrate(room_id.clone(), Vec::new());
                self.history_error = Some(error.clone());
                Step::HistoryFailed(error)
            }
            (FetchMode::Retry, Ok(messages)) => {
                let count = self.store.extend(messages);
                self.history_error = None;
                Step::HistoryLoaded {
                    room_id: room_id.clone(),
                    count,
                }
            }
            (FetchMode::Retry, Err(error)) => {
                tracing::warn!("Retry of room '{}' history failed: {}", room_id, error);
                self.history_error = Some(error.clone());
                Step::HistoryFailed(error)
            }
        };

        if let (Some(room), Some(last)) = (self.room.as_mut(), self.store.snapshot().last()) {
            room.observe(last);
        }
        if mode == FetchMode::Initial {
            self.session.join(room_id);
            self.flush_queued_sends();
        }
        self.publish();
        step
    }

    fn on_typing_deadline(&mut self) -> Step {
        if self.typing.expire(Instant::now()) {
            self.publish();
            Step::TypingExpired
        } else {
            Step::Ignored
        }
    }

    fn on_stop_deadline(&mut self) -> Step {
        if self.debouncer.poll_stop(Instant::now()) {
            self.emit_stop_typing();
            Step::StopTypingSent
        } else {
            Step::Ignored
        }
    }

    fn apply_message(&mut self, message: Message) -> Result<AppendOutcome, StoreError> {
        let id = message.id.clone();
        let summary = message.clone();
        match self.store.append(message) {
            Ok(outcome) => {
                if let Some(room) = self.room.as_mut() {
                    room.observe(&summary);
                }
                Ok(outcome)
            }
            Err(error) => {
                tracing::warn!("Message '{}' not applied: {}", id, error);
                Err(error)
            }
        }
    }

    fn flush_queued_sends(&mut self) {
        for (message, event) in std::mem::take(&mut self.queued_sends) {
            if self.apply_message(message).is_ok() {
                self.channel.emit(event);
            }
        }
    }

    fn emit_stop_typing(&self) {
        if let Some(room) = &self.room {
            self.channel.emit(OutboundEvent::StopTyping {
                room_id: room.id.clone(),
                display_name: self.context.display_name.clone(),
            });
        }
    }

    fn ensure_connected(&mut self) -> bool {
        if self.connecting || self.channel.connection_state() != ConnectionState::Disconnected {
            return false;
        }
        self.connecting = true;
        let channel = self.channel.clone();
        let task_tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = channel.connect().await;
            let _ = task_tx.send(TaskOutcome::Connect(result));
        });
        true
    }

    fn spawn_history(&self, room_id: RoomId, mode: FetchMode) {
        let history = self.history.clone();
        let task_tx = self.task_tx.clone();
        let activation = self.activation;
        tokio::spawn(async move {
            let result = history.fetch(&room_id).await;
            let _ = task_tx.send(TaskOutcome::History {
                activation,
                room_id,
                mode,
                result,
            });
        });
    }

    /// Stop typing, leave and forget everything tied to the active room.
    fn teardown(&mut self) {
        if self.room.is_none() {
            return;
        }
        if self.debouncer.finish() {
            self.emit_stop_typing();
        }
        self.session.leave();
        self.room = None;
        self.store.clear();
        self.typing.reset();
        self.debouncer.reset();
        self.history_error = None;
        self.queued_sends.clear();
    }

    fn render(&self) -> ChatView {
        ChatView {
            surface: self.context.surface,
            room: self.room.clone(),
            messages: self
                .store
                .snapshot()
                .iter()
                .chain(self.queued_sends.iter().map(|(message, _)| message))
                .cloned()
                .collect(),
            loading: self
                .room
                .as_ref()
                .is_some_and(|room| self.store.room_id() != Some(&room.id)),
            typing_label: self.typing.typing_name().map(ChatView::typing_label_for),
            connection: self.connection,
            offline: self.offline,
            history_error: self.history_error.clone(),
        }
    }

    fn publish(&self) {
        let next = self.render();
        self.view.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

impl Drop for ChatController {
    fn drop(&mut self) {
        self.channel.off(self.state_subscription);
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
