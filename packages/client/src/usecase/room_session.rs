//! UseCase: ルーム参加状態の管理
//!
//! A session binds the channel to at most one room at a time. While joined it
//! keeps handlers for the room-scoped events registered and forwards every
//! delivery into the controller's inbox; leaving removes exactly those
//! handlers. Events whose room is not the joined one are rejected by
//! [`RoomSession::accept`].
//!
//! The joined room's `join_room` is also registered as the channel's rejoin
//! event, so every reconnect re-announces membership before buffered room
//! traffic is written.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::{
    ChatChannel, ConnectionState, EventHandler, EventKind, InboundEvent, OutboundEvent,
    ParticipantId, RoomId, StaleEventError, SubscriptionId,
};

/// Room-scoped events a joined session listens to
const ROOM_EVENTS: [EventKind; 3] = [
    EventKind::ReceiveMessage,
    EventKind::Typing,
    EventKind::StopTyping,
];

/// Result of [`RoomSession::join`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    /// The room was already joined; nothing was emitted
    AlreadyJoined,
    /// Another room was left first
    Switched { previous: RoomId },
}

/// Membership of one participant in at most one room
pub struct RoomSession {
    channel: Arc<dyn ChatChannel>,
    participant_id: ParticipantId,
    inbox: mpsc::UnboundedSender<InboundEvent>,
    joined: Option<RoomId>,
    subscriptions: Vec<SubscriptionId>,
}

impl RoomSession {
    pub fn new(
        channel: Arc<dyn ChatChannel>,
        participant_id: ParticipantId,
        inbox: mpsc::UnboundedSender<InboundEvent>,
    ) -> Self {
        Self {
            channel,
            participant_id,
            inbox,
            joined: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn joined_room(&self) -> Option<&RoomId> {
        self.joined.as_ref()
    }

    /// Join `room_id`, leaving the current room first if it differs.
    pub fn join(&mut self, room_id: RoomId) -> JoinOutcome {
        if self.joined.as_ref() == Some(&room_id) {
            tracing::debug!("Room '{}' is already joined", room_id);
            return JoinOutcome::AlreadyJoined;
        }

        let previous = self.joined.clone();
        self.leave();

        for kind in ROOM_EVENTS {
            let id = self.channel.on(kind, self.forwarder());
            self.subscriptions.push(id);
        }
        let join = OutboundEvent::JoinRoom {
            room_id: room_id.clone(),
            participant_id: self.participant_id.clone(),
        };
        self.channel.set_rejoin(Some(join.clone()));
        self.channel.emit(join);
        tracing::info!(
            "Participant '{}' joined room '{}'",
            self.participant_id,
            room_id
        );
        self.joined = Some(room_id);

        match previous {
            Some(previous) => JoinOutcome::Switched { previous },
            None => JoinOutcome::Joined,
        }
    }

    /// Leave the joined room and drop its handlers.
    ///
    /// `leave_room` is only emitted while connected; a fresh connection holds
    /// no membership, so while disconnected the room's buffered events are
    /// dropped instead. Returns `false` if no room was joined.
    pub fn leave(&mut self) -> bool {
        let Some(room_id) = self.joined.take() else {
            return false;
        };
        self.release_handlers();
        self.channel.set_rejoin(None);
        if self.channel.connection_state() == ConnectionState::Connected {
            self.channel.emit(OutboundEvent::LeaveRoom {
                room_id: room_id.clone(),
                participant_id: self.participant_id.clone(),
            });
        } else {
            self.channel.discard_buffered(&room_id);
        }
        tracing::info!(
            "Participant '{}' left room '{}'",
            self.participant_id,
            room_id
        );
        true
    }

    /// Pass through events of the joined room and channel-level events.
    pub fn accept(&self, event: InboundEvent) -> Result<InboundEvent, StaleEventError> {
        match event.room_id() {
            None => Ok(event),
            Some(room_id) if self.joined.as_ref() == Some(room_id) => Ok(event),
            Some(room_id) => Err(StaleEventError {
                event_room: room_id.clone(),
                active_room: self.joined.clone(),
            }),
        }
    }

    fn forwarder(&self) -> EventHandler {
        let inbox = self.inbox.clone();
        Arc::new(move |event: &InboundEvent| {
            // receiver gone means the controller was dropped
            let _ = inbox.send(event.clone());
        })
    }

    fn release_handlers(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.channel.off(id);
        }
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        self.release_handlers();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DisplayName, Message, MessageBody, MessageId, Timestamp, TypingEvent},
        usecase::testing::FakeChannel,
    };

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn me() -> ParticipantId {
        ParticipantId::new("alice".to_string()).unwrap()
    }

    fn message_in(room_id: &str) -> InboundEvent {
        InboundEvent::Message(Message::confirmed(
            MessageId::new("m1".to_string()).unwrap(),
            room(room_id),
            ParticipantId::new("coach".to_string()).unwrap(),
            MessageBody::new("hi".to_string()).unwrap(),
            Timestamp::new(1),
        ))
    }

    fn session(channel: &Arc<FakeChannel>) -> (RoomSession, mpsc::UnboundedReceiver<InboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RoomSession::new(channel.clone(), me(), tx), rx)
    }

    #[test]
    fn test_join_registers_handlers_and_emits_join() {
        // テスト項目: join でハンドラが登録され join_room が送信される
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, _rx) = session(&channel);

        // when (操作):
        let outcome = session.join(room("r1"));

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Joined);
        assert_eq!(session.joined_room(), Some(&room("r1")));
        assert_eq!(channel.handler_count(EventKind::ReceiveMessage), 1);
        assert_eq!(channel.handler_count(EventKind::Typing), 1);
        assert_eq!(channel.handler_count(EventKind::StopTyping), 1);
        assert_eq!(
            channel.emitted(),
            vec![OutboundEvent::JoinRoom {
                room_id: room("r1"),
                participant_id: me(),
            }]
        );
    }

    #[test]
    fn test_join_same_room_is_noop() {
        // テスト項目: 同じルームへの再 join は何もしない
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, _rx) = session(&channel);
        session.join(room("r1"));

        // when (操作):
        let outcome = session.join(room("r1"));

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::AlreadyJoined);
        assert_eq!(channel.emitted().len(), 1);
        assert_eq!(channel.handler_count(EventKind::ReceiveMessage), 1);
    }

    #[test]
    fn test_join_other_room_leaves_previous_first() {
        // テスト項目: 別ルームへの join は先に leave してから join する
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, _rx) = session(&channel);
        session.join(room("a"));

        // when (操作):
        let outcome = session.join(room("b"));

        // then (期待する結果):
        assert_eq!(outcome, JoinOutcome::Switched { previous: room("a") });
        let names: Vec<&str> = channel.emitted().iter().map(OutboundEvent::name).collect();
        assert_eq!(names, vec!["join_room", "leave_room", "join_room"]);
        assert_eq!(channel.handler_count(EventKind::ReceiveMessage), 1);
    }

    #[test]
    fn test_leave_removes_handlers() {
        // テスト項目: leave 後は配信されたイベントが転送されない
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, mut rx) = session(&channel);
        session.join(room("r1"));

        // when (操作):
        let left = session.leave();
        let delivered = channel.deliver(message_in("r1"));

        // then (期待する結果):
        assert!(left);
        assert!(!session.leave());
        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_leave_while_disconnected_discards_buffered_events() {
        // テスト項目: 切断中の leave は leave_room を送信せず、そのルームのバッファを破棄する
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, _rx) = session(&channel);
        session.join(room("r1"));
        channel.set_state(ConnectionState::Disconnected);

        // when (操作):
        session.leave();

        // then (期待する結果): バッファ済みの r1 宛てイベントも破棄される
        let names: Vec<&str> = channel.emitted().iter().map(OutboundEvent::name).collect();
        assert_eq!(names, vec!["join_room"]);
        assert_eq!(channel.discarded(), vec![room("r1")]);
        assert_eq!(channel.rejoin(), None);
    }

    #[test]
    fn test_handlers_forward_into_inbox() {
        // テスト項目: 参加中ルームのイベントがインボックスに転送される
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, mut rx) = session(&channel);
        session.join(room("r1"));

        // when (操作):
        channel.deliver(message_in("r1"));

        // then (期待する結果):
        let event = rx.try_recv().unwrap();
        assert_eq!(event, message_in("r1"));
        assert!(session.accept(event).is_ok());
    }

    #[test]
    fn test_accept_rejects_other_room() {
        // テスト項目: 参加中でないルームのイベントは StaleEventError になる
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, _rx) = session(&channel);
        session.join(room("a"));
        session.join(room("b"));

        // when (操作):
        let typing = InboundEvent::Typing(TypingEvent::new(
            room("a"),
            DisplayName::new("Coach".to_string()).unwrap(),
        ));
        let result = session.accept(typing);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(StaleEventError {
                event_room: room("a"),
                active_room: Some(room("b")),
            })
        );
    }

    #[test]
    fn test_accept_passes_connection_events() {
        // テスト項目: ルームに属さない接続状態イベントは常に通過する
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (session, _rx) = session(&channel);

        // when (操作):
        let event = InboundEvent::ConnectionStateChanged(ConnectionState::Connecting);

        // then (期待する結果):
        assert!(session.accept(event).is_ok());
    }

    #[test]
    fn test_joined_room_is_registered_for_rejoin() {
        // テスト項目: 参加中ルームの join_room が再接続時の再参加イベントとして登録され、leave で解除される
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, _rx) = session(&channel);

        // when (操作):
        session.join(room("r1"));
        let registered = channel.rejoin();
        session.leave();

        // then (期待する結果):
        assert_eq!(
            registered,
            Some(OutboundEvent::JoinRoom {
                room_id: room("r1"),
                participant_id: me(),
            })
        );
        assert_eq!(channel.rejoin(), None);
    }

    #[test]
    fn test_drop_releases_handlers() {
        // テスト項目: セッション破棄時にハンドラが解除される
        // given (前提条件):
        let channel = FakeChannel::connected();
        let (mut session, _rx) = session(&channel);
        session.join(room("r1"));

        // when (操作):
        drop(session);

        // then (期待する結果):
        assert_eq!(channel.handler_count(EventKind::ReceiveMessage), 0);
        assert_eq!(channel.handler_count(EventKind::Typing), 0);
    }
}
