//! Incremental terminal rendering of the chat view.

use std::collections::HashSet;

use kaiwa_shared::time::{timestamp_to_jst_clock, timestamp_to_jst_rfc3339};

use crate::{
    config::{ChatContext, Surface},
    domain::{ClientRef, ConnectionState, HistoryFetchError, Message, MessageId, RoomId},
    usecase::ChatView,
};

/// Turns successive views into the lines that are new since the last one.
///
/// A confirmed echo of a message already printed as pending is not printed
/// again; the two share a client reference.
pub struct Renderer {
    context: ChatContext,
    room: Option<RoomId>,
    shown: HashSet<MessageId>,
    shown_refs: HashSet<ClientRef>,
    typing_label: Option<String>,
    connection: ConnectionState,
    offline: bool,
    history_error: Option<HistoryFetchError>,
}

impl Renderer {
    pub fn new(context: ChatContext) -> Self {
        Self {
            context,
            room: None,
            shown: HashSet::new(),
            shown_refs: HashSet::new(),
            typing_label: None,
            connection: ConnectionState::Disconnected,
            offline: false,
            history_error: None,
        }
    }

    pub fn render(&mut self, view: &ChatView) -> Vec<String> {
        let mut lines = Vec::new();

        if view.connection != self.connection {
            lines.push(format!("* {}", view.connection));
            self.connection = view.connection;
        }
        if view.offline && !self.offline {
            lines.push("* offline: the chat server is unreachable (/reconnect)".to_string());
        }
        self.offline = view.offline;

        let room_id = view.room.as_ref().map(|room| room.id.clone());
        if room_id != self.room {
            match &room_id {
                Some(id) => lines.push(format!("--- {} ---", id)),
                None => lines.push("--- no room ---".to_string()),
            }
            self.shown.clear();
            self.shown_refs.clear();
            self.room = room_id;
        }

        if view.history_error != self.history_error {
            if let Some(error) = &view.history_error {
                lines.push(format!("! could not load the history: {} (/retry)", error));
            }
            self.history_error = view.history_error.clone();
        }

        for message in &view.messages {
            if !self.shown.insert(message.id.clone()) {
                continue;
            }
            let echoed = message
                .client_ref
                .is_some_and(|client_ref| !self.shown_refs.insert(client_ref));
            if !echoed {
                lines.push(self.format_message(message));
            }
        }

        if view.typing_label != self.typing_label {
            if let Some(label) = &view.typing_label {
                lines.push(format!("  {}", label));
            }
            self.typing_label = view.typing_label.clone();
        }

        lines
    }

    fn format_message(&self, message: &Message) -> String {
        let pending = if message.is_pending() { " (sending)" } else { "" };
        let millis = message.created_at.value();
        let time = match self.context.surface {
            Surface::Widget => timestamp_to_jst_clock(millis),
            Surface::Console => timestamp_to_jst_rfc3339(millis),
        };
        format!(
            "[{}] {}: {}{}",
            time,
            self.sender_label(message),
            message.body,
            pending
        )
    }

    fn sender_label(&self, message: &Message) -> String {
        let mine = message.sender_id == self.context.participant_id;
        match (self.context.surface, mine) {
            (Surface::Widget, true) => "You".to_string(),
            (Surface::Console, true) => format!("{} (you)", message.sender_id),
            (_, false) => message.sender_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, MessageBody, ParticipantId, Room, Timestamp};

    fn context(surface: Surface) -> ChatContext {
        ChatContext::new(
            ParticipantId::new("alice".to_string()).unwrap(),
            DisplayName::new("Alice".to_string()).unwrap(),
            surface,
        )
    }

    fn room() -> Room {
        Room::new(RoomId::new("r1".to_string()).unwrap(), Vec::new())
    }

    fn message(id: &str, sender: &str, body: &str) -> Message {
        Message::confirmed(
            MessageId::new(id.to_string()).unwrap(),
            RoomId::new("r1".to_string()).unwrap(),
            ParticipantId::new(sender.to_string()).unwrap(),
            MessageBody::new(body.to_string()).unwrap(),
            Timestamp::new(0),
        )
    }

    fn view(messages: Vec<Message>) -> ChatView {
        ChatView {
            room: Some(room()),
            messages,
            connection: ConnectionState::Connected,
            ..ChatView::default()
        }
    }

    #[test]
    fn test_only_new_messages_are_printed() {
        // テスト項目: 2 回目の描画では新しいメッセージだけが出力される
        // given (前提条件):
        let mut renderer = Renderer::new(context(Surface::Console));
        renderer.render(&view(vec![message("m1", "coach", "hi")]));

        // when (操作):
        let lines = renderer.render(&view(vec![
            message("m1", "coach", "hi"),
            message("m2", "coach", "there"),
        ]));

        // then (期待する結果):
        assert_eq!(
            lines,
            vec!["[1970-01-01T09:00:00+09:00] coach: there".to_string()]
        );
    }

    #[test]
    fn test_reconciled_echo_is_not_printed_twice() {
        // テスト項目: 送信中として表示したメッセージが確定しても再表示されない
        // given (前提条件):
        let mut renderer = Renderer::new(context(Surface::Widget));
        let client_ref = ClientRef::generate();
        let pending = Message::pending(
            client_ref,
            RoomId::new("r1".to_string()).unwrap(),
            ParticipantId::new("alice".to_string()).unwrap(),
            MessageBody::new("hello".to_string()).unwrap(),
            Timestamp::new(0),
        );
        let first = renderer.render(&view(vec![pending]));

        // when (操作):
        let echo = message("srv-9", "alice", "hello").with_client_ref(Some(client_ref));
        let second = renderer.render(&view(vec![echo]));

        // then (期待する結果):
        assert_eq!(first.last().unwrap(), "[09:00:00] You: hello (sending)");
        assert!(second.is_empty());
    }

    #[test]
    fn test_status_changes_are_announced_once() {
        // テスト項目: 接続状態・オフライン・入力中表示の変化は一度だけ出力される
        // given (前提条件):
        let mut renderer = Renderer::new(context(Surface::Console));
        let mut offline = view(Vec::new());
        offline.connection = ConnectionState::Disconnected;
        offline.offline = true;
        offline.typing_label = Some("Coach is typing...".to_string());

        // when (操作):
        let first = renderer.render(&offline);
        let second = renderer.render(&offline);

        // then (期待する結果):
        assert!(first.iter().any(|line| line.starts_with("* offline")));
        assert!(first.contains(&"--- r1 ---".to_string()));
        assert!(first.contains(&"  Coach is typing...".to_string()));
        assert!(second.is_empty());
    }
}
