//! Derived view published by the chat controller.

use crate::{
    config::Surface,
    domain::{ConnectionState, DisplayName, HistoryFetchError, Message, Room},
};

/// Everything a UI surface needs to render the active conversation.
///
/// The view is recomputed from the controller's state after every change and
/// published through a `watch` channel; consumers never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatView {
    pub surface: Surface,
    /// Active room with its latest-message summary
    pub room: Option<Room>,
    /// Ordered timeline, pending messages included
    pub messages: Vec<Message>,
    /// The first history fetch of the active room is in flight
    pub loading: bool,
    /// e.g. `Coach is typing...`
    pub typing_label: Option<String>,
    pub connection: ConnectionState,
    /// Set once the channel gave up reconnecting; cleared on the next connect
    pub offline: bool,
    /// Failure of the last history fetch for the active room
    pub history_error: Option<HistoryFetchError>,
}

impl ChatView {
    pub fn typing_label_for(display_name: &DisplayName) -> String {
        format!("{} is typing...", display_name)
    }

    /// `true` while a message of the timeline awaits server confirmation
    pub fn has_pending(&self) -> bool {
        self.messages.iter().any(Message::is_pending)
    }
}
