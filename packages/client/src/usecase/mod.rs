//! UseCase layer: room membership and the chat controller.

pub mod chat_controller;
pub mod error;
pub mod room_session;
#[cfg(test)]
pub(crate) mod testing;
pub mod view;

pub use chat_controller::{ChatController, Step};
pub use error::{ChatError, ValidationError};
pub use room_session::{JoinOutcome, RoomSession};
pub use view::ChatView;
