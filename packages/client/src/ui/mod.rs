//! Terminal front end of the chat client.

pub mod command;
pub mod render;
mod repl;
mod runner;

pub use command::{Command, CommandError};
pub use render::Renderer;
pub use runner::{ClientError, ClientOptions, run};
