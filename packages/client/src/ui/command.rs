//! Input line parsing for the terminal client.

use thiserror::Error;

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text: send it to the active room
    Say(String),
    Join {
        room: String,
        counterpart: Option<String>,
    },
    Leave,
    Retry,
    Reconnect,
    /// Simulated keystroke
    Typing,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: /join <room> [counterpart]")]
    MissingRoom,

    #[error("Unknown command '{0}' (try /help)")]
    Unknown(String),
}

pub const HELP: &str = "\
/join <room> [counterpart]  open a room
/leave                      close the active room
/retry                      reload the history after a failure
/reconnect                  connect again after going offline
/typing                     send a typing notification
/quit                       exit
anything else is sent as a message";

impl Command {
    /// Parse one line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Ok(Some(Self::Say(line.to_string())));
        };

        let mut words = rest.split_whitespace();
        let command = match words.next().unwrap_or_default() {
            "join" | "j" => {
                let room = words.next().ok_or(CommandError::MissingRoom)?;
                Self::Join {
                    room: room.to_string(),
                    counterpart: words.next().map(str::to_string),
                }
            }
            "leave" => Self::Leave,
            "retry" => Self::Retry,
            "reconnect" => Self::Reconnect,
            "typing" => Self::Typing,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}
