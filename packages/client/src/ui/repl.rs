//! Line editor running on a blocking thread.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use super::command::Command;

/// Start reading lines with `prompt` and forward the parsed commands.
///
/// Ctrl-C and Ctrl-D are reported as [`Command::Quit`]. The reader stops after
/// `Quit` or once the receiver is dropped.
pub fn spawn(prompt: String) -> Result<mpsc::UnboundedReceiver<Command>, ReadlineError> {
    let mut editor = DefaultEditor::new()?;
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::task::spawn_blocking(move || {
        loop {
            let command = match editor.readline(&prompt) {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    match Command::parse(&line) {
                        Ok(Some(command)) => command,
                        Ok(None) => continue,
                        Err(e) => {
                            eprintln!("{}", e);
                            continue;
                        }
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => Command::Quit,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    Command::Quit
                }
            };

            let quit = command == Command::Quit;
            if tx.send(command).is_err() || quit {
                break;
            }
        }
    });

    Ok(rx)
}
