//! Wires the controller to the WebSocket channel, the history endpoint and the
//! terminal.

use std::sync::Arc;

use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::{
    config::{ChatContext, ControllerConfig, Surface},
    domain::{DisplayName, ParticipantId, Room, RoomId, ValueObjectError},
    infrastructure::{ChannelClient, ChannelConfig, HttpHistoryFetcher},
    usecase::{ChatController, ChatError},
};

use super::{
    command::{Command, HELP},
    render::Renderer,
    repl,
};

/// Settings of one terminal session
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// WebSocket endpoint
    pub server_url: String,
    /// Base URL of the REST API serving the history
    pub history_url: String,
    pub participant_id: String,
    pub display_name: String,
    pub surface: Surface,
    /// Room opened at startup
    pub room: Option<String>,
    pub counterpart: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValueObjectError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Failed to start the line editor: {0}")]
    Editor(#[from] ReadlineError),
}

/// Run the interactive client until the user quits.
pub async fn run(options: ClientOptions) -> Result<(), ClientError> {
    let context = ChatContext::new(
        ParticipantId::new(options.participant_id)?,
        DisplayName::new(options.display_name)?,
        options.surface,
    );

    let channel = Arc::new(ChannelClient::new(ChannelConfig::new(options.server_url)));
    let history = Arc::new(HttpHistoryFetcher::new(options.history_url));
    let mut controller = ChatController::new(
        context.clone(),
        ControllerConfig::default(),
        channel.clone(),
        history,
    );
    let mut views = controller.subscribe();
    let mut renderer = Renderer::new(context.clone());

    match options.room {
        Some(room) => controller.open(build_room(&context, room, options.counterpart)?),
        None => {
            controller.reconnect();
        }
    }

    let mut commands = repl::spawn(format!("{}> ", context.display_name))?;
    tracing::info!(
        "Client '{}' started ({:?} surface)",
        context.participant_id,
        context.surface
    );

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                if command == Command::Quit {
                    break;
                }
                if let Err(e) = apply(&mut controller, &context, command) {
                    println!("! {}", e);
                }
            }
            _ = controller.process_next() => {}
            Ok(()) = views.changed() => {
                for line in renderer.render(&views.borrow_and_update()) {
                    println!("{}", line);
                }
            }
        }
    }

    controller.close();
    channel.disconnect();
    tracing::info!("Client '{}' stopped", context.participant_id);
    Ok(())
}

fn apply(
    controller: &mut ChatController,
    context: &ChatContext,
    command: Command,
) -> Result<(), ClientError> {
    match command {
        Command::Say(text) => {
            controller.send_message(&text)?;
        }
        Command::Join { room, counterpart } => {
            controller.open(build_room(context, room, counterpart)?);
        }
        Command::Leave => {
            if !controller.close() {
                println!("No room is open");
            }
        }
        Command::Retry => {
            if !controller.retry_history() {
                println!("Nothing to retry");
            }
        }
        Command::Reconnect => {
            if !controller.reconnect() {
                println!("Already connected or connecting");
            }
        }
        Command::Typing => {
            controller.notify_typing();
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

/// Room made of the local participant and an optional counterpart
fn build_room(
    context: &ChatContext,
    room: String,
    counterpart: Option<String>,
) -> Result<Room, ValueObjectError> {
    let mut participants = vec![context.participant_id.clone()];
    if let Some(counterpart) = counterpart {
        participants.push(ParticipantId::new(counterpart)?);
    }
    Ok(Room::new(RoomId::new(room)?, participants))
}
