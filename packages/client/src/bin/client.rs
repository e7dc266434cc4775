//! Interactive terminal chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kaiwa-client -- --participant-id alice --room room-1 --counterpart coach
//! ```

use clap::Parser;
use kaiwa_client::{
    config::Surface,
    ui::{self, ClientOptions},
};
use kaiwa_shared::logger::setup_logger;

#[derive(Parser)]
#[command(name = "kaiwa-client", about = "Realtime chat client for Kaiwa rooms")]
struct Args {
    /// WebSocket endpoint of the chat server
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    server_url: String,

    /// Base URL of the REST API serving room history
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    history_url: String,

    /// Your participant id
    #[arg(short, long)]
    participant_id: String,

    /// Name shown to the other side while typing (defaults to the participant id)
    #[arg(short, long)]
    display_name: Option<String>,

    /// Room to open at startup
    #[arg(short, long)]
    room: Option<String>,

    /// Participant on the other side of the room
    #[arg(short, long)]
    counterpart: Option<String>,

    #[arg(long, value_enum, default_value_t = Surface::Widget)]
    surface: Surface,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let options = ClientOptions {
        server_url: args.server_url,
        history_url: args.history_url,
        display_name: args.display_name.unwrap_or_else(|| args.participant_id.clone()),
        participant_id: args.participant_id,
        surface: args.surface,
        room: args.room,
        counterpart: args.counterpart,
    };

    if let Err(e) = ui::run(options).await {
        tracing::error!("Client error: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
