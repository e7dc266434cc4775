//! In-process chat server used by the integration tests.
//!
//! The server relays frames between the connections that joined a room,
//! answers `send_message` with a `receive_message` carrying a server id and
//! the echoed `clientRef`, and serves room history over HTTP.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{
    net::TcpListener,
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tower_http::trace::TraceLayer;

#[derive(Default)]
struct Recorded {
    history: HashMap<String, Vec<Value>>,
    history_status: Option<u16>,
    frames: Vec<Value>,
}

struct FixtureState {
    recorded: Mutex<Recorded>,
    relay: broadcast::Sender<(String, String)>,
    kick: watch::Sender<u64>,
    next_id: AtomicU64,
}

impl FixtureState {
    fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

pub struct TestServer {
    addr: SocketAddr,
    state: Arc<FixtureState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind an ephemeral port and serve in the background
    pub async fn start() -> Self {
        let (relay, _) = broadcast::channel(64);
        let (kick, _) = watch::channel(0);
        let state = Arc::new(FixtureState {
            recorded: Mutex::new(Recorded::default()),
            relay,
            kick,
            next_id: AtomicU64::new(1),
        });

        let app = Router::new()
            .route("/ws", get(websocket_handler))
            .route("/api/rooms/{room_id}/messages", get(history_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// History served for `room_id`
    pub fn seed_history(&self, room_id: &str, messages: Vec<Value>) {
        self.state
            .recorded()
            .history
            .insert(room_id.to_string(), messages);
    }

    /// Answer every history request with `status`
    pub fn fail_history(&self, status: u16) {
        self.state.recorded().history_status = Some(status);
    }

    /// Frames received from clients so far
    pub fn frames(&self) -> Vec<Value> {
        self.state.recorded().frames.clone()
    }

    /// Frames received with the given event name
    pub fn frames_named(&self, event: &str) -> Vec<Value> {
        self.frames()
            .into_iter()
            .filter(|frame| frame["event"] == event)
            .collect()
    }

    /// Wait until `count` frames named `event` were received
    pub async fn wait_for_frames(&self, event: &str, count: usize) -> Vec<Value> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let frames = self.frames_named(event);
                if frames.len() >= count {
                    return frames;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for {} '{}' frame(s)", count, event))
    }

    /// Close every open WebSocket from the server side
    pub fn drop_connections(&self) {
        self.state.kick.send_modify(|generation| *generation += 1);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// JSON of a stored message as the history endpoint returns it
pub fn message_json(id: &str, room_id: &str, sender_id: &str, body: &str, created_at: Value) -> Value {
    json!({
        "id": id,
        "roomId": room_id,
        "senderId": sender_id,
        "body": body,
        "createdAt": created_at,
    })
}

async fn history_handler(
    State(state): State<Arc<FixtureState>>,
    Path(room_id): Path<String>,
) -> Response {
    let recorded = state.recorded();
    if let Some(status) = recorded.history_status {
        return StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response();
    }
    Json(recorded.history.get(&room_id).cloned().unwrap_or_default()).into_response()
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<FixtureState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<FixtureState>) {
    let (mut sink, mut stream) = socket.split();
    let mut relay = state.relay.subscribe();
    let mut kick = state.kick.subscribe();
    let mut participant: Option<String> = None;
    let mut rooms: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let Some(Ok(Message::Text(text))) = incoming else { break };
                let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else { continue };
                state.recorded().frames.push(frame.clone());

                let data = &frame["data"];
                let room = data["roomId"].as_str().unwrap_or_default().to_string();
                match frame["event"].as_str() {
                    Some("join_room") => {
                        participant = data["participantId"].as_str().map(str::to_string);
                        rooms.insert(room);
                    }
                    Some("leave_room") => {
                        rooms.remove(&room);
                    }
                    Some("send_message") => {
                        let id = state.next_id.fetch_add(1, Ordering::Relaxed);
                        let echo = json!({
                            "event": "receive_message",
                            "data": {
                                "id": format!("srv-{}", id),
                                "roomId": room,
                                "senderId": participant,
                                "body": data["body"],
                                "createdAt": chrono::Utc::now().timestamp_millis(),
                                "clientRef": data["clientRef"],
                            }
                        });
                        let _ = state.relay.send((room, echo.to_string()));
                    }
                    Some("typing") | Some("stop_typing") => {
                        let _ = state.relay.send((room, text.as_str().to_string()));
                    }
                    _ => {}
                }
            }
            relayed = relay.recv() => {
                let Ok((room, payload)) = relayed else { break };
                if rooms.contains(&room) && sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            _ = kick.changed() => {
                let _ = sink.close().await;
                break;
            }
        }
    }
}
