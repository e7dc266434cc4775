//! `reqwest` implementation of [`HistoryFetcher`].

use async_trait::async_trait;

use crate::{
    domain::{HistoryFetchError, HistoryFetcher, Message, RoomId},
    infrastructure::dto::websocket::MessagePayload,
};

/// Fetches `GET {base_url}/api/rooms/{room_id}/messages`
#[derive(Debug, Clone)]
pub struct HttpHistoryFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHistoryFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn messages_url(&self, room_id: &RoomId) -> String {
        format!("{}/api/rooms/{}/messages", self.base_url, room_id)
    }
}

#[async_trait]
impl HistoryFetcher for HttpHistoryFetcher {
    async fn fetch(&self, room_id: &RoomId) -> Result<Vec<Message>, HistoryFetchError> {
        let url = self.messages_url(room_id);
        tracing::debug!("Fetching history from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HistoryFetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("History request for '{}' returned {}", room_id, status);
            return Err(HistoryFetchError::Status(status.as_u16()));
        }

        let payloads: Vec<MessagePayload> = response
            .json()
            .await
            .map_err(|e| HistoryFetchError::Decode(e.to_string()))?;

        let messages: Vec<Message> = payloads
            .into_iter()
            .filter_map(|payload| {
                let id = payload.id.clone();
                match payload.into_message() {
                    Ok(message) => Some(message),
                    Err(e) => {
                        tracing::warn!("Skipping history record '{}' of room '{}': {}", id, room_id, e);
                        None
                    }
                }
            })
            .collect();

        tracing::info!("Fetched {} messages for room '{}'", messages.len(), room_id);
        Ok(messages)
    }
}
