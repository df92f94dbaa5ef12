use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::backend::error::{BridgeError, Result};
use crate::backend::session::{CommentSource, CommentStreamEvent, IncomingComment};

/// Frame published by the live-feed relay: `{"event": "...", "data": {...}}`
#[derive(Debug, Deserialize)]
struct RelayFrame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayUser {
    #[serde(default)]
    unique_id: String,
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    comment: String,
}

/// What a single relay frame means for the comment stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayUpdate {
    Event(CommentStreamEvent),
    Ended,
    Ignored,
}

/// Decode one relay frame
pub fn decode_frame(text: &str, fallback_id: &str) -> Result<RelayUpdate> {
    let frame: RelayFrame =
        serde_json::from_str(text).map_err(|e| BridgeError::DecodeError(e.to_string()))?;

    let update = match frame.event.as_str() {
        "connected" => {
            let user: RelayUser = serde_json::from_value(frame.data).unwrap_or_default();
            let id = if user.unique_id.is_empty() {
                fallback_id.to_string()
            } else {
                user.unique_id
            };
            RelayUpdate::Event(CommentStreamEvent::Connected { id })
        }
        "chat" => {
            let user: RelayUser = serde_json::from_value(frame.data)
                .map_err(|e| BridgeError::DecodeError(e.to_string()))?;
            let username = if user.nickname.is_empty() {
                user.unique_id
            } else {
                user.nickname
            };
            RelayUpdate::Event(CommentStreamEvent::Comment(IncomingComment::new(
                username,
                user.comment,
            )))
        }
        "streamEnd" | "disconnected" => RelayUpdate::Ended,
        _ => RelayUpdate::Ignored,
    };

    Ok(update)
}

/// Live comments read from a local JSON WebSocket relay of a TikTok stream
pub struct TiktokRelaySource {
    url: String,
    unique_id: String,
}

impl TiktokRelaySource {
    pub fn new(url: String, unique_id: String) -> Self {
        Self { url, unique_id }
    }
}

#[async_trait]
impl CommentSource for TiktokRelaySource {
    async fn run(self: Box<Self>, events: mpsc::Sender<CommentStreamEvent>) -> Result<()> {
        let (ws_stream, _) = connect_async(self.url.as_str()).await.map_err(|e| {
            BridgeError::StreamError(format!("Could not connect to TikTok relay at {}: {}", self.url, e))
        })?;
        log::info!("Connected to TikTok relay at {} for @{}", self.url, self.unique_id);

        let (mut write, mut read) = ws_stream.split();

        while let Some(message) = read.next().await {
            let text = match message {
                Ok(Message::Text(text)) => text.as_str().to_string(),
                Ok(Message::Ping(payload)) => {
                    write.send(Message::Pong(payload)).await?;
                    continue;
                }
                Ok(Message::Close(_)) => {
                    log::warn!("TikTok relay closed the connection");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    return Err(BridgeError::StreamError(format!(
                        "TikTok relay connection lost: {}",
                        e
                    )));
                }
            };

            match decode_frame(&text, &self.unique_id) {
                Ok(RelayUpdate::Event(event)) => {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(RelayUpdate::Ended) => {
                    log::info!("TikTok live for @{} ended", self.unique_id);
                    break;
                }
                Ok(RelayUpdate::Ignored) => {}
                Err(e) => log::warn!("Skipping malformed relay frame: {}", e),
            }
        }

        Ok(())
    }
}
