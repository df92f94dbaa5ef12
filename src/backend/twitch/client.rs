use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::messages::{privmsg, IrcMessage};
use crate::backend::config::SessionConfig;
use crate::backend::error::{BridgeError, Result};
use crate::backend::session::{ChatChannel, ChatEvent};

const TWITCH_IRC_WS_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

type IrcWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Configuration for the Twitch chat connection
#[derive(Debug, Clone)]
pub struct TwitchConfig {
    pub username: String,
    pub token: String,
    pub channel: String,
}

impl From<&SessionConfig> for TwitchConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            username: config.twitch_username.clone(),
            token: config.twitch_token.clone(),
            channel: config.twitch_channel.clone(),
        }
    }
}

impl TwitchConfig {
    /// Token in the `oauth:` form IRC expects
    fn pass(&self) -> String {
        let token = self.token.trim();
        if token.starts_with("oauth:") {
            token.to_string()
        } else {
            format!("oauth:{}", token)
        }
    }
}

/// Twitch chat over IRC-on-WebSocket
pub struct TwitchChat {
    config: TwitchConfig,
    url: String,
    writer: Mutex<Option<IrcWriter>>,
}

impl TwitchChat {
    pub fn new(config: TwitchConfig) -> Self {
        Self::with_url(config, TWITCH_IRC_WS_URL.to_string())
    }

    /// Connect to a different IRC WebSocket endpoint
    pub fn with_url(config: TwitchConfig, url: String) -> Self {
        Self {
            config,
            url,
            writer: Mutex::new(None),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    async fn write_line(&self, line: String) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let writer = writer
            .as_mut()
            .ok_or_else(|| BridgeError::StreamError("Not connected to Twitch chat".to_string()))?;
        writer.send(Message::text(line)).await?;
        Ok(())
    }

    /// React to one IRC line; an error ends the session
    async fn handle_line(&self, line: &str, events: &mpsc::Sender<ChatEvent>) -> Result<()> {
        let Some(message) = IrcMessage::parse(line) else {
            return Ok(());
        };

        log::debug!("Twitch IRC < {}", line);

        match message.command.as_str() {
            "PING" => {
                let server = message.trailing().unwrap_or("tmi.twitch.tv");
                self.write_line(format!("PONG :{}", server)).await?;
            }
            "JOIN" => {
                let nick_matches = message
                    .nick()
                    .map(|nick| nick.eq_ignore_ascii_case(&self.config.username))
                    .unwrap_or(false);
                if nick_matches {
                    let _ = events
                        .send(ChatEvent::Connected {
                            channel: self.config.channel.clone(),
                        })
                        .await;
                }
            }
            "NOTICE" => {
                let text = message.trailing().unwrap_or_default().to_string();
                if text.contains("Login authentication failed")
                    || text.contains("Improperly formatted auth")
                {
                    return Err(BridgeError::StreamError(format!(
                        "Twitch login failed: {}",
                        text
                    )));
                }
                let _ = events.send(ChatEvent::Notice(text)).await;
            }
            "RECONNECT" => {
                log::warn!("Twitch requested a reconnect");
                return Err(BridgeError::StreamError(
                    "Twitch closed the chat session (RECONNECT)".to_string(),
                ));
            }
            _ => {}
        }

        Ok(())
    }

    async fn session(&self, events: &mpsc::Sender<ChatEvent>) -> Result<()> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| BridgeError::StreamError(format!("Could not connect to Twitch chat: {}", e)))?;

        let (write, mut read) = ws_stream.split();
        *self.writer.lock().await = Some(write);

        self.write_line(format!("PASS {}", self.config.pass())).await?;
        self.write_line(format!("NICK {}", self.config.username.to_lowercase()))
            .await?;
        self.write_line(format!("JOIN #{}", self.config.channel)).await?;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    for line in text.as_str().split("\r\n").filter(|l| !l.is_empty()) {
                        self.handle_line(line, events).await?;
                    }
                }
                Ok(Message::Ping(payload)) => {
                    let mut writer = self.writer.lock().await;
                    if let Some(writer) = writer.as_mut() {
                        writer.send(Message::Pong(payload)).await?;
                    }
                }
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .as_ref()
                        .map(|f| f.reason.to_string())
                        .unwrap_or_else(|| "Unknown".to_string());
                    log::warn!("Twitch chat closed: {}", reason);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    return Err(BridgeError::StreamError(format!(
                        "Twitch chat connection lost: {}",
                        e
                    )));
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ChatChannel for TwitchChat {
    async fn run(&self, events: mpsc::Sender<ChatEvent>) -> Result<()> {
        let result = self.session(&events).await;
        *self.writer.lock().await = None;
        result
    }

    async fn send(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        self.write_line(privmsg(&self.config.channel, text)).await
    }
}
