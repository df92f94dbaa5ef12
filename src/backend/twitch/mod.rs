/// Twitch chat channel over IRC-on-WebSocket
///
/// Logs in with the configured OAuth token, joins the channel and keeps the
/// session alive (PING/PONG). Lines are sent with PRIVMSG.
///
/// # Example Usage
///
/// ```rust,no_run
/// use layconnector::backend::session::{ChatChannel, ChatEvent};
/// use layconnector::backend::twitch::{TwitchChat, TwitchConfig};
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
///
/// #[tokio::main]
/// async fn main() {
///     let config = TwitchConfig {
///         username: "your_bot".to_string(),
///         token: "oauth:your_token".to_string(),
///         channel: "your_channel".to_string(),
///     };
///
///     let chat = Arc::new(TwitchChat::new(config));
///     let (tx, mut rx) = mpsc::channel(100);
///
///     let session = {
///         let chat = chat.clone();
///         tokio::spawn(async move { chat.run(tx).await })
///     };
///
///     if let Some(ChatEvent::Connected { .. }) = rx.recv().await {
///         chat.send("hello chat").await.unwrap();
///     }
///     let _ = session.await;
/// }
/// ```
mod client;
mod messages;

pub use client::{TwitchChat, TwitchConfig};
pub use messages::{privmsg, IrcMessage};
