use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::backend::error::{BridgeError, Result};

/// A single live comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingComment {
    pub username: String,
    pub text: String,
}

impl IncomingComment {
    pub fn new(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            text: text.into(),
        }
    }

    /// Line relayed to chat for every comment
    pub fn relay_line(&self) -> String {
        format!("{}: {}", self.username, self.text)
    }
}

/// Events produced by the live-comment stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentStreamEvent {
    Connected { id: String },
    Comment(IncomingComment),
}

/// Events produced by the chat channel session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Connected { channel: String },
    Notice(String),
}

/// One-way live-comment feed
///
/// The feed is not restartable: `run` consumes the source and returns once
/// the feed has ended.
#[async_trait]
pub trait CommentSource: Send + 'static {
    async fn run(self: Box<Self>, events: mpsc::Sender<CommentStreamEvent>) -> Result<()>;
}

/// Two-way chat channel
#[async_trait]
pub trait ChatChannel: Send + Sync + 'static {
    /// Keep the chat session alive; returns when the session ends
    async fn run(&self, events: mpsc::Sender<ChatEvent>) -> Result<()>;

    /// Send one line to the channel
    async fn send(&self, text: &str) -> Result<()>;
}

/// Comment source backed by any stream of events
pub struct StreamSource<S> {
    stream: S,
}

impl<S> StreamSource<S>
where
    S: Stream<Item = CommentStreamEvent> + Send + Unpin + 'static,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> CommentSource for StreamSource<S>
where
    S: Stream<Item = CommentStreamEvent> + Send + Unpin + 'static,
{
    async fn run(self: Box<Self>, events: mpsc::Sender<CommentStreamEvent>) -> Result<()> {
        let mut stream = self.stream;
        while let Some(event) = stream.next().await {
            events
                .send(event)
                .await
                .map_err(|e| BridgeError::ChannelError(e.to_string()))?;
        }
        Ok(())
    }
}

/// Sender half for callback-style producers plus the matching source
pub fn comment_channel(
    capacity: usize,
) -> (
    mpsc::Sender<CommentStreamEvent>,
    StreamSource<ReceiverStream<CommentStreamEvent>>,
) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, StreamSource::new(ReceiverStream::new(rx)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_line() {
        let comment = IncomingComment::new("viewer", "!bsr abc");
        assert_eq!(comment.relay_line(), "viewer: !bsr abc");
    }

    #[tokio::test]
    async fn test_stream_source_forwards_in_order_then_ends() {
        let (tx, source) = comment_channel(8);
        tx.send(CommentStreamEvent::Connected { id: "streamer".into() })
            .await
            .unwrap();
        tx.send(CommentStreamEvent::Comment(IncomingComment::new("a", "1")))
            .await
            .unwrap();
        drop(tx);

        let (events_tx, mut events_rx) = mpsc::channel(8);
        Box::new(source).run(events_tx).await.unwrap();

        assert_eq!(
            events_rx.recv().await,
            Some(CommentStreamEvent::Connected { id: "streamer".into() })
        );
        assert_eq!(
            events_rx.recv().await,
            Some(CommentStreamEvent::Comment(IncomingComment::new("a", "1")))
        );
        assert_eq!(events_rx.recv().await, None);
    }
}
