use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::backend::config::ListenerConfig;
use crate::backend::error::{BridgeError, Result};
use crate::backend::session::{EventSink, StopSignal};

type ControlSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Event pushed by the control API's subscription socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    #[serde(rename = "EventType")]
    pub event_type: String,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Value,
    #[serde(rename = "Data", default)]
    pub payload: Value,
}

/// Decode one inbound frame
pub fn decode_event(text: &str) -> Result<SubscriptionEvent> {
    serde_json::from_str(text).map_err(|e| BridgeError::DecodeError(e.to_string()))
}

/// Listener connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Connected,
    Stopped,
}

/// How a connected session ended
enum SessionEnd {
    Closed,
    Failed(BridgeError),
    Stopped,
}

/// Keeps a connection to the control event feed alive until stopped
pub struct SubscriptionListener {
    url: String,
    config: ListenerConfig,
    stop: StopSignal,
    sink: EventSink,
    state: ListenerState,
}

impl SubscriptionListener {
    pub fn new(url: String, config: ListenerConfig, stop: StopSignal, sink: EventSink) -> Self {
        Self {
            url,
            config,
            stop,
            sink,
            state: ListenerState::Disconnected,
        }
    }

    fn set_state(&mut self, state: ListenerState) {
        log::debug!("Subscription listener {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Connect, receive, and reconnect after a fixed delay until stopped
    pub async fn run(mut self) {
        loop {
            if self.stop.is_stopped() {
                break;
            }

            self.set_state(ListenerState::Connecting);
            match connect_async(self.url.as_str()).await {
                Ok((ws_stream, _)) => {
                    self.set_state(ListenerState::Connected);
                    self.sink
                        .info(format!("Connected to control event feed at {}", self.url));

                    match self.receive(ws_stream).await {
                        SessionEnd::Stopped => break,
                        SessionEnd::Closed => {
                            self.sink.warn("Control event feed closed");
                        }
                        SessionEnd::Failed(e) => {
                            self.sink.warn(format!("Control event feed dropped: {}", e));
                        }
                    }
                }
                Err(e) => {
                    let err = BridgeError::SubscriptionError(e.to_string());
                    self.sink
                        .warn(format!("Could not connect to control event feed: {}", err));
                }
            }

            self.set_state(ListenerState::Disconnected);
            if self.stop.is_stopped() {
                break;
            }

            log::info!(
                "Reconnecting to control event feed in {:?}",
                self.config.retry_delay
            );
            tokio::select! {
                _ = sleep(self.config.retry_delay) => {}
                _ = self.stop.stopped() => {}
            }
        }

        self.set_state(ListenerState::Stopped);
        log::info!("Subscription listener stopped");
    }

    /// Receive loop with a bounded wait so stop requests are noticed
    async fn receive(&mut self, ws_stream: ControlSocket) -> SessionEnd {
        let (mut write, mut read) = ws_stream.split();

        loop {
            if self.stop.is_stopped() {
                let _ = write.send(Message::Close(None)).await;
                return SessionEnd::Stopped;
            }

            let message = match timeout(self.config.receive_timeout, read.next()).await {
                Err(_) => continue,
                Ok(None) => return SessionEnd::Closed,
                Ok(Some(message)) => message,
            };

            match message {
                Ok(Message::Text(text)) => self.forward(text.as_str()),
                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => self.forward(text),
                    Err(e) => log::warn!("Skipping non UTF-8 control event: {}", e),
                },
                Ok(Message::Ping(payload)) => {
                    if let Err(e) = write.send(Message::Pong(payload)).await {
                        return SessionEnd::Failed(e.into());
                    }
                }
                Ok(Message::Close(frame)) => {
                    if let Some(frame) = frame {
                        log::info!(
                            "Control event feed closed: code={}, reason={}",
                            u16::from(frame.code),
                            frame.reason
                        );
                    }
                    return SessionEnd::Closed;
                }
                Ok(_) => {}
                Err(e) => return SessionEnd::Failed(e.into()),
            }
        }
    }

    fn forward(&self, text: &str) {
        match decode_event(text) {
            Ok(event) => {
                self.sink.info(format!("Event: {}", event.event_type));
                self.sink.subscription(event);
            }
            Err(e) => {
                self.sink
                    .warn(format!("Skipping malformed control event: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::session::BridgeEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::UnboundedReceiver;

    const EVENT: &str = r#"{"EventType": "PlayStarted", "Timestamp": 1700000000, "Data": {"Title": "Song"}}"#;

    /// Accepts connections, sends one event (plus a malformed frame), then closes
    async fn spawn_feed() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                        let _ = ws.send(Message::text("not json".to_string())).await;
                        let _ = ws.send(Message::text(EVENT.to_string())).await;
                        let _ = ws.close(None).await;
                    }
                });
            }
        });
        (format!("ws://{}", addr), accepted)
    }

    fn config(retry_delay: Duration) -> ListenerConfig {
        ListenerConfig {
            retry_delay,
            receive_timeout: Duration::from_millis(50),
        }
    }

    async fn next_matching<F>(rx: &mut UnboundedReceiver<BridgeEvent>, mut pred: F) -> BridgeEvent
    where
        F: FnMut(&BridgeEvent) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                let event = rx.recv().await.expect("sink closed");
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    fn is_closed_log(event: &BridgeEvent) -> bool {
        matches!(event, BridgeEvent::Log(line) if line.message.contains("feed closed") || line.message.contains("feed dropped"))
    }

    #[test]
    fn test_decode_event() {
        let event = decode_event(EVENT).unwrap();
        assert_eq!(event.event_type, "PlayStarted");
        assert_eq!(event.payload["Title"], "Song");
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode_event("{\"Data\": 1}"),
            Err(BridgeError::DecodeError(_))
        ));
        assert!(decode_event("garbage").is_err());
    }

    #[tokio::test]
    async fn test_forwards_events_and_reconnects_after_close() {
        let (url, accepted) = spawn_feed().await;
        let (sink, mut rx) = EventSink::channel();
        let stop = StopSignal::new();
        let listener = SubscriptionListener::new(url, config(Duration::from_millis(100)), stop.clone(), sink);
        let task = tokio::spawn(listener.run());

        next_matching(&mut rx, |e| {
            matches!(e, BridgeEvent::Log(line) if line.message.starts_with("Skipping malformed control event"))
        })
        .await;
        match next_matching(&mut rx, |e| matches!(e, BridgeEvent::Subscription(_))).await {
            BridgeEvent::Subscription(event) => assert_eq!(event.event_type, "PlayStarted"),
            _ => unreachable!(),
        }

        tokio::time::timeout(Duration::from_secs(3), async {
            while accepted.load(Ordering::SeqCst) < 2 {
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("listener did not reconnect");

        stop.trigger();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("listener did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_reconnect_when_stopped_during_retry_delay() {
        let (url, accepted) = spawn_feed().await;
        let (sink, mut rx) = EventSink::channel();
        let stop = StopSignal::new();
        let listener = SubscriptionListener::new(url, config(Duration::from_millis(500)), stop.clone(), sink);
        let task = tokio::spawn(listener.run());

        next_matching(&mut rx, is_closed_log).await;
        stop.trigger();

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("listener did not stop")
            .unwrap();
        sleep(Duration::from_millis(700)).await;
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_feed_retries_until_stopped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (sink, mut rx) = EventSink::channel();
        let stop = StopSignal::new();
        let listener = SubscriptionListener::new(
            format!("ws://{}", addr),
            config(Duration::from_millis(50)),
            stop.clone(),
            sink,
        );
        let task = tokio::spawn(listener.run());

        for _ in 0..2 {
            next_matching(&mut rx, |e| {
                matches!(e, BridgeEvent::Log(line) if line.message.starts_with("Could not connect"))
            })
            .await;
        }

        stop.trigger();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("listener did not stop")
            .unwrap();
    }
}
