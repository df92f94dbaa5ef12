use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::collaborators::{ChatChannel, ChatEvent, CommentSource, CommentStreamEvent, IncomingComment};
use super::events::EventSink;
use super::state::{AtomicState, SessionState, StopSignal};
use crate::backend::actions::{match_actions, render, Bindings};
use crate::backend::config::{ListenerConfig, SessionConfig};
use crate::backend::control::{ControlApi, SubscriptionListener};
use crate::backend::error::{BridgeError, Result};

const INBOUND_CAPACITY: usize = 100;

/// Messages from the session activities to the dispatch loop
#[derive(Debug)]
enum Inbound {
    Comment(CommentStreamEvent),
    CommentStreamEnded(Option<BridgeError>),
    Chat(ChatEvent),
    ChatEnded(Option<BridgeError>),
}

/// Handle to a running session
pub struct SessionHandle {
    state: AtomicState,
    stop: StopSignal,
    sink: EventSink,
    dispatcher: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Stop every activity and wait until the session is `Stopped`
    ///
    /// Calling this on a stopped session does nothing.
    pub async fn stop(&mut self) {
        let Some(dispatcher) = self.dispatcher.take() else {
            return;
        };

        if self
            .state
            .transition(SessionState::Running, SessionState::Stopping)
            || self
                .state
                .transition(SessionState::Starting, SessionState::Stopping)
        {
            self.sink.state(SessionState::Stopping);
            self.sink.info("Stopping session...");
        }

        self.stop.trigger();
        if let Err(e) = dispatcher.await {
            log::error!("Session dispatcher panicked: {}", e);
            self.state.set(SessionState::Stopped);
            self.sink.state(SessionState::Stopped);
        }
    }

    /// Wait until the session ends on its own (fatal stream failure)
    pub async fn wait(&mut self) {
        if let Some(dispatcher) = self.dispatcher.as_mut() {
            if let Err(e) = dispatcher.await {
                log::error!("Session dispatcher panicked: {}", e);
            }
            self.dispatcher = None;
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop.trigger();
    }
}

/// Start a session: comment ingestion, chat session and, when enabled, the
/// control API probe plus subscription listener
///
/// Must be called from within a tokio runtime.
pub fn start(
    config: SessionConfig,
    source: Box<dyn CommentSource>,
    chat: Arc<dyn ChatChannel>,
    sink: EventSink,
) -> Result<SessionHandle> {
    config.validate()?;

    let control = match &config.control_api {
        Some(api) => Some(
            ControlApi::new(&api.http_url, api.request_timeout)
                .map_err(|e| BridgeError::ConfigError(format!("control API client: {}", e)))?,
        ),
        None => None,
    };

    let state = AtomicState::new(SessionState::Starting);
    sink.state(SessionState::Starting);

    let stop = StopSignal::new();
    let control_ready = Arc::new(AtomicBool::new(false));
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);

    let mut activities = vec![
        tokio::spawn(ingest_comments(source, inbound_tx.clone(), stop.clone())),
        tokio::spawn(run_chat(chat.clone(), inbound_tx, stop.clone())),
    ];

    if let (Some(api), Some(api_config)) = (control.clone(), config.control_api.as_ref()) {
        activities.push(tokio::spawn(run_control_feed(
            api,
            api_config.websocket_url.clone(),
            config.listener,
            control_ready.clone(),
            stop.clone(),
            sink.clone(),
        )));
    }

    let dispatcher = Dispatcher {
        config: Arc::new(config),
        chat,
        control,
        control_ready,
        state: state.clone(),
        stop: stop.clone(),
        sink: sink.clone(),
    };

    state.set(SessionState::Running);
    sink.state(SessionState::Running);
    sink.info("Session started");

    let dispatcher = tokio::spawn(dispatcher.run(inbound_rx, activities));

    Ok(SessionHandle {
        state,
        stop,
        sink,
        dispatcher: Some(dispatcher),
    })
}

/// Pump the comment stream into the dispatch queue
async fn ingest_comments(
    source: Box<dyn CommentSource>,
    inbound: mpsc::Sender<Inbound>,
    stop: StopSignal,
) {
    let (tx, mut rx) = mpsc::channel(INBOUND_CAPACITY);
    let forward_tx = inbound.clone();
    let forward = async move {
        while let Some(event) = rx.recv().await {
            if forward_tx.send(Inbound::Comment(event)).await.is_err() {
                break;
            }
        }
    };

    let result = tokio::select! {
        (result, _) = async move { tokio::join!(source.run(tx), forward) } => result,
        _ = stop.stopped() => return,
    };

    let _ = inbound.send(Inbound::CommentStreamEnded(result.err())).await;
}

/// Keep the chat session alive and report its events
async fn run_chat(chat: Arc<dyn ChatChannel>, inbound: mpsc::Sender<Inbound>, stop: StopSignal) {
    let (tx, mut rx) = mpsc::channel(INBOUND_CAPACITY);
    let forward_tx = inbound.clone();
    let forward = async move {
        while let Some(event) = rx.recv().await {
            if forward_tx.send(Inbound::Chat(event)).await.is_err() {
                break;
            }
        }
    };

    let result = tokio::select! {
        (result, _) = async move { tokio::join!(chat.run(tx), forward) } => result,
        _ = stop.stopped() => return,
    };

    let _ = inbound.send(Inbound::ChatEnded(result.err())).await;
}

/// Probe the control API, then follow its event feed
async fn run_control_feed(
    api: ControlApi,
    websocket_url: String,
    listener: ListenerConfig,
    ready: Arc<AtomicBool>,
    stop: StopSignal,
    sink: EventSink,
) {
    let probe = tokio::select! {
        probe = api.probe() => probe,
        _ = stop.stopped() => return,
    };

    match probe {
        Ok(()) => {
            ready.store(true, Ordering::SeqCst);
            sink.info(format!("Control API reachable at {}", api.base_url()));
        }
        Err(e) => {
            sink.warn(format!(
                "Control API unreachable, mod actions disabled for this run: {}",
                e
            ));
        }
    }

    SubscriptionListener::new(websocket_url, listener, stop, sink)
        .run()
        .await;
}

/// Single consumer of the inbound queue; handles comments strictly in order
struct Dispatcher {
    config: Arc<SessionConfig>,
    chat: Arc<dyn ChatChannel>,
    control: Option<ControlApi>,
    control_ready: Arc<AtomicBool>,
    state: AtomicState,
    stop: StopSignal,
    sink: EventSink,
}

impl Dispatcher {
    async fn run(self, mut inbound: mpsc::Receiver<Inbound>, activities: Vec<JoinHandle<()>>) {
        loop {
            if self.stop.is_stopped() {
                break;
            }

            let message = tokio::select! {
                message = inbound.recv() => message,
                _ = self.stop.stopped() => None,
            };

            match message {
                Some(Inbound::Comment(CommentStreamEvent::Connected { id })) => {
                    self.sink.info(format!("Connected to TikTok @{}", id));
                }
                Some(Inbound::Comment(CommentStreamEvent::Comment(comment))) => {
                    self.handle_comment(&comment).await;
                }
                Some(Inbound::Chat(ChatEvent::Connected { channel })) => {
                    self.sink.info(format!("Connected to chat channel #{}", channel));
                }
                Some(Inbound::Chat(ChatEvent::Notice(notice))) => {
                    self.sink.info(format!("Chat notice: {}", notice));
                }
                Some(Inbound::CommentStreamEnded(err)) => {
                    self.fail("Comment stream", err);
                    break;
                }
                Some(Inbound::ChatEnded(err)) => {
                    self.fail("Chat channel", err);
                    break;
                }
                None => break,
            }
        }

        if self
            .state
            .transition(SessionState::Running, SessionState::Stopping)
        {
            self.sink.state(SessionState::Stopping);
        }
        self.stop.trigger();
        drop(inbound);

        for activity in activities {
            if let Err(e) = activity.await {
                log::error!("Session activity panicked: {}", e);
            }
        }

        self.state.set(SessionState::Stopped);
        self.sink.state(SessionState::Stopped);
        self.sink.info("Session stopped");
    }

    fn fail(&self, what: &str, err: Option<BridgeError>) {
        let err = match err {
            Some(err) if err.is_fatal() => err,
            Some(other) => BridgeError::StreamError(format!("{} failed: {}", what, other)),
            None => BridgeError::StreamError(format!("{} ended", what)),
        };
        self.sink.error(err.to_string());
    }

    /// Relay the comment, then run every matching action in order
    async fn handle_comment(&self, comment: &IncomingComment) {
        self.send_chat(&comment.relay_line()).await;

        for matched in match_actions(&comment.text, &self.config.actions) {
            let bindings = Bindings::new(matched.remainder, comment.username.clone());

            for response in &matched.action.responses {
                self.send_chat(&render(response, &bindings)).await;
            }

            let Some(control_action) = matched.action.control() else {
                continue;
            };

            let api = match &self.control {
                Some(api) if self.control_ready.load(Ordering::SeqCst) => api,
                _ => {
                    log::debug!(
                        "Control API not available, skipping {} for '{}'",
                        control_action.name(),
                        matched.action.trigger
                    );
                    continue;
                }
            };

            match api.execute(control_action, &bindings).await {
                Ok(text) => {
                    self.sink
                        .info(format!("{} for {}: {}", control_action.name(), comment.username, text));
                    self.send_chat(&text).await;
                }
                Err(e) => {
                    self.sink.error(e.to_string());
                    self.send_chat(&e.fallback).await;
                }
            }
        }
    }

    async fn send_chat(&self, text: &str) {
        if let Err(e) = self.chat.send(text).await {
            self.sink.error(format!("Failed to send message: {}", e));
        }
    }
}
