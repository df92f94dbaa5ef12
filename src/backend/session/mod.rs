/// Session supervision: wires the comment stream, chat channel and control
/// API together for one run
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use layconnector::backend::config::{load_settings, SessionConfig};
/// use layconnector::backend::session::{self, comment_channel, EventSink};
///
/// # async fn demo(chat: Arc<dyn session::ChatChannel>) -> layconnector::backend::Result<()> {
/// let settings = load_settings("config.toml")?;
/// let config = SessionConfig::from_settings(&settings)?;
/// let (comments, source) = comment_channel(100);
/// let (sink, mut events) = EventSink::channel();
///
/// let mut handle = session::start(config, Box::new(source), chat, sink)?;
/// // push CommentStreamEvents into `comments`, read `events` for status lines
/// handle.stop().await;
/// # Ok(())
/// # }
/// ```
mod collaborators;
mod events;
mod state;
mod supervisor;

pub use collaborators::{
    comment_channel, ChatChannel, ChatEvent, CommentSource, CommentStreamEvent, IncomingComment,
    StreamSource,
};
pub use events::{BridgeEvent, EventSink, LogLevel, LogLine};
pub use state::{AtomicState, SessionState, StopSignal};
pub use supervisor::{start, SessionHandle};
