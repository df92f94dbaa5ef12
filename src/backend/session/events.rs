use chrono::{DateTime, Local};
use std::fmt;
use tokio::sync::mpsc;

use super::state::SessionState;
use crate::backend::control::SubscriptionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    INFO,
    WARN,
    ERROR,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::INFO => write!(f, "INFO"),
            LogLevel::WARN => write!(f, "WARN"),
            LogLevel::ERROR => write!(f, "ERROR"),
        }
    }
}

/// Timestamped status line for presentation
#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Everything the bridge reports to its presentation layer
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    StateChanged(SessionState),
    Log(LogLine),
    Subscription(SubscriptionEvent),
}

/// Status/log sink handed to every activity of a session
///
/// Lines are mirrored to the `log` facade. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<BridgeEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BridgeEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::INFO => log::info!("{}", message),
            LogLevel::WARN => log::warn!("{}", message),
            LogLevel::ERROR => log::error!("{}", message),
        }
        let _ = self.tx.send(BridgeEvent::Log(LogLine {
            level,
            timestamp: Local::now(),
            message,
        }));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::INFO, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::WARN, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::ERROR, message);
    }

    pub fn state(&self, state: SessionState) {
        log::debug!("Session state: {:?}", state);
        let _ = self.tx.send(BridgeEvent::StateChanged(state));
    }

    pub fn subscription(&self, event: SubscriptionEvent) {
        let _ = self.tx.send(BridgeEvent::Subscription(event));
    }
}
