use std::fmt;

/// Errors that can occur while running the bridge
#[derive(Debug)]
pub enum BridgeError {
    /// Missing or invalid settings (fatal to start)
    ConfigError(String),

    /// Comment stream or chat channel failure (fatal to the run)
    StreamError(String),

    /// Control subscription socket failure (recovered by reconnecting)
    SubscriptionError(String),

    /// Malformed inbound subscription message (skipped)
    DecodeError(String),

    /// WebSocket transport error
    WebSocketError(String),

    /// HTTP request error
    HttpError(String),

    /// JSON/TOML parsing error
    JsonError(String),

    /// File system error
    IoError(String),

    /// Internal channel closed
    ChannelError(String),
}

impl BridgeError {
    /// Whether this error terminates the session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::ConfigError(_) | BridgeError::StreamError(_)
        )
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            BridgeError::StreamError(msg) => write!(f, "Stream error: {}", msg),
            BridgeError::SubscriptionError(msg) => write!(f, "Subscription error: {}", msg),
            BridgeError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            BridgeError::WebSocketError(msg) => write!(f, "WebSocket error: {}", msg),
            BridgeError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            BridgeError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            BridgeError::IoError(msg) => write!(f, "IO error: {}", msg),
            BridgeError::ChannelError(msg) => write!(f, "Channel error: {}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::JsonError(err.to_string())
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::JsonError(err.to_string())
    }
}

impl From<toml::ser::Error> for BridgeError {
    fn from(err: toml::ser::Error) -> Self {
        BridgeError::JsonError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BridgeError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        BridgeError::WebSocketError(err.to_string())
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        BridgeError::HttpError(err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
