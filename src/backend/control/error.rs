use std::fmt;

/// Failed control API call
///
/// Carries the chat-facing fallback text next to the underlying cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub operation: &'static str,
    pub cause: String,
    pub fallback: String,
}

impl ApiError {
    pub fn new(operation: &'static str, cause: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            operation,
            cause: cause.into(),
            fallback: fallback.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Control API {} failed: {}", self.operation, self.cause)
    }
}

impl std::error::Error for ApiError {}
