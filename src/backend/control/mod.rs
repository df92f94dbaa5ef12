//! Control API integration
//!
//! - `ControlApi`: typed GET requests against the companion application's
//!   HTTP API, with chat-ready reply rendering
//! - `SubscriptionListener`: auto-reconnecting client for its event socket

mod api;
mod error;
mod requests;
mod subscription;

pub use api::ControlApi;
pub use error::ApiError;
pub use requests::ControlRequest;
pub use subscription::{decode_event, SubscriptionEvent, SubscriptionListener};
