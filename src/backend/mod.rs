pub mod actions;
pub mod config;
pub mod control;
pub mod error;
pub mod session;
pub mod tiktok;
pub mod twitch;

pub use error::{BridgeError, Result};
