use backend::config::{default_config_path, load_settings, SessionConfig};
use backend::session::{self, EventSink};
use backend::tiktok::TiktokRelaySource;
use backend::twitch::{TwitchChat, TwitchConfig};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub mod backend;
mod handlers;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    info!("Loading settings from {}", config_path.display());

    let config = match load_settings(&config_path).and_then(|s| SessionConfig::from_settings(&s)) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid settings: {}", e);
            std::process::exit(1);
        }
    };

    let chat = Arc::new(TwitchChat::new(TwitchConfig::from(&config)));
    let source = Box::new(TiktokRelaySource::new(
        config.tiktok_relay_url.clone(),
        config.tiktok_username.clone(),
    ));

    let (sink, events) = EventSink::channel();
    let presenter = tokio::spawn(handlers::handle_bridge_events(events));

    let mut handle = match session::start(config, source, chat, sink) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start session: {}", e);
            std::process::exit(1);
        }
    };

    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        _ = handle.wait() => false,
    };
    if interrupted {
        info!("Ctrl-C received");
        handle.stop().await;
    }

    drop(handle);
    let _ = tokio::time::timeout(Duration::from_secs(2), presenter).await;
}
