use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::actions::Action;
use crate::backend::error::{BridgeError, Result};

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_TIKTOK_RELAY_URL: &str = "ws://127.0.0.1:21213/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Control API endpoints as persisted
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ModSettings {
    #[serde(default)]
    pub http_url: String,
    #[serde(default)]
    pub websocket_url: String,
}

/// Persisted settings record
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub tiktok_username: String,
    #[serde(default)]
    pub twitch_username: String,
    #[serde(default)]
    pub twitch_token: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub mod_enabled: bool,
    #[serde(default)]
    pub mod_settings: ModSettings,
    /// Local relay that re-publishes the TikTok live feed as JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok_relay_url: Option<String>,
    /// Chat channel to join, defaults to `twitch_username`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitch_channel: Option<String>,
}

impl Settings {
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let settings = if is_json(path) {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Ok(settings)
    }

    fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        fs::write(path, content)?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Default settings location: `config.toml` at the project root
pub fn default_config_path() -> PathBuf {
    let root = project_root::get_project_root()
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."));
    root.join(CONFIG_FILE)
}

/// Load settings; a missing file yields empty settings
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("Settings file {} not found, using defaults", path.display());
        return Ok(Settings::default());
    }
    Settings::from_file(path)
}

pub fn save_settings<P: AsRef<Path>>(settings: &Settings, path: P) -> Result<()> {
    settings.to_file(path)
}

/// Control API endpoints for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlApiConfig {
    pub http_url: String,
    pub websocket_url: String,
    pub request_timeout: Duration,
}

/// Subscription listener timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Delay before reconnecting after a failure or close
    pub retry_delay: Duration,
    /// Upper bound on a single receive wait
    pub receive_timeout: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        }
    }
}

/// Validated, immutable snapshot used by one session run
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tiktok_username: String,
    pub tiktok_relay_url: String,
    pub twitch_username: String,
    pub twitch_token: String,
    pub twitch_channel: String,
    pub actions: Vec<Action>,
    /// `None` when control API integration is disabled
    pub control_api: Option<ControlApiConfig>,
    pub listener: ListenerConfig,
}

impl SessionConfig {
    /// Validate persisted settings and freeze them for a run
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let tiktok_username = required(&settings.tiktok_username, "tiktok_username")?;
        let twitch_username = required(&settings.twitch_username, "twitch_username")?;
        let twitch_token = required(&settings.twitch_token, "twitch_token")?;

        for action in &settings.actions {
            action.validate()?;
        }

        let control_api = if settings.mod_enabled {
            Some(ControlApiConfig {
                http_url: required(&settings.mod_settings.http_url, "mod_settings.http_url")?,
                websocket_url: required(
                    &settings.mod_settings.websocket_url,
                    "mod_settings.websocket_url",
                )?,
                request_timeout: DEFAULT_HTTP_TIMEOUT,
            })
        } else {
            None
        };

        let twitch_channel = settings
            .twitch_channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&twitch_username)
            .trim_start_matches('#')
            .to_lowercase();

        let tiktok_relay_url = settings
            .tiktok_relay_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_TIKTOK_RELAY_URL)
            .to_string();

        Ok(Self {
            tiktok_username: tiktok_username.trim_start_matches('@').to_string(),
            tiktok_relay_url,
            twitch_username,
            twitch_token,
            twitch_channel,
            actions: settings.actions.clone(),
            control_api,
            listener: ListenerConfig::default(),
        })
    }

    /// Re-check the invariants `from_settings` established
    pub fn validate(&self) -> Result<()> {
        required(&self.tiktok_username, "tiktok_username")?;
        required(&self.twitch_username, "twitch_username")?;
        required(&self.twitch_token, "twitch_token")?;
        required(&self.twitch_channel, "twitch_channel")?;
        for action in &self.actions {
            action.validate()?;
        }
        if let Some(api) = &self.control_api {
            required(&api.http_url, "mod_settings.http_url")?;
            required(&api.websocket_url, "mod_settings.websocket_url")?;
        }
        Ok(())
    }

    /// Builder method to override listener timings
    pub fn with_listener(mut self, listener: ListenerConfig) -> Self {
        self.listener = listener;
        self
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BridgeError::ConfigError(format!("{} is missing", field)));
    }
    Ok(value.to_string())
}
