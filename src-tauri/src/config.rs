//! Runtime configuration from the environment (optionally a `.env` file).

use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_HOTKEY: &str = "CommandOrControl+Shift+Space";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the inference backend; `/ask` and `/health` hang off it.
    pub backend_url: String,
    /// Pause between hiding the app's windows and grabbing the screen.
    pub settle_delay: Duration,
    /// Pause between showing the overlay and pushing data into it.
    pub overlay_delivery_delay: Duration,
    pub hotkey: String,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            settle_delay: Duration::from_millis(100),
            overlay_delivery_delay: Duration::from_millis(100),
            hotkey: DEFAULT_HOTKEY.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read `SCREEN_ASK_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::info!("[CONFIG] Loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset or blank values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("SCREEN_ASK_BACKEND_URL") {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    key: "SCREEN_ASK_BACKEND_URL",
                    value: url,
                });
            }
            config.backend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get("SCREEN_ASK_SETTLE_MS") {
            config.settle_delay = Duration::from_millis(parse_number("SCREEN_ASK_SETTLE_MS", raw)?);
        }
        if let Some(raw) = get("SCREEN_ASK_OVERLAY_DELAY_MS") {
            config.overlay_delivery_delay =
                Duration::from_millis(parse_number("SCREEN_ASK_OVERLAY_DELAY_MS", raw)?);
        }
        if let Some(hotkey) = get("SCREEN_ASK_HOTKEY") {
            config.hotkey = hotkey;
        }
        if let Some(raw) = get("SCREEN_ASK_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("SCREEN_ASK_REQUEST_TIMEOUT_SECS", raw)?);
        }

        Ok(config)
    }
}

fn parse_number(key: &'static str, raw: String) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
