use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "tubewatch.toml";
const DEFAULT_DATABASE_PATH: &str = "subscriptions.db";
const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
const DEFAULT_CHANNEL_DELAY_SECS: u64 = 1;

/// Optional non-secret settings, read from `tubewatch.toml` when present.
#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    pub database_path: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub channel_delay_secs: Option<u64>,
    #[serde(default)]
    pub server: Option<ServerSettings>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ServerSettings {
    pub bind: Option<String>,
}

/// Resolved runtime configuration. Secrets come strictly from the process
/// environment; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_bot_token: String,
    pub youtube_api_key: String,
    pub database_path: String,
    pub poll_interval: Duration,
    pub channel_delay: Duration,
    pub bind: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let settings = load_settings(Path::new(DEFAULT_CONFIG_PATH))?;
        Self::from_parts(settings, |key| std::env::var(key).ok())
    }

    pub fn from_parts(
        settings: Settings,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let discord_bot_token = required_env(&env, "DISCORD_BOT_TOKEN")?;
        let youtube_api_key = required_env(&env, "YOUTUBE_API_KEY")?;
        Ok(Self {
            discord_bot_token,
            youtube_api_key,
            database_path: settings
                .database_path
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            poll_interval: Duration::from_secs(
                settings
                    .poll_interval_secs
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            channel_delay: Duration::from_secs(
                settings
                    .channel_delay_secs
                    .unwrap_or(DEFAULT_CHANNEL_DELAY_SECS),
            ),
            bind: settings
                .server
                .and_then(|server| server.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        })
    }
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

fn required_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    env(key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow::anyhow!("required environment variable {key} is not set"))
}
