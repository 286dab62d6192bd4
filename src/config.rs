use std::env;
use std::time::Duration;

use crate::error::ConfigError;


pub const DEFAULT_USERNAME: &str = "SSM Alerts";
pub const DEFAULT_ICON_EMOJI: &str = ":lock:";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Settings for one notifier process, read once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: String,
    /// Channel override. `None` lets the webhook's default channel apply.
    pub channel: Option<String>,
    pub enable_logging: bool,
    pub icon_url: Option<String>,
    pub icon_emoji: String,
    pub username: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let webhook_url = value("SLACK_WEBHOOK_URL").ok_or(ConfigError::Missing("SLACK_WEBHOOK_URL"))?;
        if reqwest::Url::parse(&webhook_url).is_err() {
            return Err(ConfigError::Invalid {
                key: "SLACK_WEBHOOK_URL",
                value: webhook_url,
            });
        }

        let timeout = match value("WEBHOOK_TIMEOUT_SECONDS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "WEBHOOK_TIMEOUT_SECONDS",
                        value: raw,
                    });
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        };

        Ok(Config {
            webhook_url,
            channel: value("SLACK_CHANNEL"),
            enable_logging: value("ENABLE_LOGGING")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            icon_url: value("ICON_URL"),
            icon_emoji: value("ICON_EMOJI").unwrap_or_else(|| DEFAULT_ICON_EMOJI.to_string()),
            username: value("SLACK_USERNAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            timeout,
        })
    }
}
