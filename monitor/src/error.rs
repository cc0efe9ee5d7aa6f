use thiserror::Error;

use market::types::UnknownInterval;

/// A single violated configuration rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("DISCORD_WEBHOOK_URL is not set")]
    MissingWebhookUrl,

    #[error("DISCORD_WEBHOOK_URL is not a valid http(s) url: {0}")]
    InvalidWebhookUrl(String),

    #[error("CHECK_INTERVAL must be at least {min} seconds (got {got})")]
    CheckInterval { got: i64, min: i64 },

    #[error("VOLUME_MULTIPLIER must be greater than 0 (got {0})")]
    VolumeMultiplier(f64),

    #[error("SMA_PERIOD must be at least 1 (got {0})")]
    SmaPeriod(i64),

    #[error("CANDLE_INTERVAL: {0}")]
    CandleInterval(#[from] UnknownInterval),

    #[error("CANDLE_COUNT must be at least SMA_PERIOD + 1 = {needed} (got {got})")]
    CandleCount { got: i64, needed: i64 },

    #[error("API_TIMEOUT must be at least 1 second (got {0})")]
    ApiTimeout(i64),

    #[error("WEBHOOK_TIMEOUT must be at least 1 second (got {0})")]
    WebhookTimeout(i64),

    #[error("API_DELAY must be a representable, non-negative number of seconds (got {0})")]
    ApiDelay(f64),

    #[error("ALERT_RESET_HOURS must be a whole number of at least 1 hour (got '{0}')")]
    AlertResetHours(String),
}

/// Every rule the startup configuration broke, reported together.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid configuration ({} error(s))", .0.len())]
pub struct InvalidConfig(pub Vec<ConfigError>);
