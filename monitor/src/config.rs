use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use common::LogOptions;
use market::CandleInterval;
use market::bithumb::DEFAULT_BASE_URL;

use crate::error::{ConfigError, InvalidConfig};

/// Lower bound on the scan interval. Keeps a full scan of the market inside
/// the exchange's public rate limit.
pub const MIN_CHECK_INTERVAL_SECS: i64 = 60;

/// Raw startup settings. Every flag falls back to an environment variable,
/// and a `.env` file is loaded before parsing.
#[derive(Debug, Clone, Parser)]
#[command(name = "volume-monitor", version, about, allow_negative_numbers = true)]
pub struct Cli {
    /// Discord webhook that receives spike alerts
    #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// Seconds between the start of two scan cycles
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = 300)]
    pub check_interval: i64,

    /// Alert when current volume >= multiplier x SMA volume
    #[arg(long, env = "VOLUME_MULTIPLIER", default_value_t = 5.0)]
    pub volume_multiplier: f64,

    /// Number of completed candles in the volume SMA
    #[arg(long, env = "SMA_PERIOD", default_value_t = 20)]
    pub sma_period: i64,

    /// Candle size, e.g. 1m, 5m, 1h
    #[arg(long, env = "CANDLE_INTERVAL", default_value = "5m")]
    pub candle_interval: String,

    /// Candles requested per instrument
    #[arg(long, env = "CANDLE_COUNT", default_value_t = 50)]
    pub candle_count: i64,

    /// Market data request timeout in seconds
    #[arg(long, env = "API_TIMEOUT", default_value_t = 10)]
    pub api_timeout: i64,

    /// Webhook request timeout in seconds
    #[arg(long, env = "WEBHOOK_TIMEOUT", default_value_t = 10)]
    pub webhook_timeout: i64,

    /// Pause between market data calls in seconds
    #[arg(long, env = "API_DELAY", default_value_t = 0.1)]
    pub api_delay: f64,

    /// Re-arm every alert after this many hours (empty = never)
    #[arg(long, env = "ALERT_RESET_HOURS")]
    pub alert_reset_hours: Option<String>,

    /// Run a single scan cycle and exit
    #[arg(long, env = "RUN_ONCE", action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value_t = false)]
    pub run_once: bool,

    /// Plain-text log copy (empty = stdout only)
    #[arg(long, env = "LOG_FILE", default_value = "bithumb_monitor.log")]
    pub log_file: String,

    /// Emit JSON log lines on stdout
    #[arg(long, env = "LOG_JSON", action = ArgAction::Set, value_parser = BoolishValueParser::new(), default_value_t = false)]
    pub log_json: bool,

    /// Exchange public API base url
    #[arg(long, env = "BITHUMB_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Quote currency of the scanned market
    #[arg(long, env = "QUOTE_CURRENCY", default_value = "KRW")]
    pub quote: String,
}

impl Cli {
    /// Logging must come up before validation so that validation errors are
    /// written to the configured destinations.
    pub fn log_options(&self) -> LogOptions {
        let file = self.log_file.trim();
        LogOptions {
            json: self.log_json,
            file: (!file.is_empty()).then(|| PathBuf::from(file)),
        }
    }
}

/// Validated, immutable process configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub webhook_url: String,

    // =========================
    // Scan loop
    // =========================
    /// Target time between the start of consecutive cycles. A cycle that runs
    /// longer than this is followed immediately by the next one.
    pub check_interval: Duration,

    /// Pause inserted before every candle request. This is the only
    /// backpressure against the exchange's rate limit.
    pub api_delay: Duration,

    /// Exit after one cycle instead of looping.
    pub run_once: bool,

    // =========================
    // Detection
    // =========================
    pub volume_multiplier: f64,

    /// Completed candles averaged for the baseline; the current candle is
    /// excluded.
    pub sma_period: usize,

    pub candle_interval: CandleInterval,

    /// Always at least `sma_period + 1`.
    pub candle_count: usize,

    /// When set, all alert flags are cleared once this much time has passed
    /// since the previous reset.
    pub alert_reset: Option<Duration>,

    // =========================
    // I/O
    // =========================
    pub api_url: String,
    pub quote: String,
    pub api_timeout: Duration,
    pub webhook_timeout: Duration,
}

impl AppConfig {
    /// Checks every rule and reports all violations at once.
    pub fn from_cli(cli: &Cli) -> Result<Self, InvalidConfig> {
        let mut errors = Vec::new();

        let webhook_url = match cli.webhook_url.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(ConfigError::MissingWebhookUrl);
                String::new()
            }
            Some(url) => {
                if !is_http_url(url) {
                    errors.push(ConfigError::InvalidWebhookUrl(url.to_string()));
                }
                url.to_string()
            }
        };

        if cli.check_interval < MIN_CHECK_INTERVAL_SECS {
            errors.push(ConfigError::CheckInterval {
                got: cli.check_interval,
                min: MIN_CHECK_INTERVAL_SECS,
            });
        }

        if !(cli.volume_multiplier > 0.0 && cli.volume_multiplier.is_finite()) {
            errors.push(ConfigError::VolumeMultiplier(cli.volume_multiplier));
        }

        if cli.sma_period < 1 {
            errors.push(ConfigError::SmaPeriod(cli.sma_period));
        }

        let candle_interval = match cli.candle_interval.trim().parse::<CandleInterval>() {
            Ok(i) => i,
            Err(e) => {
                errors.push(e.into());
                CandleInterval::M5
            }
        };

        let needed = cli.sma_period.max(1) + 1;
        if cli.candle_count < needed {
            errors.push(ConfigError::CandleCount {
                got: cli.candle_count,
                needed,
            });
        }

        if cli.api_timeout < 1 {
            errors.push(ConfigError::ApiTimeout(cli.api_timeout));
        }

        if cli.webhook_timeout < 1 {
            errors.push(ConfigError::WebhookTimeout(cli.webhook_timeout));
        }

        let api_delay = match Duration::try_from_secs_f64(cli.api_delay) {
            Ok(delay) => delay,
            Err(_) => {
                errors.push(ConfigError::ApiDelay(cli.api_delay));
                Duration::ZERO
            }
        };

        let alert_reset = match cli.alert_reset_hours.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<u64>() {
                Ok(hours) if hours >= 1 => match hours.checked_mul(3_600) {
                    Some(secs) => Some(Duration::from_secs(secs)),
                    None => {
                        errors.push(ConfigError::AlertResetHours(raw.to_string()));
                        None
                    }
                },
                _ => {
                    errors.push(ConfigError::AlertResetHours(raw.to_string()));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(InvalidConfig(errors));
        }

        Ok(Self {
            webhook_url,
            check_interval: Duration::from_secs(cli.check_interval as u64),
            api_delay,
            run_once: cli.run_once,
            volume_multiplier: cli.volume_multiplier,
            sma_period: cli.sma_period as usize,
            candle_interval,
            candle_count: cli.candle_count as usize,
            alert_reset,
            api_url: cli.api_url.clone(),
            quote: cli.quote.clone(),
            api_timeout: Duration::from_secs(cli.api_timeout as u64),
            webhook_timeout: Duration::from_secs(cli.webhook_timeout as u64),
        })
    }
}

fn is_http_url(raw: &str) -> bool {
    reqwest::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
