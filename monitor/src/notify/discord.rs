use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use market::{CandleInterval, SpikeScore};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{Notifier, NotifyError, format};

/// Embed side bar colour (red).
const ALERT_COLOR: u32 = 0xE7_4C_3C;

/// Longest response body kept in a `Rejected` error.
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, Serialize, PartialEq)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

fn field(name: impl Into<String>, value: impl Into<String>) -> EmbedField {
    EmbedField {
        name: name.into(),
        value: value.into(),
        inline: true,
    }
}

/// Builds the alert embed for `score`. `sent_at` stamps the message and
/// stands in for the candle time when the exchange reported none.
pub fn spike_payload(
    score: &SpikeScore,
    interval: CandleInterval,
    sma_period: usize,
    sent_at: DateTime<Utc>,
) -> WebhookPayload {
    let candle_time = (score.ts_ms > 0)
        .then(|| DateTime::<Utc>::from_timestamp_millis(score.ts_ms as i64))
        .flatten()
        .unwrap_or(sent_at);

    let embed = Embed {
        title: "Volume spike alert".to_string(),
        description: format!("**{}** ({})", score.instrument.id(), interval),
        color: ALERT_COLOR,
        fields: vec![
            field("Current volume", format::volume(score.current_volume)),
            field(
                format!("Average volume ({sma_period} SMA)"),
                format::volume(score.average_volume),
            ),
            field("Ratio", format!("**{}**", format::ratio(score.ratio))),
            field(
                "Current price",
                format::price(score.current_price, &score.instrument.quote),
            ),
            field(
                "Candle time",
                candle_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ),
        ],
        footer: EmbedFooter {
            text: format!("Bithumb {} volume monitor", score.instrument.quote),
        },
        timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    };

    WebhookPayload {
        content: None,
        embeds: vec![embed],
    }
}

pub fn startup_payload(interval: CandleInterval, sma_period: usize) -> WebhookPayload {
    WebhookPayload {
        content: Some(format!(
            "Volume monitor started ({interval} candles, {sma_period} SMA baseline)."
        )),
        embeds: Vec::new(),
    }
}

/// Delivers alerts to a Discord webhook.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Client,
    url: String,
    interval: CandleInterval,
    sma_period: usize,
}

impl DiscordNotifier {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        interval: CandleInterval,
        sma_period: usize,
    ) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            url: url.into(),
            interval,
            sma_period,
        })
    }

    async fn post(&self, payload: &WebhookPayload) -> Result<(), NotifyError> {
        let resp = self.http.post(&self.url).json(payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    #[instrument(skip(self, score), fields(instrument = %score.instrument), level = "debug")]
    async fn notify_spike(&self, score: &SpikeScore) -> Result<(), NotifyError> {
        let payload = spike_payload(score, self.interval, self.sma_period, Utc::now());
        self.post(&payload).await?;

        debug!("spike alert delivered");
        Ok(())
    }

    async fn notify_startup(&self) -> Result<(), NotifyError> {
        self.post(&startup_payload(self.interval, self.sma_period))
            .await
    }
}
