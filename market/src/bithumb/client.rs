use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::bithumb::types::{parse_candles, parse_markets};
use crate::errors::FetchError;
use crate::source::MarketSource;
use crate::types::{Candle, CandleInterval, Instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.bithumb.com/public";

const USER_AGENT: &str = concat!("volume-monitor/", env!("CARGO_PKG_VERSION"));

/// HTTP client for Bithumb's public REST API, scoped to one quote market.
#[derive(Clone)]
pub struct BithumbClient {
    http: Client,
    url: String,
    quote: String,
}

impl BithumbClient {
    /// `timeout` bounds each request end to end.
    pub fn new(
        url: impl Into<String>,
        quote: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.into().trim_end_matches('/').to_string(),
            quote: quote.into(),
        })
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl MarketSource for BithumbClient {
    #[instrument(skip(self), fields(quote = %self.quote), level = "debug")]
    async fn list_instruments(&self) -> Result<Vec<Instrument>, FetchError> {
        let url = format!("{}/ticker/ALL_{}", self.url, self.quote);

        let body = self.get_text(&url, &[]).await?;
        let markets = parse_markets(&body, &self.quote)?;

        debug!(count = markets.len(), "bithumb markets fetched");

        Ok(markets)
    }

    #[instrument(
        skip(self, instrument, interval),
        fields(instrument = %instrument, interval = %interval),
        level = "debug"
    )]
    async fn get_candles(
        &self,
        instrument: &Instrument,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        let url = format!(
            "{}/candlestick/{}_{}/{}",
            self.url, instrument.base, instrument.quote, interval
        );

        let body = self.get_text(&url, &[("count", limit.to_string())]).await?;
        let mut candles = parse_candles(&body)?;

        // The endpoint may ignore `count` and return the full history.
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }

        debug!(count = candles.len(), "bithumb candles fetched");

        Ok(candles)
    }
}
