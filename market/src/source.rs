use async_trait::async_trait;

use crate::errors::FetchError;
use crate::types::{Candle, CandleInterval, Instrument};

/// Read-only access to an exchange's public market data.
///
/// Implementations bound each call by their own request timeout. Spacing
/// between calls is the caller's job.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Instruments currently tradable on the quote market.
    async fn list_instruments(&self) -> Result<Vec<Instrument>, FetchError>;

    /// Up to `limit` most recent candles for `instrument`, oldest first.
    /// The last candle may still be forming.
    async fn get_candles(
        &self,
        instrument: &Instrument,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError>;
}
