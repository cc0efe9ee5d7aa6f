use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// A tradable market, e.g. `BTC/KRW`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instrument {
    pub base: String,
    pub quote: String,
}

impl Instrument {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    pub fn id(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// One time bucket of trading activity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Candle {
    /// Period start, milliseconds since the Unix epoch.
    pub ts_ms: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle bucket sizes accepted by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandleInterval {
    M1,
    M3,
    M5,
    M10,
    M15,
    M30,
    H1,
    H4,
    H6,
    H12,
    H24,
    D1,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 12] = [
        CandleInterval::M1,
        CandleInterval::M3,
        CandleInterval::M5,
        CandleInterval::M10,
        CandleInterval::M15,
        CandleInterval::M30,
        CandleInterval::H1,
        CandleInterval::H4,
        CandleInterval::H6,
        CandleInterval::H12,
        CandleInterval::H24,
        CandleInterval::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::M1 => "1m",
            CandleInterval::M3 => "3m",
            CandleInterval::M5 => "5m",
            CandleInterval::M10 => "10m",
            CandleInterval::M15 => "15m",
            CandleInterval::M30 => "30m",
            CandleInterval::H1 => "1h",
            CandleInterval::H4 => "4h",
            CandleInterval::H6 => "6h",
            CandleInterval::H12 => "12h",
            CandleInterval::H24 => "24h",
            CandleInterval::D1 => "1d",
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown candle interval '{0}' (expected one of: {labels})", labels = interval_labels())]
pub struct UnknownInterval(pub String);

fn interval_labels() -> String {
    CandleInterval::ALL
        .iter()
        .map(|i| i.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for CandleInterval {
    type Err = UnknownInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandleInterval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| UnknownInterval(s.to_string()))
    }
}

/// Volume anomaly score for one instrument in one cycle.
///
/// Computed fresh every cycle and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeScore {
    #[serde(serialize_with = "serialize_instrument")]
    pub instrument: Instrument,
    pub current_volume: f64,
    pub average_volume: f64,
    pub ratio: f64,
    pub current_price: f64,
    pub ts_ms: u64,
}

impl SpikeScore {
    /// Inclusive threshold: `ratio == multiplier` counts as a spike.
    pub fn is_spike(&self, multiplier: f64) -> bool {
        self.ratio >= multiplier
    }
}

fn serialize_instrument<S>(instrument: &Instrument, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&instrument.id())
}
