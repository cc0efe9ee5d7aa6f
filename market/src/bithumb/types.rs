//! Bithumb public API wire format.
//!
//! Every response is wrapped in `{"status": "0000", "data": ...}`. Any other
//! status carries a `message` instead of data.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::FetchError;
use crate::types::{Candle, Instrument};

pub const STATUS_OK: &str = "0000";

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Result<T, FetchError> {
        if self.status != STATUS_OK {
            return Err(FetchError::Upstream {
                status: self.status,
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        self.data
            .ok_or_else(|| FetchError::InvalidResponse("missing data field".to_string()))
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
    envelope.into_data()
}

/// `ticker/ALL_{quote}`: every key of `data` except `date` is a base symbol.
pub fn parse_markets(body: &str, quote: &str) -> Result<Vec<Instrument>, FetchError> {
    let data: BTreeMap<String, Value> = decode(body)?;

    Ok(data
        .into_keys()
        .filter(|k| k != "date")
        .map(|base| Instrument::new(base, quote))
        .collect())
}

/// `candlestick/{base}_{quote}/{interval}`: rows are either
/// `[ts, open, close, high, low, volume]` or objects with named fields.
/// Output is sorted oldest first.
pub fn parse_candles(body: &str) -> Result<Vec<Candle>, FetchError> {
    let rows: Vec<Value> = decode(body)?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in &rows {
        if let Some(c) = parse_row(row)? {
            candles.push(c);
        }
    }

    candles.sort_by_key(|c| c.ts_ms);
    Ok(candles)
}

fn parse_row(row: &Value) -> Result<Option<Candle>, FetchError> {
    match row {
        // Short rows are skipped, not rejected.
        Value::Array(cols) if cols.len() >= 6 => Ok(Some(Candle {
            ts_ms: timestamp(&cols[0])?,
            open: number(&cols[1])?,
            close: number(&cols[2])?,
            high: number(&cols[3])?,
            low: number(&cols[4])?,
            volume: number(&cols[5])?,
        })),
        Value::Object(_) => Ok(Some(Candle {
            ts_ms: field(row, &["time", "dt"]).map(timestamp).transpose()?.unwrap_or(0),
            open: named_number(row, &["open", "openPrice"])?,
            close: named_number(row, &["close", "closePrice"])?,
            high: named_number(row, &["high", "highPrice"])?,
            low: named_number(row, &["low", "lowPrice"])?,
            volume: named_number(row, &["volume", "transactions"])?,
        })),
        _ => Ok(None),
    }
}

fn field<'a>(row: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|n| row.get(*n))
}

fn named_number(row: &Value, names: &[&str]) -> Result<f64, FetchError> {
    field(row, names).map(number).transpose().map(|v| v.unwrap_or(0.0))
}

fn number(v: &Value) -> Result<f64, FetchError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| FetchError::InvalidResponse(format!("not a number: {v}")))
}

fn timestamp(v: &Value) -> Result<u64, FetchError> {
    let parsed = match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| FetchError::InvalidResponse(format!("not a timestamp: {v}")))
}
