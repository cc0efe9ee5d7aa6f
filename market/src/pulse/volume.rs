//! Volume Spike Pulse.
//!
//! Compares the latest candle's volume against the simple moving average of
//! the `sma_period` candles right before it. The latest candle is usually
//! still forming, so it never contributes to its own baseline.

use thiserror::Error;

use crate::types::{Candle, Instrument, SpikeScore};

/// Why a score could not be produced. Expected during normal operation
/// (new listings, dead markets) and never treated as a failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientData {
    #[error("not enough candles: have {have}, need {needed}")]
    TooFewCandles { have: usize, needed: usize },

    #[error("average volume is zero")]
    ZeroAverage,
}

/// Scores `candles` (oldest first) for a volume spike.
///
/// Needs `sma_period + 1` candles: `sma_period` completed ones for the
/// baseline plus the current one.
pub fn score(
    instrument: &Instrument,
    candles: &[Candle],
    sma_period: usize,
) -> Result<SpikeScore, InsufficientData> {
    let period = sma_period.max(1);
    let needed = period + 1;

    let Some((current, history)) = candles.split_last() else {
        return Err(InsufficientData::TooFewCandles { have: 0, needed });
    };

    if candles.len() < needed {
        return Err(InsufficientData::TooFewCandles {
            have: candles.len(),
            needed,
        });
    }

    let window = &history[history.len() - period..];
    let average_volume = window.iter().map(|c| c.volume).sum::<f64>() / period as f64;

    if average_volume == 0.0 || !average_volume.is_finite() {
        return Err(InsufficientData::ZeroAverage);
    }

    Ok(SpikeScore {
        instrument: instrument.clone(),
        current_volume: current.volume,
        average_volume,
        ratio: current.volume / average_volume,
        current_price: current.close,
        ts_ms: current.ts_ms,
    })
}

/// Bundles the SMA window and the alert multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSpikeDetector {
    pub sma_period: usize,
    pub multiplier: f64,
}

impl VolumeSpikeDetector {
    pub fn new(sma_period: usize, multiplier: f64) -> Self {
        Self {
            sma_period: sma_period.max(1),
            multiplier,
        }
    }

    /// Minimum number of candles a source must return for a score.
    pub fn candles_needed(&self) -> usize {
        self.sma_period + 1
    }

    pub fn score(
        &self,
        instrument: &Instrument,
        candles: &[Candle],
    ) -> Result<SpikeScore, InsufficientData> {
        score(instrument, candles, self.sma_period)
    }

    pub fn is_spike(&self, score: &SpikeScore) -> bool {
        score.is_spike(self.multiplier)
    }
}
