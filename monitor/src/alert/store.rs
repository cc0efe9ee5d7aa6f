use std::collections::HashMap;
use std::time::Duration;

use market::Instrument;
use tracing::{debug, info, instrument};

/// Alert flag for one instrument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlertState {
    pub is_active: bool,
    pub activated_at_ms: Option<u64>,
}

/// In-memory de-duplication of spike alerts.
///
/// Guarantees:
/// - At most one notification per instrument per episode.
/// - An active flag is only cleared by a reset, never by volume falling back
///   under the threshold.
/// - A reset clears every instrument at once, which also bounds memory over
///   long uptimes.
///
/// Timestamps are milliseconds on the caller's clock. The store is owned by
/// a single scan loop and takes `&mut self`; there is no locking.
#[derive(Debug)]
pub struct AlertStore {
    states: HashMap<Instrument, AlertState>,
    last_reset_at_ms: u64,
}

impl AlertStore {
    pub fn new(now_ms: u64) -> Self {
        Self {
            states: HashMap::new(),
            last_reset_at_ms: now_ms,
        }
    }

    /// Returns true exactly when `instrument` enters a spike while not
    /// already active, and marks it active. The caller is expected to send
    /// the alert; a failed delivery does not undo the flag.
    pub fn should_notify(&mut self, instrument: &Instrument, is_spike: bool, now_ms: u64) -> bool {
        if !is_spike {
            return false;
        }

        if self.is_active(instrument) {
            debug!(instrument = %instrument, "alert already active; suppressed");
            return false;
        }

        self.states.insert(
            instrument.clone(),
            AlertState {
                is_active: true,
                activated_at_ms: Some(now_ms),
            },
        );

        true
    }

    /// Clears every alert flag once `reset_period` has elapsed since the last
    /// reset. Returns how many active alerts were cleared, or `None` when no
    /// reset happened.
    #[instrument(skip(self), target = "alerts")]
    pub fn reset_if_due(&mut self, now_ms: u64, reset_period: Option<Duration>) -> Option<usize> {
        let period_ms = reset_period?.as_millis() as u64;

        if now_ms.saturating_sub(self.last_reset_at_ms) < period_ms {
            return None;
        }

        let cleared = self.active_count();
        self.states.clear();
        self.last_reset_at_ms = now_ms;

        info!(cleared, "alert state reset");

        Some(cleared)
    }

    pub fn is_active(&self, instrument: &Instrument) -> bool {
        self.states
            .get(instrument)
            .map(|s| s.is_active)
            .unwrap_or(false)
    }

    pub fn state(&self, instrument: &Instrument) -> AlertState {
        self.states.get(instrument).copied().unwrap_or_default()
    }

    pub fn active_count(&self) -> usize {
        self.states.values().filter(|s| s.is_active).count()
    }

    pub fn last_reset_at_ms(&self) -> u64 {
        self.last_reset_at_ms
    }
}
