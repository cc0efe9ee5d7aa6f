/// What happened to a single instrument during a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstrumentOutcome {
    /// Scored below the multiplier.
    Normal,
    /// Not enough history (or zero baseline) to score.
    Insufficient,
    /// Candle request failed.
    FetchFailed,
    /// Spike, but an alert is already active for this episode.
    Suppressed,
    /// Spike, alert delivered.
    Notified,
    /// Spike, alert delivery failed. The episode is not retried.
    DeliveryFailed,
    /// The check panicked before producing an outcome.
    Panicked,
}

/// Per-cycle tally, logged at the end of every cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub instruments: usize,
    pub analyzed: usize,
    pub spikes: usize,
    pub notified: usize,
    pub suppressed: usize,
    pub insufficient: usize,
    pub fetch_failures: usize,
    pub delivery_failures: usize,
    pub panicked: usize,
    /// Instruments left unvisited because shutdown was requested.
    pub skipped: usize,
    pub cancelled: bool,
}

impl CycleReport {
    pub fn record(&mut self, outcome: InstrumentOutcome) {
        match outcome {
            InstrumentOutcome::Normal => self.analyzed += 1,
            InstrumentOutcome::Insufficient => self.insufficient += 1,
            InstrumentOutcome::FetchFailed => self.fetch_failures += 1,
            InstrumentOutcome::Suppressed => {
                self.analyzed += 1;
                self.spikes += 1;
                self.suppressed += 1;
            }
            InstrumentOutcome::Notified => {
                self.analyzed += 1;
                self.spikes += 1;
                self.notified += 1;
            }
            InstrumentOutcome::DeliveryFailed => {
                self.analyzed += 1;
                self.spikes += 1;
                self.delivery_failures += 1;
            }
            InstrumentOutcome::Panicked => self.panicked += 1,
        }
    }

    /// Instruments that were visited (successfully or not).
    pub fn visited(&self) -> usize {
        self.analyzed + self.insufficient + self.fetch_failures + self.panicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_tallied() {
        let mut r = CycleReport::default();
        for o in [
            InstrumentOutcome::Normal,
            InstrumentOutcome::Insufficient,
            InstrumentOutcome::FetchFailed,
            InstrumentOutcome::Suppressed,
            InstrumentOutcome::Notified,
            InstrumentOutcome::DeliveryFailed,
            InstrumentOutcome::Panicked,
        ] {
            r.record(o);
        }

        assert_eq!(r.analyzed, 4);
        assert_eq!(r.spikes, 3);
        assert_eq!(r.notified, 1);
        assert_eq!(r.suppressed, 1);
        assert_eq!(r.delivery_failures, 1);
        assert_eq!(r.panicked, 1);
        assert_eq!(r.visited(), 7);
    }
}
