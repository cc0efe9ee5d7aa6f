//! Volume Spike Monitor
//!
//! Owns every piece of mutable state in the process (alert flags, cycle
//! counter) and drives the scan loop:
//!
//! IDLE -> FETCH_LIST -> per instrument (FETCH_CANDLES -> ANALYZE -> DECIDE
//! -> NOTIFY) -> SLEEP -> IDLE, until shutdown or, in single-shot mode, after
//! one cycle.
//!
//! Safety/liveness properties:
//! - One failing instrument never stops the rest of the cycle.
//! - A failed instrument listing skips the cycle; the loop sleeps and retries.
//! - A panic while checking an instrument is caught and counted like any
//!   other per-instrument failure; the cycle boundary catches the rest.
//! - Shutdown is only observed between instruments and while sleeping.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use common::TraceId;
use common::logger::{cycle_span, instrument_span, warn_if_slow};
use futures::FutureExt;
use market::pulse::VolumeSpikeDetector;
use market::{CandleInterval, FetchError, Instrument, MarketSource};
use tokio::time::Instant;
use tracing::{Instrument as _, debug, error, info, warn};

use crate::alert::AlertStore;
use crate::config::AppConfig;
use crate::notify::Notifier;
use crate::scanner::report::{CycleReport, InstrumentOutcome};
use crate::scanner::shutdown::Shutdown;

/// Candle fetches slower than this are logged as slow.
const SLOW_FETCH: Duration = Duration::from_secs(2);

/// Scan loop settings, derived from the validated config.
#[derive(Clone, Debug)]
pub struct ScanSettings {
    pub check_interval: Duration,
    pub api_delay: Duration,
    pub candle_interval: CandleInterval,
    pub candle_count: usize,
    pub alert_reset: Option<Duration>,
    pub run_once: bool,
    pub announce_startup: bool,
}

impl ScanSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            check_interval: cfg.check_interval,
            api_delay: cfg.api_delay,
            candle_interval: cfg.candle_interval,
            candle_count: cfg.candle_count,
            alert_reset: cfg.alert_reset,
            run_once: cfg.run_once,
            announce_startup: !cfg.run_once,
        }
    }
}

pub struct Monitor<M, N> {
    market: M,
    notifier: N,
    detector: VolumeSpikeDetector,
    settings: ScanSettings,

    /// Alert de-duplication state. Only this monitor mutates it.
    alerts: AlertStore,

    /// Origin of the monotonic millisecond clock fed to the alert store.
    started: Instant,

    cycles: u64,
}

impl<M: MarketSource, N: Notifier> Monitor<M, N> {
    pub fn new(
        market: M,
        notifier: N,
        detector: VolumeSpikeDetector,
        mut settings: ScanSettings,
    ) -> Self {
        settings.candle_count = settings.candle_count.max(detector.candles_needed());

        Self {
            market,
            notifier,
            detector,
            settings,
            alerts: AlertStore::new(0),
            started: Instant::now(),
            cycles: 0,
        }
    }

    pub fn alerts(&self) -> &AlertStore {
        &self.alerts
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Milliseconds since the monitor was created. Monotonic, so alert resets
    /// are immune to wall-clock jumps.
    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Runs cycles until shutdown, or exactly one cycle in single-shot mode.
    pub async fn run(&mut self, mut shutdown: Shutdown) {
        info!(
            check_interval_secs = self.settings.check_interval.as_secs(),
            candle_interval = %self.settings.candle_interval,
            sma_period = self.detector.sma_period,
            multiplier = self.detector.multiplier,
            run_once = self.settings.run_once,
            "volume monitor started"
        );

        if self.settings.announce_startup {
            if let Err(e) = self.notifier.notify_startup().await {
                warn!(error = %e, "startup message not delivered");
            }
        }

        loop {
            if shutdown.is_triggered() {
                break;
            }

            let started = Instant::now();

            let outcome = AssertUnwindSafe(self.run_cycle(&mut shutdown))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(report)) if report.cancelled => break,
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "instrument list unavailable; cycle skipped");
                }
                Err(panic) => {
                    error!(panic = %panic_message(panic.as_ref()), "scan cycle panicked");
                }
            }

            if self.settings.run_once {
                break;
            }

            let remaining = self
                .settings
                .check_interval
                .saturating_sub(started.elapsed());

            info!(
                next_in_secs = remaining.as_secs_f64(),
                "waiting for next cycle"
            );

            if shutdown.sleep(remaining).await {
                break;
            }
        }

        info!(cycles = self.cycles, "volume monitor stopped");
    }

    /// Executes one full pass over all instruments.
    ///
    /// Returns `Err` only when the instrument list cannot be fetched; every
    /// per-instrument failure is logged and counted in the report instead.
    pub async fn run_cycle(&mut self, shutdown: &mut Shutdown) -> Result<CycleReport, FetchError> {
        self.cycles += 1;
        let span = cycle_span(self.cycles, &TraceId::default());

        self.scan(shutdown).instrument(span).await
    }

    async fn scan(&mut self, shutdown: &mut Shutdown) -> Result<CycleReport, FetchError> {
        let instruments = self.market.list_instruments().await?;

        tracing::Span::current().record("instruments", instruments.len());

        let mut report = CycleReport {
            instruments: instruments.len(),
            ..Default::default()
        };

        if instruments.is_empty() {
            warn!("instrument list is empty; cycle skipped");
            return Ok(report);
        }

        info!(count = instruments.len(), "scan cycle started");

        for (idx, instrument) in instruments.iter().enumerate() {
            // The pause before every candle request keeps us under the
            // exchange rate limit, and doubles as a cancellation point.
            if shutdown.sleep(self.settings.api_delay).await {
                report.cancelled = true;
                report.skipped = instruments.len() - idx;
                break;
            }

            let checked = AssertUnwindSafe(self.check_instrument(instrument))
                .catch_unwind()
                .instrument(instrument_span(&instrument.id()))
                .await;

            let outcome = checked.unwrap_or_else(|panic| {
                error!(
                    instrument = %instrument,
                    panic = %panic_message(panic.as_ref()),
                    "instrument check panicked; skipping"
                );
                InstrumentOutcome::Panicked
            });

            report.record(outcome);
        }

        if report.cancelled {
            warn!(skipped = report.skipped, "scan cycle cancelled");
            return Ok(report);
        }

        let now_ms = self.now_ms();
        self.alerts.reset_if_due(now_ms, self.settings.alert_reset);

        if report.spikes > 0 {
            info!(
                instruments = report.instruments,
                spikes = report.spikes,
                notified = report.notified,
                suppressed = report.suppressed,
                fetch_failures = report.fetch_failures,
                delivery_failures = report.delivery_failures,
                panicked = report.panicked,
                "scan cycle finished"
            );
        } else {
            info!(
                instruments = report.instruments,
                insufficient = report.insufficient,
                fetch_failures = report.fetch_failures,
                panicked = report.panicked,
                "scan cycle finished; no spikes"
            );
        }

        Ok(report)
    }

    /// FETCH_CANDLES -> ANALYZE -> DECIDE -> NOTIFY for one instrument.
    async fn check_instrument(&mut self, instrument: &Instrument) -> InstrumentOutcome {
        let fetched = warn_if_slow(
            "get_candles",
            SLOW_FETCH,
            self.market.get_candles(
                instrument,
                self.settings.candle_interval,
                self.settings.candle_count,
            ),
        )
        .await;

        let candles = match fetched {
            Ok(c) => c,
            Err(e) => {
                warn!(instrument = %instrument, error = %e, "candle fetch failed; skipping");
                return InstrumentOutcome::FetchFailed;
            }
        };

        let score = match self.detector.score(instrument, &candles) {
            Ok(s) => s,
            Err(reason) => {
                debug!(instrument = %instrument, %reason, "not enough data to score");
                return InstrumentOutcome::Insufficient;
            }
        };

        let is_spike = self.detector.is_spike(&score);
        if !is_spike {
            debug!(instrument = %instrument, ratio = score.ratio, "volume normal");
            return InstrumentOutcome::Normal;
        }

        warn!(
            instrument = %instrument,
            current_volume = score.current_volume,
            average_volume = score.average_volume,
            ratio = score.ratio,
            "volume spike detected"
        );

        let now_ms = self.now_ms();
        if !self.alerts.should_notify(instrument, is_spike, now_ms) {
            return InstrumentOutcome::Suppressed;
        }

        match self.notifier.notify_spike(&score).await {
            Ok(()) => {
                info!(instrument = %instrument, ratio = score.ratio, "spike alert sent");
                InstrumentOutcome::Notified
            }
            Err(e) => {
                error!(
                    instrument = %instrument,
                    error = %e,
                    "spike alert delivery failed; dropped for this episode"
                );
                InstrumentOutcome::DeliveryFailed
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_readable() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");

        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
