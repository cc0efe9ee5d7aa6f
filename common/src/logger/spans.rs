use std::time::Duration;

use tracing::{Span, field};

use super::TraceId;

/// Root span for one full scan cycle.
pub fn cycle_span(cycle: u64, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "cycle",
        cycle,
        trace_id = %trace_id.as_str(),
        instruments = field::Empty
    )
}

/// Child span for the work done on a single instrument.
pub fn instrument_span(instrument: &str) -> Span {
    tracing::debug_span!("instrument", instrument = %instrument)
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
