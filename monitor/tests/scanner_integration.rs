
use std::time::Duration;

use market::CandleInterval;
use market::pulse::VolumeSpikeDetector;
use monitor::scanner::{Monitor, ScanSettings, Shutdown};

use mock_services::{MockMarket, MockNotifier, baseline_then, candles};

const MULTIPLIER: f64 = 5.0;
const SMA: usize = 20;

fn settings() -> ScanSettings {
    ScanSettings {
        check_interval: Duration::from_secs(60),
        api_delay: Duration::ZERO,
        candle_interval: CandleInterval::M5,
        candle_count: 50,
        alert_reset: None,
        run_once: false,
        announce_startup: true,
    }
}

fn monitor_with(
    market: &MockMarket,
    notifier: &MockNotifier,
    settings: ScanSettings,
) -> Monitor<MockMarket, MockNotifier> {
    Monitor::new(
        market.clone(),
        notifier.clone(),
        VolumeSpikeDetector::new(SMA, MULTIPLIER),
        settings,
    )
}

/// Sends the stop signal after `after` of (virtual) time.
fn stop_after(after: Duration) -> Shutdown {
    let (tx, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let _ = tx.send(true);
    });
    shutdown
}

#[tokio::test(start_paused = true)]
async fn spike_notifies_once_with_ratio_six_then_stays_quiet() {
    let market = MockMarket::new().with("XYZ", baseline_then(600.0));
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());
    let (_tx, mut shutdown) = Shutdown::channel();

    let first = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert_eq!(first.notified, 1);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].instrument.id(), "XYZ/KRW");
    assert_eq!(sent[0].average_volume, 100.0);
    assert_eq!(sent[0].current_volume, 600.0);
    assert_eq!(sent[0].ratio, 6.0);
    assert_eq!(sent[0].current_price, 1_050.0);

    let second = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert_eq!(second.notified, 0);
    assert_eq!(second.suppressed, 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn sustained_spike_alerts_only_in_first_of_three_cycles() {
    let market = MockMarket::new().with("XYZ", baseline_then(900.0));
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());
    let (_tx, mut shutdown) = Shutdown::channel();

    let mut notified = Vec::new();
    for _ in 0..3 {
        notified.push(monitor.run_cycle(&mut shutdown).await.unwrap().notified);
    }

    assert_eq!(notified, vec![1, 0, 0]);
}

#[tokio::test(start_paused = true)]
async fn failing_instrument_does_not_block_the_others() {
    let market = MockMarket::new()
        .with("AAA", baseline_then(600.0))
        .with("BBB", baseline_then(600.0))
        .with("CCC", baseline_then(600.0))
        .with("DDD", baseline_then(600.0));
    market.fail_candles("BBB");
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());
    let (_tx, mut shutdown) = Shutdown::channel();

    let report = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert_eq!(report.instruments, 4);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.notified, 3);
    assert_eq!(notifier.sent_bases(), vec!["AAA", "CCC", "DDD"]);
    assert_eq!(market.candle_calls(), vec!["AAA", "BBB", "CCC", "DDD"]);
}

#[tokio::test(start_paused = true)]
async fn short_or_flat_history_is_skipped_quietly() {
    let market = MockMarket::new()
        .with("NEW", candles(&[10.0, 20.0, 9_000.0]))
        .with("DEAD", candles(&[0.0; 21]))
        .with("XYZ", baseline_then(600.0))
        .with("CALM", baseline_then(120.0));
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());
    let (_tx, mut shutdown) = Shutdown::channel();

    let report = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert_eq!(report.insufficient, 2);
    assert_eq!(report.analyzed, 2);
    assert_eq!(report.spikes, 1);
    assert_eq!(notifier.sent_bases(), vec!["XYZ"]);
}

#[tokio::test(start_paused = true)]
async fn failed_delivery_is_not_retried_within_the_episode() {
    let market = MockMarket::new().with("XYZ", baseline_then(600.0));
    let notifier = MockNotifier::new();
    notifier.fail_for("XYZ");
    let mut monitor = monitor_with(&market, &notifier, settings());
    let (_tx, mut shutdown) = Shutdown::channel();

    let first = monitor.run_cycle(&mut shutdown).await.unwrap();
    let second = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert_eq!(first.delivery_failures, 1);
    assert_eq!(second.suppressed, 1);
    assert_eq!(notifier.attempts(), vec!["XYZ"]);
    assert!(notifier.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dip_below_threshold_does_not_rearm_alert() {
    let market = MockMarket::new().with("XYZ", baseline_then(600.0));
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());
    let (_tx, mut shutdown) = Shutdown::channel();

    monitor.run_cycle(&mut shutdown).await.unwrap();
    market.set_candles("XYZ", baseline_then(100.0));
    monitor.run_cycle(&mut shutdown).await.unwrap();
    market.set_candles("XYZ", baseline_then(700.0));
    let third = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert_eq!(third.suppressed, 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reset_rearms_instruments_that_are_still_spiking() {
    let market = MockMarket::new().with("XYZ", baseline_then(600.0));
    let notifier = MockNotifier::new();
    let mut cfg = settings();
    cfg.alert_reset = Some(Duration::from_secs(3_600));
    let mut monitor = monitor_with(&market, &notifier, cfg);
    let (_tx, mut shutdown) = Shutdown::channel();

    assert_eq!(monitor.run_cycle(&mut shutdown).await.unwrap().notified, 1);

    tokio::time::advance(Duration::from_secs(1_800)).await;
    assert_eq!(monitor.run_cycle(&mut shutdown).await.unwrap().suppressed, 1);

    // This cycle crosses the reset period; the reset runs at its end.
    tokio::time::advance(Duration::from_secs(1_800)).await;
    assert_eq!(monitor.run_cycle(&mut shutdown).await.unwrap().suppressed, 1);
    assert_eq!(monitor.alerts().active_count(), 0);

    assert_eq!(monitor.run_cycle(&mut shutdown).await.unwrap().notified, 1);
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn list_failure_skips_the_cycle() {
    let market = MockMarket::new().with("XYZ", baseline_then(600.0));
    market.fail_next_lists(1);
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());
    let (_tx, mut shutdown) = Shutdown::channel();

    assert!(monitor.run_cycle(&mut shutdown).await.is_err());
    assert!(market.candle_calls().is_empty());

    assert_eq!(monitor.run_cycle(&mut shutdown).await.unwrap().notified, 1);
}

#[tokio::test(start_paused = true)]
async fn empty_listing_skips_cycle_and_reset() {
    let market = MockMarket::new();
    let notifier = MockNotifier::new();
    let mut cfg = settings();
    cfg.alert_reset = Some(Duration::from_secs(60));
    let mut monitor = monitor_with(&market, &notifier, cfg);
    let (_tx, mut shutdown) = Shutdown::channel();

    tokio::time::advance(Duration::from_secs(120)).await;
    let report = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert_eq!(report.instruments, 0);
    assert_eq!(report.visited(), 0);
    assert_eq!(monitor.alerts().last_reset_at_ms(), 0);
}

#[tokio::test(start_paused = true)]
async fn run_once_executes_a_single_cycle_without_startup_message() {
    let market = MockMarket::new().with("XYZ", baseline_then(600.0));
    let notifier = MockNotifier::new();
    let mut cfg = settings();
    cfg.run_once = true;
    cfg.announce_startup = false;
    let mut monitor = monitor_with(&market, &notifier, cfg);
    let (_tx, shutdown) = Shutdown::channel();

    monitor.run(shutdown).await;

    assert_eq!(monitor.cycles(), 1);
    assert_eq!(market.list_calls(), 1);
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(notifier.startups(), 0);
}

#[tokio::test(start_paused = true)]
async fn continuous_run_repeats_on_interval_until_shutdown() {
    let market = MockMarket::new().with("XYZ", baseline_then(600.0));
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());

    // Cycles start at t=0, 60 and 120; the stop lands while sleeping to 180.
    monitor.run(stop_after(Duration::from_secs(150))).await;

    assert_eq!(monitor.cycles(), 3);
    assert_eq!(notifier.startups(), 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn list_failure_sleeps_then_retries() {
    let market = MockMarket::new().with("XYZ", baseline_then(600.0));
    market.fail_next_lists(1);
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());

    monitor.run(stop_after(Duration::from_secs(90))).await;

    assert_eq!(market.list_calls(), 2);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn overlong_cycle_starts_next_one_immediately() {
    let market = MockMarket::new()
        .with("AAA", baseline_then(100.0))
        .with("BBB", baseline_then(100.0));
    let notifier = MockNotifier::new();
    let mut cfg = settings();
    cfg.api_delay = Duration::from_secs(40);
    let mut monitor = monitor_with(&market, &notifier, cfg);

    // First cycle takes 80s (> 60s interval), so the second starts at t=80
    // rather than t=140, and is cut short at t=100 during its first delay.
    monitor.run(stop_after(Duration::from_secs(100))).await;

    assert_eq!(market.list_calls(), 2);
    assert_eq!(market.candle_calls(), vec!["AAA", "BBB"]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_honoured_between_instruments() {
    let market = MockMarket::new()
        .with("A1", baseline_then(600.0))
        .with("A2", baseline_then(600.0))
        .with("A3", baseline_then(600.0))
        .with("A4", baseline_then(600.0))
        .with("A5", baseline_then(600.0));
    let notifier = MockNotifier::new();
    let mut cfg = settings();
    cfg.api_delay = Duration::from_secs(10);
    let mut monitor = monitor_with(&market, &notifier, cfg);
    let mut shutdown = stop_after(Duration::from_secs(25));

    let report = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.visited(), 2);
    assert_eq!(report.skipped, 3);
    assert_eq!(notifier.sent_bases(), vec!["A1", "A2"]);
}

#[tokio::test(start_paused = true)]
async fn panicking_instrument_does_not_block_the_rest_of_the_cycle() {
    let market = MockMarket::new()
        .with("BAD", baseline_then(600.0))
        .with("XYZ", baseline_then(600.0));
    market.panic_on("BAD");
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());
    let (_tx, mut shutdown) = Shutdown::channel();

    let report = monitor.run_cycle(&mut shutdown).await.unwrap();

    assert_eq!(report.panicked, 1);
    assert_eq!(report.notified, 1);
    assert_eq!(notifier.sent_bases(), vec!["XYZ"]);
}

#[tokio::test(start_paused = true)]
async fn panicking_instrument_is_retried_every_cycle_without_stalling_the_loop() {
    let market = MockMarket::new()
        .with("BAD", baseline_then(600.0))
        .with("XYZ", baseline_then(600.0));
    market.panic_on("BAD");
    let notifier = MockNotifier::new();
    let mut monitor = monitor_with(&market, &notifier, settings());

    monitor.run(stop_after(Duration::from_secs(90))).await;

    assert_eq!(monitor.cycles(), 2);
    assert_eq!(market.candle_calls(), vec!["BAD", "XYZ", "BAD", "XYZ"]);
    assert_eq!(notifier.sent_bases(), vec!["XYZ"]);
}
