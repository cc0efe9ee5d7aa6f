use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use common::init_logger;
use market::bithumb::BithumbClient;
use market::pulse::VolumeSpikeDetector;
use monitor::{
    config::{AppConfig, Cli},
    notify::DiscordNotifier,
    scanner::{Monitor, ScanSettings, Shutdown},
};

/// Exit code for a rejected startup configuration.
const EXIT_CONFIG: u8 = 2;

/// Builds the market client and notifier, then runs the scan loop until it
/// finishes (single-shot) or Ctrl-C is received.
async fn start(cfg: AppConfig) -> anyhow::Result<()> {
    let market = BithumbClient::new(cfg.api_url.clone(), cfg.quote.clone(), cfg.api_timeout)
        .context("failed to build market data client")?;

    let notifier = DiscordNotifier::new(
        cfg.webhook_url.clone(),
        cfg.webhook_timeout,
        cfg.candle_interval,
        cfg.sma_period,
    )
    .context("failed to build webhook client")?;

    let detector = VolumeSpikeDetector::new(cfg.sma_period, cfg.volume_multiplier);
    let mut app = Monitor::new(market, notifier, detector, ScanSettings::from_config(&cfg));

    let (stop_tx, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = stop_tx.send(true);
        }
    });

    app.run(shutdown).await;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logger("volume-monitor", &cli.log_options()) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    let cfg = match AppConfig::from_cli(&cli) {
        Ok(cfg) => cfg,
        Err(invalid) => {
            for e in &invalid.0 {
                tracing::error!(error = %e, "configuration error");
            }
            tracing::error!("{invalid}; exiting");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = start(cfg).await {
        tracing::error!(error = ?e, "volume monitor failed to start");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
