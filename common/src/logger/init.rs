use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("global subscriber already set: {0}")]
    Init(#[from] TryInitError),
}

/// Where and how log lines are written.
#[derive(Clone, Debug, Default)]
pub struct LogOptions {
    /// Emit JSON lines on stdout instead of the pretty formatter.
    pub json: bool,

    /// Optional file that receives a plain-text copy of every event.
    pub file: Option<PathBuf>,
}

/// Installs the global tracing subscriber. Safe to call more than once; only
/// the first call has an effect.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logger(service_name: &'static str, opts: &LogOptions) -> Result<(), LoggerError> {
    LOGGER_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let file_layer = match &opts.file {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|source| LoggerError::LogFile {
                        path: path.clone(),
                        source,
                    })?;
                }

                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LoggerError::LogFile {
                        path: path.clone(),
                        source,
                    })?;

                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true)
                        .with_writer(Mutex::new(file)),
                )
            }
            None => None,
        };

        let base = fmt::layer()
            .with_target(true) // <-- shows crate/module path
            .with_thread_ids(true)
            .with_line_number(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        if opts.json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(base.json())
                .try_init()?;
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(base.pretty())
                .try_init()?;
        }

        tracing::info!(
            service = service_name,
            log_file = ?opts.file,
            "logger initialized"
        );

        Ok::<(), LoggerError>(())
    })?;

    Ok(())
}
