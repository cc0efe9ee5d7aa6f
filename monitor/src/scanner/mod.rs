//! Scan cycle orchestration.
//!
//! One cycle: list instruments, then for each instrument fetch candles,
//! score volume, decide via the alert store and notify. Failures are
//! isolated per instrument; only a failed instrument listing skips a cycle.

pub mod monitor;
pub mod report;
pub mod shutdown;

pub use monitor::{Monitor, ScanSettings};
pub use report::{CycleReport, InstrumentOutcome};
pub use shutdown::Shutdown;
