mod init;
mod spans;
mod trace_id;

pub use init::{LogOptions, LoggerError, init_logger};
pub use spans::{cycle_span, instrument_span, warn_if_slow};
pub use trace_id::TraceId;
