pub mod logger;

pub use logger::{LogOptions, LoggerError, TraceId, init_logger};
