pub mod bithumb;
pub mod errors;
pub mod pulse;
pub mod source;
pub mod types;

pub use errors::FetchError;
pub use source::MarketSource;
pub use types::{Candle, CandleInterval, Instrument, SpikeScore};
