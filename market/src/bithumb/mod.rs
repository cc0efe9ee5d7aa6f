pub mod client;
pub mod types;

pub use client::{BithumbClient, DEFAULT_BASE_URL};
pub use types::{parse_candles, parse_markets};
