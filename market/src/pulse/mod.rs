//! Market Pulse Abstraction
//!
//! A pulse is a side-effect-free observer that derives a single market signal
//! from raw candles. Pulses do no I/O and hold no cross-cycle state, so the
//! same input always yields the same output.

pub mod volume;

pub use self::volume::{InsufficientData, VolumeSpikeDetector, score};
