pub mod discord;
pub mod errors;
pub mod format;

pub use discord::DiscordNotifier;
pub use errors::NotifyError;

use async_trait::async_trait;
use market::SpikeScore;

/// Outbound alert channel.
///
/// Each call is a single delivery attempt bounded by the implementation's
/// timeout. Callers never retry within a cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_spike(&self, score: &SpikeScore) -> Result<(), NotifyError>;

    /// One-off message announcing that monitoring has started.
    async fn notify_startup(&self) -> Result<(), NotifyError>;
}
