use std::time::Duration;

use tokio::sync::watch;

/// Cooperative cancellation signal.
///
/// The scan loop only looks at it between instruments and while sleeping, so
/// an in-flight request always completes.
#[derive(Clone, Debug)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Returns the trigger side and the signal. Sending `true` requests a stop.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleeps for `duration` unless shutdown is requested first. Returns true
    /// if the sleep was cut short by (or started after) a shutdown request.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }

        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        let rx = &mut self.rx;
        tokio::select! {
            _ = &mut sleep => {}
            stopped = async { rx.wait_for(|stop| *stop).await.is_ok() } => {
                if stopped {
                    return true;
                }
                // Trigger side is gone; nobody can stop us any more.
                (&mut sleep).await;
            }
        }

        self.is_triggered()
    }
}
