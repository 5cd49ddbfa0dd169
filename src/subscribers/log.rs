//! # LogWriter: notification logger
//!
//! A minimal tap consumer that logs every posted [`Notification`](crate::Notification)
//! through `tracing`. Use it for debugging or demos.
//!
//! ## Example output
//! ```text
//! INFO notivisor: notification name=did-resize seq=12 sender=Some(0x6000022c8010) user_info=true
//! WARN notivisor: log writer lagged skipped=17
//! ```

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::Bus;

/// Notification logger driven by the bus broadcast tap.
#[derive(Debug, Clone)]
pub struct LogWriter {
    bus: Bus,
}

impl LogWriter {
    /// Construct a new [`LogWriter`] for `bus`.
    #[must_use]
    pub fn new(bus: Bus) -> Self {
        Self { bus }
    }

    /// Starts logging in a background task until `token` is cancelled.
    ///
    /// Subscribes immediately, so every notification posted after this call is
    /// seen. The task resolves to the number of notifications logged.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<u64> {
        let mut rx = self.bus.subscribe();

        tokio::spawn(async move {
            let mut logged = 0u64;
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(note) => {
                            logged += 1;
                            info!(
                                name = %note.name,
                                seq = note.seq,
                                sender = ?note.sender_id(),
                                user_info = note.user_info.is_some(),
                                "notification"
                            );
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "log writer lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = token.cancelled() => break,
                }
            }
            debug!(logged, "log writer stopped");
            logged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Notification;

    #[tokio::test]
    async fn test_logs_posted_notifications_until_cancelled() {
        let bus = Bus::new(16);
        let token = CancellationToken::new();
        let handle = LogWriter::new(bus.clone()).spawn(token.clone());

        bus.post(Notification::new("a"));
        bus.post(Notification::new("b").with_user_info(1u8));
        bus.post_named("c", None);
        token.cancel();

        assert_eq!(handle.await.expect("log writer panicked"), 3);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_lag_is_survived() {
        let bus = Bus::new(1);
        let token = CancellationToken::new();
        let handle = LogWriter::new(bus.clone()).spawn(token.clone());

        // The writer cannot run before we yield, so all but the last are overwritten.
        for i in 0..5 {
            bus.post(Notification::new(format!("n{i}")));
        }
        token.cancel();

        assert_eq!(handle.await.expect("log writer panicked"), 1);
    }
}
