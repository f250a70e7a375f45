//! Fixed-interval poll loop feeding a [`LyricsSession`].

use crate::error::Result;
use crate::session::{LyricFrame, LyricsSession};
use crate::source::PlaybackSource;
use crate::time::DurationExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Polls a [`PlaybackSource`] and ticks the session with each snapshot.
pub struct SyncPoller {
    source: Arc<dyn PlaybackSource>,
    session: Arc<LyricsSession>,
    poll_interval: Duration,
    cancel_token: CancellationToken,
}

impl SyncPoller {
    /// Create a new poller
    ///
    /// # Arguments
    /// * `source` - Where playback snapshots come from
    /// * `session` - Session to tick with each snapshot
    /// * `poll_interval` - Delay between polls
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    #[must_use]
    pub fn new(
        source: Arc<dyn PlaybackSource>,
        session: Arc<LyricsSession>,
        poll_interval: Duration,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            source,
            session,
            poll_interval,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start polling in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Take one snapshot and feed it to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the playback source could not be queried.
    pub async fn poll_once(&self) -> Result<Option<LyricFrame>> {
        let snapshot = self.source.snapshot().await?;

        debug!(
            "Polled {}: playing={:?}, track={:?}, position={:?}",
            self.source.name(),
            snapshot.as_ref().map(|s| s.is_playing),
            snapshot.as_ref().map(|s| &s.track.name),
            snapshot.as_ref().map(|s| s.position_ms)
        );

        Ok(self.session.tick(snapshot).await)
    }

    /// Poll until the cancel token fires
    pub async fn run(&self) {
        info!("Starting {} playback poller", self.source.name());

        let mut consecutive_errors = 0;

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Poller shutting down gracefully");
                    break;
                }
                () = tokio::time::sleep(self.poll_interval) => {
                    match self.poll_once().await {
                        Ok(_) => {
                            consecutive_errors = 0;
                        }
                        Err(e) => {
                            consecutive_errors += 1;
                            warn!("Poll error (attempt {}): {}", consecutive_errors, e);

                            let backoff = backoff_delay(consecutive_errors);
                            if consecutive_errors >= 5 {
                                error!(
                                    "Too many consecutive errors, waiting {} seconds",
                                    backoff.as_secs()
                                );
                            }

                            tokio::select! {
                                () = self.cancel_token.cancelled() => {}
                                () = tokio::time::sleep(backoff) => {}
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Exponential backoff: 100ms * 2^errors, capped at 30s
fn backoff_delay(consecutive_errors: u32) -> Duration {
    // Exponent capped at 10, so the uncapped maximum is 102,400ms
    let backoff_ms = 100_u64.saturating_mul(2_u64.saturating_pow(consecutive_errors.min(10)));
    Duration::from_millis(backoff_ms.min(MAX_BACKOFF.as_millis_u64()))
}
