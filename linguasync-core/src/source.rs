//! Playback source trait.

use crate::error::Result;
use crate::playback::PlaybackSnapshot;
use async_trait::async_trait;

/// Something that can report what is playing right now.
///
/// Sources are polled by [`SyncPoller`](crate::SyncPoller); each call should
/// make at most one request to the underlying player or service.
///
/// - `Ok(None)` means nothing is playing (no active device, ad break, etc.)
/// - `Err(_)` is a transient failure; the poller logs it and backs off
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    /// Returns a human-readable name for this source.
    fn name(&self) -> &'static str;

    /// Fetch the current playback snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the source could not be queried.
    async fn snapshot(&self) -> Result<Option<PlaybackSnapshot>>;
}
