use linguasync_core::CoreError;
use thiserror::Error;

/// Errors from the Spotify playback source.
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// Token could not be installed, locked, or refreshed.
    #[error("Spotify authentication failed: {reason}")]
    AuthFailed { reason: String },

    /// Error from the Spotify API client.
    #[error("Spotify API error: {0}")]
    Api(#[from] rspotify::ClientError),
}

impl From<SpotifyError> for CoreError {
    fn from(err: SpotifyError) -> Self {
        Self::PlaybackSourceFailed {
            source_name: crate::config::PROVIDER_NAME.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Convenience type alias for Results with `SpotifyError`.
pub type Result<T> = std::result::Result<T, SpotifyError>;
