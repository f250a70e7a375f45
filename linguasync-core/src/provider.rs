use crate::error::CoreError;
use crate::lrc::Timeline;
use crate::playback::TrackInfo;
use async_trait::async_trait;

/// Query parameters for fetching lyrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    /// Track name
    pub track_name: String,
    /// Artist name
    pub artist_name: String,
    /// Album name (optional)
    pub album_name: Option<String>,
    /// Track duration in seconds (for matching)
    pub duration_secs: Option<u32>,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            album_name: None,
            duration_secs: None,
        }
    }

    /// Build a query from track info, skipping an empty album or zero duration
    #[must_use]
    pub fn for_track(track: &TrackInfo) -> Self {
        let mut query = Self::new(&track.name, &track.artist);
        if !track.album.is_empty() {
            query = query.with_album(&track.album);
        }
        if track.duration_ms > 0 {
            query = query.with_duration(track.duration_secs());
        }
        query
    }

    /// Set album name
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album_name = Some(album.into());
        self
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}

/// Raw lyric text as returned by a provider, not yet parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLyrics {
    /// Timestamp-tagged lyrics
    pub synced: Option<String>,
    /// Plain text lyrics without timing
    pub plain: Option<String>,
}

impl RawLyrics {
    /// Parse the synced lyrics into a timeline, if there are any
    #[must_use]
    pub fn timeline(&self) -> Option<Timeline> {
        self.synced.as_deref().map(Timeline::parse)
    }
}

/// Result from a lyrics provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsResult {
    Found(RawLyrics),
    /// No lyrics found
    NotFound,
}

/// Lyrics with provider metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedLyrics {
    /// The lyrics result
    pub result: LyricsResult,
    /// Provider-specific ID (e.g., LRCLIB's numeric ID as string)
    pub provider_id: String,
}

/// Trait for lyrics providers
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch lyrics for a query
    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError>;
}

#[async_trait]
impl<T: LyricsProvider + ?Sized> LyricsProvider for std::sync::Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        (**self).fetch(query).await
    }
}
