use crate::time::millis_to_rounded_secs;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Information about the currently playing track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    /// Name of the source that reported the track (e.g. "spotify")
    pub source: String,
    /// Source-assigned track ID, if the source has one
    pub id: Option<String>,
    /// Track name
    pub name: String,
    /// Primary artist, used for lyrics lookup
    pub artist: String,
    /// All credited artists
    pub artists: Vec<String>,
    /// Album name
    pub album: String,
    /// Track duration in milliseconds
    pub duration_ms: u64,
}

/// What makes two tracks "the same" for deciding when to reload lyrics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackIdentity {
    /// Source-assigned ID
    Id { source: String, id: String },
    /// Metadata tuple, for sources without stable IDs
    Metadata {
        name: String,
        artist: String,
        album: String,
        duration_ms: u64,
    },
}

impl TrackInfo {
    /// Create a new track info with a single artist and no ID
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        let artist = artist.into();
        Self {
            source: source.into(),
            id: None,
            name: name.into(),
            artists: vec![artist.clone()],
            artist,
            album: album.into(),
            duration_ms,
        }
    }

    /// Set the source-assigned track ID
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set all credited artists; the first becomes the primary artist
    #[must_use]
    pub fn with_artists(mut self, artists: Vec<String>) -> Self {
        if let Some(first) = artists.first() {
            self.artist.clone_from(first);
        }
        self.artists = artists;
        self
    }

    #[must_use]
    pub fn identity(&self) -> TrackIdentity {
        match self.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => TrackIdentity::Id {
                source: self.source.clone(),
                id: id.to_string(),
            },
            None => TrackIdentity::Metadata {
                name: self.name.clone(),
                artist: self.artist.clone(),
                album: self.album.clone(),
                duration_ms: self.duration_ms,
            },
        }
    }

    /// Duration rounded to whole seconds (for lyrics query)
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        millis_to_rounded_secs(self.duration_ms)
    }
}

/// One report from a playback source: which track, and how far into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub track: TrackInfo,
    /// Playback position in milliseconds
    pub position_ms: u64,
    pub is_playing: bool,
    /// When the source produced this snapshot
    pub captured_at: DateTime<Utc>,
}

impl PlaybackSnapshot {
    #[must_use]
    pub fn new(track: TrackInfo, position_ms: u64, is_playing: bool) -> Self {
        Self {
            track,
            position_ms,
            is_playing,
            captured_at: Utc::now(),
        }
    }
}
