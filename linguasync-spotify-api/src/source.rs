//! Spotify playback state as a [`PlaybackSource`].

use crate::auth::SpotifyAuth;
use crate::config::PROVIDER_NAME;
use crate::error::SpotifyError;
use async_trait::async_trait;
use linguasync_core::{CoreError, DurationExt, PlaybackSnapshot, PlaybackSource, TrackInfo};
use rspotify::model::{CurrentPlaybackContext, PlayableItem};
use rspotify::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

const LOG_TARGET: &str = "linguasync::spotify";

pub struct SpotifyPlaybackSource {
    auth: Arc<SpotifyAuth>,
}

impl SpotifyPlaybackSource {
    #[must_use]
    pub const fn new(auth: Arc<SpotifyAuth>) -> Self {
        Self { auth }
    }

    async fn current_playback(&self) -> Result<Option<PlaybackSnapshot>, SpotifyError> {
        self.auth.ensure_token_fresh().await?;

        let request_start = Instant::now();
        let playback = match self
            .auth
            .client()
            .current_playback(None, None::<Vec<_>>)
            .await
        {
            Ok(playback) => playback,
            Err(e) => {
                // A rejected token surfaces as an API error; renew it for the next poll
                if let Err(refresh_err) = self.auth.refresh_token().await {
                    error!(target: LOG_TARGET, "Token refresh failed: {}", refresh_err);
                }
                return Err(e.into());
            }
        };
        let request_latency = request_start.elapsed();

        Ok(playback.and_then(|context| snapshot_from_context(&context, request_latency)))
    }
}

#[async_trait]
impl PlaybackSource for SpotifyPlaybackSource {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn snapshot(&self) -> Result<Option<PlaybackSnapshot>, CoreError> {
        let snapshot = self.current_playback().await?;
        debug!(
            target: LOG_TARGET,
            "Polled Spotify: playing={:?}, track={:?}, position={:?}",
            snapshot.as_ref().map(|s| s.is_playing),
            snapshot.as_ref().map(|s| &s.track.name),
            snapshot.as_ref().map(|s| s.position_ms)
        );
        Ok(snapshot)
    }
}

/// Turn a playback context into a snapshot; `None` when nothing identifiable
/// is playing (e.g. an ad).
fn snapshot_from_context(
    context: &CurrentPlaybackContext,
    request_latency: Duration,
) -> Option<PlaybackSnapshot> {
    let track = track_from_item(context.item.as_ref()?);
    let progress = context
        .progress
        .and_then(|p| p.to_std().ok());
    let position = compensate_latency(progress, request_latency);

    Some(PlaybackSnapshot::new(
        track,
        position.as_millis_u64(),
        context.is_playing,
    ))
}

fn track_from_item(item: &PlayableItem) -> TrackInfo {
    match item {
        PlayableItem::Track(track) => {
            let duration = track.duration.to_std().unwrap_or(Duration::ZERO);
            let artists = track.artists.iter().map(|a| a.name.clone()).collect();
            let info = TrackInfo::new(
                PROVIDER_NAME,
                &track.name,
                "",
                &track.album.name,
                duration.as_millis_u64(),
            )
            .with_artists(artists);
            // Use just the ID part, not the full URI (spotify:track:xxx -> xxx)
            match &track.id {
                Some(id) => info.with_id(id.id()),
                None => info,
            }
        }
        PlayableItem::Episode(episode) => {
            let duration = episode.duration.to_std().unwrap_or(Duration::ZERO);
            TrackInfo::new(
                PROVIDER_NAME,
                &episode.name,
                &episode.show.name,
                "",
                duration.as_millis_u64(),
            )
            .with_id(episode.id.id())
        }
    }
}

/// Reported progress shifted by half the request latency, assuming the
/// position was sampled halfway through the request.
fn compensate_latency(progress: Option<Duration>, request_latency: Duration) -> Duration {
    progress.map_or(Duration::ZERO, |p| p + request_latency / 2)
}
