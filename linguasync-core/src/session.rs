//! Per-listener session joining playback snapshots, lyrics and translations.

use crate::lrc::{TimedLine, Timeline};
use crate::playback::{PlaybackSnapshot, TrackIdentity, TrackInfo};
use crate::provider::{LyricsProvider, LyricsQuery, LyricsResult};
use crate::translation::TranslationCache;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// A lyric line together with its translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatedLine {
    pub offset_ms: u64,
    pub text: String,
    /// Equal to `text` when translation failed
    pub translation: String,
}

/// What the listener should see for one poll tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LyricFrame {
    pub track: TrackInfo,
    pub position_ms: u64,
    pub is_playing: bool,
    /// Target language display name
    pub language: String,
    pub current: Option<TranslatedLine>,
    pub next: Option<TranslatedLine>,
}

/// Events emitted by the session
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Track changed to a new track
    TrackChanged { track: TrackInfo },
    /// Playback stopped (no track playing)
    PlaybackStopped,
    /// Lyrics were loaded for current track
    LyricsLoaded { track: TrackInfo, line_count: usize },
    /// No synced lyrics found for current track
    LyricsNotFound { track: TrackInfo },
    /// The current or next line changed
    LineChanged { frame: LyricFrame },
}

#[derive(Default)]
struct SessionState {
    identity: Option<TrackIdentity>,
    timeline: Option<Arc<Timeline>>,
    /// (current, next) lines of the last published frame
    last_lines: Option<(Option<TranslatedLine>, Option<TranslatedLine>)>,
}

/// Session that owns the timeline for the active track and the translation cache.
///
/// Drive it with [`LyricsSession::tick`] once per playback snapshot. The
/// timeline is swapped wholesale on track change before any matching happens.
pub struct LyricsSession {
    providers: Vec<Box<dyn LyricsProvider>>,
    translations: Arc<TranslationCache>,
    language: RwLock<String>,
    state: RwLock<SessionState>,
    generation: AtomicU64,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl LyricsSession {
    /// Create a new session
    ///
    /// # Arguments
    /// * `providers` - Lyrics providers to try in order
    /// * `translations` - Translation cache owned by this session
    /// * `language` - Target language display name (e.g. "Turkish")
    #[must_use]
    pub fn new(
        providers: Vec<Box<dyn LyricsProvider>>,
        translations: Arc<TranslationCache>,
        language: impl Into<String>,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(64);

        Arc::new(Self {
            providers,
            translations,
            language: RwLock::new(language.into()),
            state: RwLock::new(SessionState::default()),
            generation: AtomicU64::new(0),
            event_tx,
        })
    }

    /// Subscribe to sync events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    pub async fn language(&self) -> String {
        self.language.read().await.clone()
    }

    /// Change the target language; the next tick republishes its frame.
    pub async fn set_language(&self, language: impl Into<String>) {
        *self.language.write().await = language.into();
        self.state.write().await.last_lines = None;
    }

    /// Timeline of the current track, if lyrics were found
    pub async fn timeline(&self) -> Option<Arc<Timeline>> {
        self.state.read().await.timeline.clone()
    }

    /// Process one playback snapshot.
    ///
    /// Returns `None` when nothing is playing, when the track has no synced
    /// lyrics, or when a newer tick started while this one was translating.
    pub async fn tick(&self, snapshot: Option<PlaybackSnapshot>) -> Option<LyricFrame> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(snapshot) = snapshot else {
            self.stop().await;
            return None;
        };

        let timeline = self.timeline_for(&snapshot.track, generation).await?;
        let matched = timeline.match_position(snapshot.position_ms);
        let language = self.language().await;

        let (current, next) = tokio::join!(
            self.translate_line(matched.current, &language),
            self.translate_line(matched.next, &language),
        );

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale tick {} at {}ms", generation, snapshot.position_ms);
            return None;
        }

        let frame = LyricFrame {
            track: snapshot.track,
            position_ms: snapshot.position_ms,
            is_playing: snapshot.is_playing,
            language,
            current,
            next,
        };

        self.publish_if_changed(&frame).await;
        Some(frame)
    }

    async fn translate_line(
        &self,
        line: Option<&TimedLine>,
        language: &str,
    ) -> Option<TranslatedLine> {
        let line = line?;
        let translation = self.translations.translate(line.text(), language).await;
        Some(TranslatedLine {
            offset_ms: line.offset_ms(),
            text: line.text().to_string(),
            translation,
        })
    }

    /// Publish `frame` unless it shows the same lines and translations as the last one
    async fn publish_if_changed(&self, frame: &LyricFrame) {
        let lines = (frame.current.clone(), frame.next.clone());
        let mut state = self.state.write().await;
        if state.last_lines.as_ref() == Some(&lines) {
            return;
        }
        state.last_lines = Some(lines);
        let _ = self.event_tx.send(SyncEvent::LineChanged {
            frame: frame.clone(),
        });
    }

    async fn stop(&self) {
        let mut state = self.state.write().await;
        if state.identity.is_some() {
            info!("Playback stopped");
            let _ = self.event_tx.send(SyncEvent::PlaybackStopped);
        }
        *state = SessionState::default();
    }

    /// Get the timeline for `track`, loading it first if the track changed.
    ///
    /// A load overtaken by a newer tick is dropped without touching the state.
    async fn timeline_for(&self, track: &TrackInfo, generation: u64) -> Option<Arc<Timeline>> {
        let identity = track.identity();
        {
            let state = self.state.read().await;
            if state.identity.as_ref() == Some(&identity) {
                return state.timeline.clone();
            }
        }

        info!(
            "Track changed: {} - {} [{}]",
            track.artist, track.name, track.album
        );
        let _ = self.event_tx.send(SyncEvent::TrackChanged {
            track: track.clone(),
        });

        let timeline = self.load_timeline(track).await.map(Arc::new);

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale lyrics load for {}", track.name);
            return None;
        }
        *state = SessionState {
            identity: Some(identity),
            timeline: timeline.clone(),
            last_lines: None,
        };
        drop(state);

        let _ = self.event_tx.send(match &timeline {
            Some(timeline) => SyncEvent::LyricsLoaded {
                track: track.clone(),
                line_count: timeline.len(),
            },
            None => SyncEvent::LyricsNotFound {
                track: track.clone(),
            },
        });
        timeline
    }

    /// Ask each provider in turn until one returns usable synced lyrics
    async fn load_timeline(&self, track: &TrackInfo) -> Option<Timeline> {
        let provider_names: Vec<_> = self.providers.iter().map(|p| p.name()).collect();
        info!(
            "Fetching lyrics for: {} - {} (providers: {:?})",
            track.artist, track.name, provider_names
        );

        let query = LyricsQuery::for_track(track);

        for provider in &self.providers {
            match provider.fetch(&query).await {
                Ok(fetched) => match fetched.result {
                    LyricsResult::Found(raw) => match raw.timeline() {
                        Some(timeline) if !timeline.is_empty() => {
                            info!(
                                "Found synced lyrics from {} ({} lines, provider_id: {})",
                                provider.name(),
                                timeline.len(),
                                fetched.provider_id
                            );
                            return Some(timeline);
                        }
                        _ => {
                            info!(
                                "Provider {} returned no usable synced lyrics",
                                provider.name()
                            );
                        }
                    },
                    LyricsResult::NotFound => {
                        info!("Provider {} returned no lyrics", provider.name());
                    }
                },
                Err(e) => {
                    warn!("Provider {} failed with error: {}", provider.name(), e);
                }
            }
        }

        info!(
            "No synced lyrics found for {} - {} (tried {} providers)",
            track.artist,
            track.name,
            self.providers.len()
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLyricsProvider, FakeTranslator};
    use std::time::Duration;
    use tokio::sync::broadcast::error::TryRecvError;

    const THREE_LINES: &str = "[00:01.00]line1\n[00:02.00]line2\n[00:03.00]line3";

    fn track(id: &str) -> TrackInfo {
        TrackInfo::new("test", "Song", "Artist", "Album", 180_000).with_id(id)
    }

    fn snapshot(id: &str, position_ms: u64) -> Option<PlaybackSnapshot> {
        Some(PlaybackSnapshot::new(track(id), position_ms, true))
    }

    fn session_with(
        providers: Vec<Box<dyn LyricsProvider>>,
        translator: &Arc<FakeTranslator>,
    ) -> Arc<LyricsSession> {
        let cache = Arc::new(TranslationCache::new(translator.clone()));
        LyricsSession::new(providers, cache, "Turkish")
    }

    fn three_line_session(translator: &Arc<FakeTranslator>) -> Arc<LyricsSession> {
        session_with(
            vec![Box::new(FakeLyricsProvider::synced(THREE_LINES))],
            translator,
        )
    }

    fn drain(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return events,
                Err(TryRecvError::Lagged(_)) => {}
            }
        }
    }

    fn current_text(frame: Option<&LyricFrame>) -> Option<String> {
        frame.and_then(|f| f.current.as_ref()).map(|l| l.text.clone())
    }

    #[tokio::test]
    async fn test_poll_sequence_end_to_end() {
        let translator = Arc::new(FakeTranslator::default());
        let session = three_line_session(&translator);

        let mut currents = Vec::new();
        for position in [0, 1200, 1800, 2600] {
            let frame = session.tick(snapshot("a", position)).await;
            assert!(frame.is_some());
            currents.push(current_text(frame.as_ref()));
        }

        assert_eq!(
            currents,
            vec![
                None,
                Some("line1".to_string()),
                Some("line1".to_string()),
                Some("line2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_frame_carries_translations() {
        let translator = Arc::new(FakeTranslator::default());
        let session = three_line_session(&translator);

        let frame = session.tick(snapshot("a", 1200)).await.unwrap();
        let current = frame.current.unwrap();
        let next = frame.next.unwrap();

        assert_eq!(frame.language, "Turkish");
        assert_eq!((current.offset_ms, current.translation.as_str()), (1000, "tr:line1"));
        assert_eq!((next.offset_ms, next.translation.as_str()), (2000, "tr:line2"));
        assert_eq!(translator.calls(), 2);

        // Same lines on the next tick come from the cache
        session.tick(snapshot("a", 1500)).await;
        assert_eq!(translator.calls(), 2);
    }

    #[tokio::test]
    async fn test_translation_failure_shows_original() {
        let translator = Arc::new(FakeTranslator::failing());
        let session = three_line_session(&translator);

        let frame = session.tick(snapshot("a", 2500)).await.unwrap();
        let current = frame.current.unwrap();
        assert_eq!(current.translation, current.text);
    }

    #[tokio::test]
    async fn test_recovered_translation_is_republished() {
        let translator = Arc::new(FakeTranslator::failing());
        let session = three_line_session(&translator);
        let mut rx = session.subscribe();

        session.tick(snapshot("a", 1200)).await;
        translator.set_failing(false);
        session.tick(snapshot("a", 1300)).await;
        // Nothing new to show on a third tick
        session.tick(snapshot("a", 1400)).await;

        let published: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::LineChanged { frame } => frame.current.map(|l| l.translation),
                _ => None,
            })
            .collect();
        assert_eq!(published, vec!["line1".to_string(), "tr:line1".to_string()]);
    }

    #[tokio::test]
    async fn test_lyrics_fetched_once_per_track() {
        let translator = Arc::new(FakeTranslator::default());
        let provider = Arc::new(FakeLyricsProvider::synced(THREE_LINES));
        let session = session_with(vec![Box::new(provider.clone())], &translator);

        for position in [0, 500, 1000, 1500] {
            session.tick(snapshot("a", position)).await;
        }
        assert_eq!(provider.calls(), 1);

        session.tick(snapshot("b", 0)).await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_providers_tried_in_order() {
        let translator = Arc::new(FakeTranslator::default());
        let failing = Arc::new(FakeLyricsProvider::failing());
        let plain = Arc::new(FakeLyricsProvider::plain("just words"));
        let synced = Arc::new(FakeLyricsProvider::synced(THREE_LINES));
        let session = session_with(
            vec![
                Box::new(failing.clone()),
                Box::new(plain.clone()),
                Box::new(synced.clone()),
            ],
            &translator,
        );

        let frame = session.tick(snapshot("a", 1000)).await;
        assert_eq!(current_text(frame.as_ref()), Some("line1".to_string()));
        assert_eq!((failing.calls(), plain.calls(), synced.calls()), (1, 1, 1));
        assert_eq!(session.timeline().await.map(|t| t.len()), Some(3));
    }

    #[tokio::test]
    async fn test_missing_lyrics_remembered_for_track() {
        let translator = Arc::new(FakeTranslator::default());
        let provider = Arc::new(FakeLyricsProvider::not_found());
        let session = session_with(vec![Box::new(provider.clone())], &translator);
        let mut rx = session.subscribe();

        assert!(session.tick(snapshot("a", 0)).await.is_none());
        assert!(session.tick(snapshot("a", 500)).await.is_none());

        assert_eq!(provider.calls(), 1);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SyncEvent::TrackChanged { .. }));
        assert!(matches!(events[1], SyncEvent::LyricsNotFound { .. }));
    }

    #[tokio::test]
    async fn test_line_changed_only_on_change() {
        let translator = Arc::new(FakeTranslator::default());
        let session = three_line_session(&translator);
        let mut rx = session.subscribe();

        for position in [1200, 1500, 1800, 2100, 2400] {
            session.tick(snapshot("a", position)).await;
        }

        let changes: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                SyncEvent::LineChanged { frame } => Some(frame.position_ms),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![1200, 2100]);
    }

    #[tokio::test]
    async fn test_stop_clears_track() {
        let translator = Arc::new(FakeTranslator::default());
        let provider = Arc::new(FakeLyricsProvider::synced(THREE_LINES));
        let session = session_with(vec![Box::new(provider.clone())], &translator);
        let mut rx = session.subscribe();

        session.tick(snapshot("a", 1000)).await;
        assert!(session.tick(None).await.is_none());
        assert!(session.tick(None).await.is_none());
        assert!(session.timeline().await.is_none());

        let stops = drain(&mut rx)
            .into_iter()
            .filter(|event| matches!(event, SyncEvent::PlaybackStopped))
            .count();
        assert_eq!(stops, 1);

        // Resuming the same track reloads its lyrics
        session.tick(snapshot("a", 1000)).await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_set_language_republishes() {
        let translator = Arc::new(FakeTranslator::default());
        let session = three_line_session(&translator);
        let mut rx = session.subscribe();

        session.tick(snapshot("a", 1200)).await;
        session.set_language("Spanish").await;
        let frame = session.tick(snapshot("a", 1300)).await.unwrap();

        assert_eq!(frame.current.map(|l| l.translation), Some("es:line1".to_string()));
        let changes = drain(&mut rx)
            .into_iter()
            .filter(|event| matches!(event, SyncEvent::LineChanged { .. }))
            .count();
        assert_eq!(changes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_tick_is_discarded() {
        let translator = Arc::new(FakeTranslator::with_delay(Duration::from_millis(100)));
        let session = three_line_session(&translator);

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.tick(snapshot("a", 1200)).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        let second = session.tick(snapshot("a", 2200)).await;

        assert_eq!(current_text(second.as_ref()), Some("line2".to_string()));
        assert!(first.await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_lyrics_load_does_not_outlive_stop() {
        let translator = Arc::new(FakeTranslator::default());
        let provider = Arc::new(
            FakeLyricsProvider::synced(THREE_LINES).with_delay(Duration::from_millis(100)),
        );
        let session = session_with(vec![Box::new(provider.clone())], &translator);
        let mut rx = session.subscribe();

        let loading = tokio::spawn({
            let session = session.clone();
            async move { session.tick(snapshot("a", 1200)).await }
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(session.tick(None).await.is_none());
        assert!(loading.await.unwrap().is_none());
        assert!(session.timeline().await.is_none());

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .all(|event| matches!(event, SyncEvent::TrackChanged { .. })));

        // The next snapshot for the same track loads again
        session.tick(snapshot("a", 1200)).await;
        assert_eq!(provider.calls(), 2);
    }
}
