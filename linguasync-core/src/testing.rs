//! In-memory fakes shared by unit tests.

use crate::error::{CoreError, Result};
use crate::playback::PlaybackSnapshot;
use crate::provider::{FetchedLyrics, LyricsProvider, LyricsQuery, LyricsResult, RawLyrics};
use crate::source::PlaybackSource;
use crate::translation::Translator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Translator that answers `"{code}:{text}"`
#[derive(Default)]
pub struct FakeTranslator {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl FakeTranslator {
    pub fn failing() -> Self {
        let translator = Self::default();
        translator.set_failing(true);
        translator
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn translate(&self, text: &str, language_code: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::TranslationFailed {
                provider: "fake".to_string(),
                reason: "offline".to_string(),
            });
        }
        Ok(format!("{language_code}:{text}"))
    }
}

/// Lyrics provider with a canned answer; `None` means "fail"
pub struct FakeLyricsProvider {
    result: Option<LyricsResult>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeLyricsProvider {
    fn answering(result: Option<LyricsResult>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn synced(lyrics: &str) -> Self {
        Self::answering(Some(LyricsResult::Found(RawLyrics {
            synced: Some(lyrics.to_string()),
            plain: None,
        })))
    }

    pub fn plain(lyrics: &str) -> Self {
        Self::answering(Some(LyricsResult::Found(RawLyrics {
            synced: None,
            plain: Some(lyrics.to_string()),
        })))
    }

    pub fn not_found() -> Self {
        Self::answering(Some(LyricsResult::NotFound))
    }

    pub fn failing() -> Self {
        Self::answering(None)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LyricsProvider for FakeLyricsProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, _query: &LyricsQuery) -> Result<FetchedLyrics> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.result {
            Some(result) => Ok(FetchedLyrics {
                result: result.clone(),
                provider_id: "fake-1".to_string(),
            }),
            None => Err(CoreError::LyricsProviderFailed {
                provider: "fake".to_string(),
                reason: "unreachable".to_string(),
            }),
        }
    }
}

/// Playback source replaying a script of snapshots; `Err` entries fail once.
/// Once the script runs out, the last answer repeats.
pub struct FakeSource {
    script: Mutex<VecDeque<std::result::Result<Option<PlaybackSnapshot>, String>>>,
    last: Mutex<Option<PlaybackSnapshot>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(script: Vec<std::result::Result<Option<PlaybackSnapshot>, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaybackSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn snapshot(&self) -> Result<Option<PlaybackSnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(snapshot)) => {
                self.last.lock().unwrap().clone_from(&snapshot);
                Ok(snapshot)
            }
            Some(Err(reason)) => Err(CoreError::PlaybackSourceFailed {
                source_name: "fake".to_string(),
                reason,
            }),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}
