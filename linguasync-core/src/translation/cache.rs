//! In-memory translation cache with a time-to-live.
//!
//! Keyed by (lowercased trimmed text, target language name). Stale entries are
//! ignored on lookup and overwritten by the next successful translation; they
//! are only removed by an explicit [`TranslationCache::purge_stale`].

use super::{language_code, Translator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default entry lifetime (24 hours)
pub const DEFAULT_TRANSLATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Normalized cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: String,
    language: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(text: &str, language: &str) -> Self {
        Self {
            text: text.trim().to_lowercase(),
            language: language.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    translation: String,
    created_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < ttl
    }
}

/// Memoizing wrapper around a [`Translator`].
///
/// Provider failures never reach the caller: the original text comes back
/// instead and nothing is cached, so the next lookup retries the provider.
pub struct TranslationCache {
    translator: Arc<dyn Translator>,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl TranslationCache {
    /// Create a cache with the default 24 hour TTL
    #[must_use]
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self::with_ttl(translator, DEFAULT_TRANSLATION_TTL)
    }

    #[must_use]
    pub fn with_ttl(translator: Arc<dyn Translator>, ttl: Duration) -> Self {
        Self {
            translator,
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Translate a line into the language with the given display name.
    pub async fn translate(&self, text: &str, language: &str) -> String {
        let key = CacheKey::new(text, language);

        if let Some(cached) = self.get_fresh(&key).await {
            debug!("Translation cache hit for {:?} ({})", key.text, language);
            return cached;
        }

        let code = language_code(language);
        debug!(
            "Translation cache miss for {:?}, asking {} (target: {})",
            key.text,
            self.translator.name(),
            code
        );

        // No lock is held here: concurrent misses on one key may both call the
        // provider and the later write wins.
        match self.translator.translate(text, code).await {
            Ok(translation) => {
                self.entries.write().await.insert(
                    key,
                    CacheEntry {
                        translation: translation.clone(),
                        created_at: Instant::now(),
                    },
                );
                translation
            }
            Err(e) => {
                warn!(
                    "Translation via {} failed, showing original text: {}",
                    self.translator.name(),
                    e
                );
                text.to_string()
            }
        }
    }

    /// Translate lines one after another, keyed by the original line.
    pub async fn translate_batch<S: AsRef<str>>(
        &self,
        lines: &[S],
        language: &str,
    ) -> HashMap<String, String> {
        let mut translations = HashMap::with_capacity(lines.len());
        for line in lines {
            let line = line.as_ref();
            let translation = self.translate(line, language).await;
            translations.insert(line.to_string(), translation);
        }
        translations
    }

    /// Drop every entry older than the TTL, returning how many were removed.
    pub async fn purge_stale(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(self.ttl, now));
        before - entries.len()
    }

    /// Number of stored entries, stale ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn get_fresh(&self, key: &CacheKey) -> Option<String> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        entry
            .is_fresh(self.ttl, Instant::now())
            .then(|| entry.translation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTranslator;

    const MS: Duration = Duration::from_millis(1);

    fn cache_with(translator: &Arc<FakeTranslator>) -> TranslationCache {
        TranslationCache::new(translator.clone())
    }

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(
            CacheKey::new("  Hello World ", "Turkish"),
            CacheKey::new("hello world", "Turkish")
        );
        assert_ne!(CacheKey::new("hello", "Turkish"), CacheKey::new("hello", "tr"));
    }

    #[tokio::test]
    async fn test_second_call_is_cached() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = cache_with(&translator);

        let first = cache.translate("Hello", "Turkish").await;
        let second = cache.translate("Hello", "Turkish").await;

        assert_eq!(first, "tr:Hello");
        assert_eq!(first, second);
        assert_eq!(translator.calls(), 1);
    }

    #[tokio::test]
    async fn test_normalized_text_shares_entry() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = cache_with(&translator);

        let first = cache.translate("Hello", "Turkish").await;
        let second = cache.translate("  HELLO ", "Turkish").await;

        assert_eq!(first, second);
        assert_eq!(translator.calls(), 1);
    }

    #[tokio::test]
    async fn test_languages_are_separate_keys() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = cache_with(&translator);

        assert_eq!(cache.translate("Hello", "Spanish").await, "es:Hello");
        assert_eq!(cache.translate("Hello", "French").await, "fr:Hello");
        assert_eq!(translator.calls(), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_unknown_language_uses_default_code() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = cache_with(&translator);

        assert_eq!(cache.translate("Hello", "Elvish").await, "tr:Hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_just_before_ttl() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = cache_with(&translator);

        cache.translate("hello", "Turkish").await;
        tokio::time::advance(DEFAULT_TRANSLATION_TTL - MS).await;
        cache.translate("hello", "Turkish").await;

        assert_eq!(translator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_stale_exactly_at_ttl() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = cache_with(&translator);

        cache.translate("hello", "Turkish").await;
        tokio::time::advance(DEFAULT_TRANSLATION_TTL).await;
        cache.translate("hello", "Turkish").await;

        assert_eq!(translator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_refetched_after_ttl() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = cache_with(&translator);

        cache.translate("hello", "Turkish").await;
        tokio::time::advance(DEFAULT_TRANSLATION_TTL + MS).await;
        let refreshed = cache.translate("hello", "Turkish").await;

        assert_eq!(refreshed, "tr:hello");
        assert_eq!(translator.calls(), 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hits_do_not_extend_lifetime() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = TranslationCache::with_ttl(translator.clone(), Duration::from_secs(10));

        cache.translate("hello", "Turkish").await;
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.translate("hello", "Turkish").await;
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.translate("hello", "Turkish").await;

        assert_eq!(translator.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_returns_original_text() {
        let translator = Arc::new(FakeTranslator::failing());
        let cache = cache_with(&translator);

        assert_eq!(cache.translate("hello", "Turkish").await, "hello");
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_failure_is_retried_next_time() {
        let translator = Arc::new(FakeTranslator::failing());
        let cache = cache_with(&translator);

        assert_eq!(cache.translate("hello", "Turkish").await, "hello");
        translator.set_failing(false);
        assert_eq!(cache.translate("hello", "Turkish").await, "tr:hello");
        assert_eq!(translator.calls(), 2);
    }

    #[tokio::test]
    async fn test_translate_batch() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = cache_with(&translator);

        let translations = cache.translate_batch(&["one", "two", "one"], "English").await;

        assert_eq!(translations.len(), 2);
        assert_eq!(translations.get("one").map(String::as_str), Some("en:one"));
        assert_eq!(translations.get("two").map(String::as_str), Some("en:two"));
        assert_eq!(translator.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_stale() {
        let translator = Arc::new(FakeTranslator::default());
        let cache = TranslationCache::with_ttl(translator, Duration::from_secs(60));

        cache.translate("old", "Turkish").await;
        tokio::time::advance(Duration::from_secs(45)).await;
        cache.translate("new", "Turkish").await;
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.purge_stale().await, 1);
        assert_eq!(cache.len().await, 1);
    }
}
