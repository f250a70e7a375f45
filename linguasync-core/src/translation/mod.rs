//! Line translation: provider trait, language table and the TTL cache.

mod cache;
mod language;

pub use cache::{CacheKey, TranslationCache, DEFAULT_TRANSLATION_TTL};
pub use language::{language_code, Language, DEFAULT_LANGUAGE_CODE, SUPPORTED_LANGUAGES};

use crate::error::CoreError;
use async_trait::async_trait;

/// Trait for translation backends
#[async_trait]
pub trait Translator: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Translate `text` into the language identified by `language_code` (e.g. "tr").
    async fn translate(&self, text: &str, language_code: &str) -> Result<String, CoreError>;
}
