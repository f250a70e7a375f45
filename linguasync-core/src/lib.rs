pub mod config;
pub mod error;
pub mod lrc;
pub mod matcher;
pub mod paths;
pub mod playback;
pub mod poller;
pub mod provider;
pub mod session;
pub mod source;
pub mod time;
pub mod translation;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{
    build_config_template, LinguasyncConfig, LoggingConfig, LyricsConfig, LyricsProviderType,
    ProvidersConfig, SyncConfig, TranslationConfig, TranslationProviderType,
    BASE_CONFIG_TEMPLATE,
};

pub use error::{CoreError, Result};
pub use lrc::{TimedLine, Timeline};
pub use matcher::MatchResult;
pub use paths::{
    config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME,
};
pub use playback::{PlaybackSnapshot, TrackIdentity, TrackInfo};
pub use poller::SyncPoller;
pub use provider::{FetchedLyrics, LyricsProvider, LyricsQuery, LyricsResult, RawLyrics};
pub use session::{LyricFrame, LyricsSession, SyncEvent, TranslatedLine};
pub use source::PlaybackSource;
pub use time::{millis_to_rounded_secs, DurationExt};
pub use translation::{
    language_code, Language, TranslationCache, Translator, DEFAULT_LANGUAGE_CODE,
    DEFAULT_TRANSLATION_TTL, SUPPORTED_LANGUAGES,
};
