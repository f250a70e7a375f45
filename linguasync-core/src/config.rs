use crate::error::{CoreError, Result};
use const_format::concatcp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_LANGUAGE: &str = "Turkish";
const DEFAULT_CACHE_TTL_HOURS: u64 = 24;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinguasyncConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-integration tables, parsed by the crate that owns them
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How often the playback source is polled
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Provider priority: providers are tried in order
    #[serde(default = "default_providers")]
    pub providers: Vec<LyricsProviderType>,
}

fn default_providers() -> Vec<LyricsProviderType> {
    vec![LyricsProviderType::Lrclib]
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricsProviderType {
    Lrclib,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationProviderType {
    #[default]
    Google,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Target language display name, e.g. "Turkish"
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub provider: TranslationProviderType,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_hours: u64,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

const fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_HOURS
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            provider: TranslationProviderType::default(),
            cache_ttl_hours: default_cache_ttl(),
        }
    }
}

impl TranslationConfig {
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.saturating_mul(60 * 60))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/linguasync/linguasync.log
    #[serde(default)]
    pub enabled: bool,
}

/// Raw `[providers.*]` tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvidersConfig(HashMap<String, toml::Value>);

impl ProvidersConfig {
    /// Deserialize the table for `name`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.0
            .get(name)
            .map(|value| value.clone().try_into::<T>())
            .transpose()
            .map_err(CoreError::from)
    }
}

impl LinguasyncConfig {
    /// Get the config file path (~/.config/linguasync/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run.
    ///
    /// `provider_templates` are appended to the base template when the file is
    /// created.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` after writing the template on first run, or an
    /// error if the config file cannot be read, parsed, or validated.
    pub fn load_or_create(provider_templates: &[&str]) -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, build_config_template(provider_templates))?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot rule out on its own.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid or missing field.
    pub fn validate(&self) -> Result<()> {
        if self.sync.poll_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "sync.poll_interval_ms must be greater than 0".into(),
            });
        }
        if self.translation.cache_ttl_hours == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "translation.cache_ttl_hours must be greater than 0".into(),
            });
        }
        if self.translation.language.trim().is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "translation.language".into(),
            });
        }
        if self.lyrics.providers.is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "lyrics.providers".into(),
            });
        }
        Ok(())
    }
}

/// Base config template, without any `[providers.*]` tables
pub const BASE_CONFIG_TEMPLATE: &str = concatcp!(
    r#"# Linguasync Configuration
# ~/.config/linguasync/config.toml

[sync]
# How often to ask the player for the current position
poll_interval_ms = "#,
    DEFAULT_POLL_INTERVAL_MS,
    r#"

[lyrics]
# Providers are tried in order; first result with synced lyrics wins
providers = ["lrclib"]

[translation]
# Turkish, English, Spanish, French, German, Italian, Portuguese,
# Russian, Japanese, Korean, Chinese, Arabic, Hindi
language = ""#,
    DEFAULT_LANGUAGE,
    r#""
provider = "google"
cache_ttl_hours = "#,
    DEFAULT_CACHE_TTL_HOURS,
    r#"

[logging]
# Also write logs to ~/.config/linguasync/linguasync.log
enabled = false

"#
);

/// Build the full config template from the base and provider fragments
#[must_use]
pub fn build_config_template(provider_templates: &[&str]) -> String {
    let mut template = String::from(BASE_CONFIG_TEMPLATE);
    for fragment in provider_templates {
        template.push_str(fragment);
    }
    template
}
