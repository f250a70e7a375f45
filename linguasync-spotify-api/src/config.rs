//! Spotify provider configuration.

use const_format::concatcp;
use linguasync_core::{CoreError, ProvidersConfig};
use serde::{Deserialize, Serialize};

/// Provider name used in config file
pub const PROVIDER_NAME: &str = "spotify";

/// Spotify-specific configuration.
///
/// Tokens come from an authorization-code exchange done elsewhere; this crate
/// only uses and refreshes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyProviderConfig {
    /// Spotify OAuth client ID
    pub client_id: String,
    /// Spotify OAuth client secret
    pub client_secret: String,
    /// User access token
    pub access_token: String,
    /// Refresh token, used to renew `access_token`
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token expiry as a Unix timestamp, if known
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl SpotifyProviderConfig {
    /// Extract Spotify config from the dynamic providers config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be parsed.
    pub fn from_providers(providers: &ProvidersConfig) -> Result<Option<Self>, CoreError> {
        providers.get(PROVIDER_NAME)
    }

    /// Validate that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("access_token", &self.access_token),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigMissingField {
                    field: format!("providers.{PROVIDER_NAME}.{field}"),
                });
            }
        }
        Ok(())
    }

    /// Expiry as a timestamp, ignoring values chrono cannot represent
    #[must_use]
    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.expires_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
    }
}

/// Config template for Spotify provider.
/// This is appended to the base config template when creating a new config file.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    "[providers.",
    PROVIDER_NAME,
    r#"]
# Get client credentials from https://developer.spotify.com/dashboard
client_id = ""
client_secret = ""
# Tokens from an authorization-code flow with the
# user-read-currently-playing and user-read-playback-state scopes
access_token = ""
refresh_token = ""
# Optional: access token expiry as a Unix timestamp
# expires_at = 0

"#
);
