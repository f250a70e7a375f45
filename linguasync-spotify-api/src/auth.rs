//! Token handling for the Spotify Web API client.

use crate::config::SpotifyProviderConfig;
use crate::error::{Result, SpotifyError};
use chrono::{DateTime, Utc};
use rspotify::{prelude::*, scopes, AuthCodeSpotify, Credentials, OAuth, Token};
use tracing::{debug, info, warn};

/// Refresh token proactively if it expires within this many seconds
const PROACTIVE_REFRESH_THRESHOLD_SECS: i64 = 60;

/// Spotify client holding a user token supplied through config
pub struct SpotifyAuth {
    client: AuthCodeSpotify,
}

impl SpotifyAuth {
    /// Build the client and install the configured token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token lock cannot be acquired.
    pub async fn from_config(config: &SpotifyProviderConfig) -> Result<Self> {
        let creds = Credentials::new(&config.client_id, &config.client_secret);
        let oauth = OAuth {
            scopes: scopes!("user-read-currently-playing", "user-read-playback-state"),
            ..Default::default()
        };
        let auth = Self {
            client: AuthCodeSpotify::new(creds, oauth),
        };

        let token = Token {
            access_token: config.access_token.clone(),
            refresh_token: config
                .refresh_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
            expires_at: config.expires_at(),
            expires_in: chrono::TimeDelta::zero(),
            scopes: scopes!("user-read-currently-playing", "user-read-playback-state"),
        };
        *auth.lock_token().await? = Some(token);
        info!("Installed configured Spotify token");

        Ok(auth)
    }

    /// Acquire lock on token.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    async fn lock_token(
        &self,
    ) -> Result<futures::lock::MutexGuard<'_, Option<Token>>> {
        self.client
            .token
            .lock()
            .await
            .map_err(|_| SpotifyError::AuthFailed {
                reason: "Failed to acquire token lock".to_string(),
            })
    }

    /// Refresh the access token
    ///
    /// # Errors
    ///
    /// Returns an error if there is no refresh token or Spotify rejects it.
    pub async fn refresh_token(&self) -> Result<()> {
        let has_refresh_token = self
            .lock_token()
            .await?
            .as_ref()
            .is_some_and(|t| t.refresh_token.is_some());
        if !has_refresh_token {
            return Err(SpotifyError::AuthFailed {
                reason: "No refresh token configured".to_string(),
            });
        }

        info!("Refreshing Spotify access token");
        self.client
            .refresh_token()
            .await
            .map_err(|e| SpotifyError::AuthFailed {
                reason: format!("Token refresh failed: {e}"),
            })
    }

    /// Proactively refresh the token if it will expire soon (within 60 seconds).
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh fails.
    pub async fn ensure_token_fresh(&self) -> Result<()> {
        let needs_refresh = {
            let token_guard = self.lock_token().await?;
            needs_refresh(
                token_guard.as_ref().and_then(|t| t.expires_at),
                Utc::now(),
            )
        };

        if needs_refresh {
            self.refresh_token().await?;
        }

        Ok(())
    }

    #[must_use]
    pub const fn client(&self) -> &AuthCodeSpotify {
        &self.client
    }
}

/// Check if a token expiring at `expires_at` should be refreshed at `now`.
/// Tokens without a known expiry are left alone.
fn needs_refresh(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    let Some(expires_at) = expires_at else {
        return false;
    };

    let seconds_until_expiry = (expires_at - now).num_seconds();
    if seconds_until_expiry <= PROACTIVE_REFRESH_THRESHOLD_SECS {
        debug!(
            "Token expires in {}s (threshold: {}s), refreshing proactively",
            seconds_until_expiry, PROACTIVE_REFRESH_THRESHOLD_SECS
        );
        if seconds_until_expiry < 0 {
            warn!("Spotify token already expired {}s ago", -seconds_until_expiry);
        }
        true
    } else {
        false
    }
}
