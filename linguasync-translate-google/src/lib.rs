//! [`Translator`] backed by the public Google Translate web endpoint.

use async_trait::async_trait;
use linguasync_core::{CoreError, Translator};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const LOG_TARGET: &str = "linguasync::translate::google";

const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 2;

pub struct GoogleTranslator {
    client: ClientWithMiddleware,
    base_url: String,
}

impl GoogleTranslator {
    /// Create a translator with a 10-second timeout and 2 retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, CoreError> {
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("Linguasync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(DEFAULT_MAX_RETRIES);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: GOOGLE_TRANSLATE_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, text: &str, language_code: &str) -> String {
        format!(
            "{}?client=gtx&sl=auto&tl={}&dt=t&q={}",
            self.base_url,
            urlencoding::encode(language_code),
            urlencoding::encode(text)
        )
    }

    fn failure(&self, reason: impl Into<String>) -> CoreError {
        CoreError::TranslationFailed {
            provider: self.name().to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(&self, text: &str, language_code: &str) -> Result<String, CoreError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let url = self.request_url(text, language_code);
        debug!(target: LOG_TARGET, "Translating {:?} into {}", text, language_code);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(target: LOG_TARGET, "Rate limited by Google Translate");
            return Err(CoreError::TranslationRateLimited {
                provider: self.name().to_string(),
            });
        }
        if !status.is_success() {
            return Err(self.failure(format!("Google Translate returned status: {status}")));
        }

        let body: Value = response.json().await?;
        parse_translation(&body).ok_or_else(|| self.failure("unexpected response shape"))
    }
}

/// Join the translated segments of a `translate_a/single` response.
///
/// The body looks like `[[["Merhaba ","Hello ",...],["dünya","world",...]],null,"en",...]`.
fn parse_translation(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let translation: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translation.is_empty() {
        None
    } else {
        Some(translation)
    }
}
