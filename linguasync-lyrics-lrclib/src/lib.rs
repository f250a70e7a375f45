use async_trait::async_trait;
use linguasync_core::{
    CoreError, FetchedLyrics, LyricsProvider, LyricsQuery, LyricsResult, RawLyrics,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "linguasync::lyrics::lrclib";

const LRCLIB_API_URL: &str = "https://lrclib.net/api";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Duration tolerance for preferring a search result (±2 seconds)
const DURATION_TOLERANCE_SECS: f64 = 2.0;

/// LRCLIB.net lyrics provider
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl LrclibProvider {
    /// Create a new LRCLIB provider with default 10-second timeout and 3 retries.
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
            base_url: LRCLIB_API_URL.to_string(),
        })
    }

    /// Point the provider at another LRCLIB-compatible server
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get_url(&self, query: &LyricsQuery) -> String {
        use std::fmt::Write;

        let mut url = format!(
            "{}/get?artist_name={}&track_name={}",
            self.base_url,
            urlencoding::encode(&query.artist_name),
            urlencoding::encode(&query.track_name)
        );
        if let Some(ref album) = query.album_name {
            let _ = write!(url, "&album_name={}", urlencoding::encode(album));
        }
        if let Some(duration) = query.duration_secs {
            let _ = write!(url, "&duration={duration}");
        }
        url
    }

    fn search_url(&self, query: &LyricsQuery) -> String {
        let search_query = format!("{} {}", query.artist_name, query.track_name);
        format!(
            "{}/search?q={}",
            self.base_url,
            urlencoding::encode(&search_query)
        )
    }

    /// Exact lookup; `Ok(None)` when LRCLIB has no record
    async fn get_exact(&self, query: &LyricsQuery) -> Result<Option<LrclibResponse>, CoreError> {
        let url = self.get_url(query);
        debug!(target: LOG_TARGET, "GET (exact match): {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        debug!(target: LOG_TARGET, "Response status: {}", status);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!(target: LOG_TARGET, "LRCLIB returned status: {}", status);
            return Err(self.failure(format!("LRCLIB returned status: {status}")));
        }

        Ok(Some(response.json().await?))
    }

    async fn search(&self, query: &LyricsQuery) -> Result<Vec<LrclibResponse>, CoreError> {
        let url = self.search_url(query);
        debug!(target: LOG_TARGET, "GET (search): {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.failure(format!("LRCLIB search returned status: {status}")));
        }

        Ok(response.json().await?)
    }

    fn failure(&self, reason: String) -> CoreError {
        CoreError::LyricsProviderFailed {
            provider: self.name().to_string(),
            reason,
        }
    }
}

/// Record returned by the LRCLIB API
/// Note: API returns additional fields (trackName, albumName) that we don't use;
/// serde ignores unknown fields by default.
#[derive(Debug, Clone, Deserialize)]
struct LrclibResponse {
    id: i64,
    #[serde(rename = "artistName", default)]
    artist_name: String,
    duration: Option<f64>,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

impl LrclibResponse {
    fn has_synced(&self) -> bool {
        !self.instrumental
            && self
                .synced_lyrics
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
    }

    fn duration_diff(&self, expected_secs: u32) -> Option<f64> {
        self.duration.map(|d| (d - f64::from(expected_secs)).abs())
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        info!(
            target: LOG_TARGET,
            "Fetching lyrics for: {} - {} (duration: {:?}s)",
            query.artist_name, query.track_name, query.duration_secs
        );

        match self.get_exact(query).await? {
            Some(record) if record.instrumental => {
                debug!(target: LOG_TARGET, "Track is instrumental (lrclib id: {})", record.id);
                return Ok(parse_response(record));
            }
            Some(record) if record.has_synced() => {
                info!(target: LOG_TARGET, "Found exact match with id: {}", record.id);
                return Ok(parse_response(record));
            }
            Some(record) => {
                info!(
                    target: LOG_TARGET,
                    "Exact match {} has no synced lyrics, searching", record.id
                );
            }
            None => {
                info!(target: LOG_TARGET, "Exact match not found, searching");
            }
        }

        let results = self.search(query).await?;
        debug!(target: LOG_TARGET, "Search returned {} results", results.len());

        match pick_search_result(results, query.duration_secs) {
            Some(record) => {
                info!(
                    target: LOG_TARGET,
                    "Using search result (id: {}, artist: {}, duration: {:?})",
                    record.id, record.artist_name, record.duration
                );
                Ok(parse_response(record))
            }
            None => Ok(FetchedLyrics {
                result: LyricsResult::NotFound,
                provider_id: String::new(),
            }),
        }
    }
}

/// Choose among search results: a synced record within the duration
/// tolerance (closest first), else the first synced record, else the first
/// record of any kind.
fn pick_search_result(
    mut results: Vec<LrclibResponse>,
    duration_secs: Option<u32>,
) -> Option<LrclibResponse> {
    if let Some(expected) = duration_secs {
        let closest = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.has_synced())
            .filter_map(|(i, r)| r.duration_diff(expected).map(|diff| (i, diff)))
            .filter(|(_, diff)| *diff <= DURATION_TOLERANCE_SECS)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i);
        if let Some(index) = closest {
            return Some(results.swap_remove(index));
        }
    }

    if let Some(index) = results.iter().position(LrclibResponse::has_synced) {
        return Some(results.swap_remove(index));
    }

    results.into_iter().next()
}

fn parse_response(record: LrclibResponse) -> FetchedLyrics {
    let provider_id = record.id.to_string();

    if record.instrumental {
        return FetchedLyrics {
            result: LyricsResult::NotFound,
            provider_id,
        };
    }

    let non_blank = |text: Option<String>| text.filter(|t| !t.trim().is_empty());
    let raw = RawLyrics {
        synced: non_blank(record.synced_lyrics),
        plain: non_blank(record.plain_lyrics),
    };

    let result = if raw.synced.is_none() && raw.plain.is_none() {
        LyricsResult::NotFound
    } else {
        LyricsResult::Found(raw)
    };

    FetchedLyrics {
        result,
        provider_id,
    }
}
