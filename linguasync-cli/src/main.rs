mod display;

use linguasync_core::{
    CoreError, LinguasyncConfig, LyricsProvider, LyricsProviderType, LyricsSession,
    PlaybackSource, SyncEvent, SyncPoller, TranslationCache, TranslationProviderType, Translator,
};
use linguasync_lyrics_lrclib::LrclibProvider;
use linguasync_spotify_api::{
    SPOTIFY_CONFIG_TEMPLATE, SpotifyAuth, SpotifyPlaybackSource, SpotifyProviderConfig,
};
use linguasync_translate_google::GoogleTranslator;
use std::fs::File;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let provider_templates: &[&str] = &[SPOTIFY_CONFIG_TEMPLATE];
    let config = match LinguasyncConfig::load_or_create(provider_templates) {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            println!(
                "Created a configuration file at {}.\n\
                Fill in providers.spotify (client_id, client_secret, access_token, refresh_token) and run again.",
                path.display()
            );
            std::process::exit(0);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let spotify_config = match spotify_config(&config) {
        Ok(spotify_config) => spotify_config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    if let Err(e) = runtime.block_on(run(&config, &spotify_config, cancel_token)) {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(
    config: &LinguasyncConfig,
    spotify_config: &SpotifyProviderConfig,
    cancel_token: CancellationToken,
) -> Result<(), CoreError> {
    let providers = create_providers(config);
    if providers.is_empty() {
        return Err(CoreError::ConfigInvalid {
            message: "no lyrics provider could be initialized".into(),
        });
    }
    let provider_names: Vec<_> = providers.iter().map(|p| p.name()).collect();
    info!(
        "Initialized {} lyrics provider(s): {:?}",
        providers.len(),
        provider_names
    );

    let translator = create_translator(config.translation.provider)?;
    let translations = Arc::new(TranslationCache::with_ttl(
        translator,
        config.translation.cache_ttl(),
    ));
    info!(
        "Translating into {} (cache TTL: {}h)",
        config.translation.language, config.translation.cache_ttl_hours
    );

    let session = LyricsSession::new(providers, translations, config.translation.language.clone());

    let auth = Arc::new(SpotifyAuth::from_config(spotify_config).await?);
    let source: Arc<dyn PlaybackSource> = Arc::new(SpotifyPlaybackSource::new(auth));

    let poller = Arc::new(SyncPoller::new(
        source,
        session.clone(),
        config.sync.poll_interval(),
        Some(cancel_token.clone()),
    ));

    info!(
        "Starting playback poller (interval: {}ms)",
        config.sync.poll_interval_ms
    );
    let events = tokio::spawn(print_sync_events(session, cancel_token));
    let _ = poller.start().await;
    let _ = events.await;

    Ok(())
}

fn spotify_config(config: &LinguasyncConfig) -> Result<SpotifyProviderConfig, CoreError> {
    let spotify_config = SpotifyProviderConfig::from_providers(&config.providers)?.ok_or_else(
        || CoreError::ConfigMissingField {
            field: "providers.spotify".into(),
        },
    )?;
    spotify_config.validate()?;
    Ok(spotify_config)
}

fn create_providers(config: &LinguasyncConfig) -> Vec<Box<dyn LyricsProvider>> {
    config
        .lyrics
        .providers
        .iter()
        .filter_map(|provider_type| -> Option<Box<dyn LyricsProvider>> {
            match provider_type {
                LyricsProviderType::Lrclib => {
                    info!("Initializing LRCLIB provider");
                    match LrclibProvider::new() {
                        Ok(provider) => Some(Box::new(provider)),
                        Err(e) => {
                            error!("Failed to create LRCLIB provider: {}", e);
                            None
                        }
                    }
                }
            }
        })
        .collect()
}

fn create_translator(
    provider_type: TranslationProviderType,
) -> Result<Arc<dyn Translator>, CoreError> {
    match provider_type {
        TranslationProviderType::Google => {
            info!("Initializing Google Translate provider");
            Ok(Arc::new(GoogleTranslator::new()?))
        }
    }
}

/// Print each line change to stdout and log lifecycle events
async fn print_sync_events(session: Arc<LyricsSession>, cancel_token: CancellationToken) {
    let mut rx = session.subscribe();

    loop {
        let received = tokio::select! {
            () = cancel_token.cancelled() => break,
            received = rx.recv() => received,
        };

        match received {
            Ok(SyncEvent::LineChanged { frame }) => {
                println!("{}\n", display::format_frame(&frame));
            }
            Ok(SyncEvent::TrackChanged { track }) => {
                info!("Now playing: {} - {}", track.artist, track.name);
            }
            Ok(SyncEvent::LyricsLoaded { track, line_count }) => {
                info!("Lyrics loaded for {}: {} lines", track.name, line_count);
            }
            Ok(SyncEvent::LyricsNotFound { track }) => {
                println!("No synced lyrics for {} - {}\n", track.artist, track.name);
            }
            Ok(SyncEvent::PlaybackStopped) => {
                info!("Playback stopped");
            }
            Err(RecvError::Closed) => {
                info!("Sync event channel closed");
                break;
            }
            Err(RecvError::Lagged(n)) => {
                warn!("Missed {} sync events", n);
            }
        }
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = LinguasyncConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rspotify_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = linguasync_core::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
