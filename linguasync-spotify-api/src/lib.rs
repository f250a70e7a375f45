pub mod auth;
pub mod config;
pub mod error;
pub mod source;

pub use auth::SpotifyAuth;
pub use config::{CONFIG_TEMPLATE as SPOTIFY_CONFIG_TEMPLATE, SpotifyProviderConfig};
pub use error::SpotifyError;
pub use source::SpotifyPlaybackSource;
