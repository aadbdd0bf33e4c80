//! Spotify catalog access

pub mod client;
pub mod ids;
pub mod models;
pub mod token;

use async_trait::async_trait;
use thiserror::Error;

pub use client::SpotifyClient;
pub use ids::{is_valid_spotify_id, parse_release_date};
pub use models::{SpotifyArtist, SpotifyAudioFeatures, SpotifyPlaylist, SpotifyTrack};
pub use token::{SpotifyCredentials, TokenProvider};

/// Spotify client errors
#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Server error {0}: {1}")]
    ServerError(u16, String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Catalog operations the analyzer needs
///
/// `playlist_tracks` returns every page with null and local tracks removed.
/// `artists` and `audio_features` batch internally and skip null entries.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn playlist(&self, playlist_id: &str) -> Result<SpotifyPlaylist, SpotifyError>;

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyTrack>, SpotifyError>;

    async fn artists(&self, artist_ids: &[String]) -> Result<Vec<SpotifyArtist>, SpotifyError>;

    async fn audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<SpotifyAudioFeatures>, SpotifyError>;
}
