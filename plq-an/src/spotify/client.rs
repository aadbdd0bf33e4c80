//! Spotify Web API client
//!
//! Every request carries a bearer token from [`TokenProvider`]. HTTP 429 is
//! retried after the configured wait (or the server's Retry-After, whichever
//! is longer) up to [`MAX_ATTEMPTS`] times. A 401 invalidates the token and
//! retries once with a fresh one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::ids::group_ids;
use super::models::{
    ArtistsResponse, AudioFeaturesResponse, PlaylistTracksPage, SpotifyArtist,
    SpotifyAudioFeatures, SpotifyPlaylist, SpotifyTrack,
};
use super::token::{SpotifyCredentials, TokenProvider};
use super::{CatalogApi, SpotifyError};

pub const API_BASE_URL: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("plq-an/", env!("CARGO_PKG_VERSION"));
/// Attempts per request, counting the first
pub const MAX_ATTEMPTS: u32 = 5;
/// Artist ids per /artists request
pub const ARTIST_GROUP_SIZE: usize = 50;
/// Track ids per /audio-features request
pub const AUDIO_FEATURES_GROUP_SIZE: usize = 100;
/// Items per playlist tracks page
pub const PLAYLIST_PAGE_LIMIT: usize = 100;

const PLAYLIST_FIELDS: &str = "snapshot_id,name,description,owner,followers,tracks(total),images";

pub struct SpotifyClient {
    http_client: reqwest::Client,
    tokens: TokenProvider,
    base_url: String,
    rate_limit_wait: Duration,
}

impl SpotifyClient {
    pub fn new(
        credentials: SpotifyCredentials,
        rate_limit_wait: Duration,
    ) -> Result<Self, SpotifyError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        Ok(Self {
            tokens: TokenProvider::new(http_client.clone(), credentials),
            http_client,
            base_url: API_BASE_URL.to_string(),
            rate_limit_wait,
        })
    }

    /// Point the client at another API root (local test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point the token provider at another accounts endpoint (local test servers)
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.tokens = self.tokens.with_token_url(token_url);
        self
    }

    /// Turn an absolute `next` link into a path relative to the API root
    fn relative_path<'a>(&self, url: &'a str) -> &'a str {
        url.strip_prefix(self.base_url.as_str())
            .or_else(|| url.strip_prefix(API_BASE_URL))
            .unwrap_or(url)
    }

    /// GET `{base_url}{path}` and decode the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SpotifyError> {
        if !path.starts_with('/') {
            return Err(SpotifyError::InvalidRequest(format!(
                "Sub-URL must start with '/': {}",
                path
            )));
        }
        let url = format!("{}{}", self.base_url, path);
        let mut refreshed_token = false;
        let mut attempt = 1;

        loop {
            let token = self.tokens.bearer().await?;
            tracing::debug!(url = %url, attempt, "Querying Spotify API");

            let response = self
                .http_client
                .get(&url)
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= MAX_ATTEMPTS {
                    return Err(SpotifyError::RateLimitExceeded);
                }
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or_default();
                let wait = retry_after.max(self.rate_limit_wait);
                tracing::warn!(url = %url, attempt, "Rate limited, waiting {:?}", wait);
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED && !refreshed_token {
                tracing::info!("Access token rejected, refreshing");
                self.tokens.invalidate().await;
                refreshed_token = true;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                return Err(SpotifyError::NotFound(path.to_string()));
            }

            if status.is_server_error() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(SpotifyError::ServerError(status.as_u16(), error_text));
            }

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(SpotifyError::ApiError(status.as_u16(), error_text));
            }

            return response
                .json()
                .await
                .map_err(|e| SpotifyError::ParseError(e.to_string()));
        }
    }
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn playlist(&self, playlist_id: &str) -> Result<SpotifyPlaylist, SpotifyError> {
        let playlist: SpotifyPlaylist = self
            .get_json(&format!(
                "/playlists/{}?fields={}",
                playlist_id, PLAYLIST_FIELDS
            ))
            .await?;

        tracing::info!(
            playlist_id = %playlist_id,
            snapshot_id = %playlist.snapshot_id,
            name = %playlist.name,
            "Retrieved playlist from Spotify"
        );

        Ok(playlist)
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyTrack>, SpotifyError> {
        let mut tracks = Vec::new();
        let mut next = Some(format!(
            "/playlists/{}/tracks?limit={}",
            playlist_id, PLAYLIST_PAGE_LIMIT
        ));
        let mut skipped = 0usize;

        while let Some(path) = next {
            let page: PlaylistTracksPage = self.get_json(&path).await?;

            for item in page.items {
                match item.track {
                    Some(track) if !track.is_local() => tracks.push(track),
                    _ => skipped += 1,
                }
            }

            next = page.next.map(|url| self.relative_path(&url).to_string());
        }

        tracing::info!(
            playlist_id = %playlist_id,
            tracks = tracks.len(),
            skipped,
            "Retrieved playlist tracks from Spotify"
        );

        Ok(tracks)
    }

    async fn artists(&self, artist_ids: &[String]) -> Result<Vec<SpotifyArtist>, SpotifyError> {
        let mut artists = Vec::with_capacity(artist_ids.len());

        for group in group_ids(artist_ids, ARTIST_GROUP_SIZE) {
            let response: ArtistsResponse = self
                .get_json(&format!("/artists?ids={}", group.join(",")))
                .await?;
            artists.extend(response.artists.into_iter().flatten());
        }

        tracing::debug!(
            requested = artist_ids.len(),
            received = artists.len(),
            "Retrieved artists from Spotify"
        );

        Ok(artists)
    }

    async fn audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<SpotifyAudioFeatures>, SpotifyError> {
        let mut features = Vec::with_capacity(track_ids.len());

        for group in group_ids(track_ids, AUDIO_FEATURES_GROUP_SIZE) {
            let response: AudioFeaturesResponse = self
                .get_json(&format!("/audio-features?ids={}", group.join(",")))
                .await?;
            features.extend(response.audio_features.into_iter().flatten());
        }

        tracing::debug!(
            requested = track_ids.len(),
            received = features.len(),
            "Retrieved audio features from Spotify"
        );

        Ok(features)
    }
}
