//! Client-credentials access token provider
//!
//! The token is fetched lazily, cached, and refreshed once it is older than
//! its lifetime (capped at one hour). It is owned by the client instead of
//! living in process-global state.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::models::TokenResponse;
use super::SpotifyError;

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
/// Upper bound on how long a token is reused
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Application credentials
#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    acquired_at: Instant,
    lifetime: Duration,
}

impl CachedToken {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.acquired_at) >= self.lifetime
    }
}

pub struct TokenProvider {
    http_client: reqwest::Client,
    credentials: SpotifyCredentials,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http_client: reqwest::Client, credentials: SpotifyCredentials) -> Self {
        Self {
            http_client,
            credentials,
            token_url: TOKEN_URL.to_string(),
            cached: Mutex::new(None),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Current bearer token, fetching a new one when absent or expired
    pub async fn bearer(&self) -> Result<String, SpotifyError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired(Instant::now()) {
                return Ok(token.value.clone());
            }
            tracing::debug!("Access token expired, refreshing");
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next call fetches a fresh one
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch(&self) -> Result<CachedToken, SpotifyError> {
        tracing::debug!(url = %self.token_url, "Requesting access token");

        let response = self
            .http_client
            .post(&self.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SpotifyError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpotifyError::AuthFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SpotifyError::ParseError(e.to_string()))?;

        let lifetime = body
            .expires_in
            .map(|secs| Duration::from_secs(secs).min(TOKEN_LIFETIME))
            .unwrap_or(TOKEN_LIFETIME);

        tracing::info!(lifetime_secs = lifetime.as_secs(), "Obtained access token");

        Ok(CachedToken {
            value: body.access_token,
            acquired_at: Instant::now(),
            lifetime,
        })
    }

    #[cfg(test)]
    async fn seed(&self, value: &str, acquired_at: Instant) {
        *self.cached.lock().await = Some(CachedToken {
            value: value.to_string(),
            acquired_at,
            lifetime: TOKEN_LIFETIME,
        });
    }
}
