//! Configuration resolution for plq-an
//!
//! Spotify credentials resolve with ENV → TOML priority.

use plq_common::config::TomlConfig;
use plq_common::{Error, Result};
use tracing::{info, warn};

use crate::spotify::SpotifyCredentials;

pub const CLIENT_ID_ENV_VAR: &str = "PLQ_SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_ENV_VAR: &str = "PLQ_SPOTIFY_CLIENT_SECRET";

/// Resolve Spotify application credentials
///
/// Each value is taken from its environment variable when set, else from
/// `[spotify]` in the TOML config.
pub fn resolve_spotify_credentials(toml_config: &TomlConfig) -> Result<SpotifyCredentials> {
    let client_id = resolve_value(
        "client id",
        std::env::var(CLIENT_ID_ENV_VAR).ok(),
        toml_config.spotify.client_id.as_deref(),
    );
    let client_secret = resolve_value(
        "client secret",
        std::env::var(CLIENT_SECRET_ENV_VAR).ok(),
        toml_config.spotify.client_secret.as_deref(),
    );

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(SpotifyCredentials {
            client_id,
            client_secret,
        }),
        _ => Err(Error::Config(format!(
            "Spotify credentials not configured. Please configure using one of:\n\
             1. Environment: {}=... and {}=...\n\
             2. TOML config: [spotify] client_id = \"...\" and client_secret = \"...\"\n\
             \n\
             Create an app at: https://developer.spotify.com/dashboard",
            CLIENT_ID_ENV_VAR, CLIENT_SECRET_ENV_VAR
        ))),
    }
}

fn resolve_value(
    name: &str,
    env_value: Option<String>,
    toml_value: Option<&str>,
) -> Option<String> {
    let env_value = env_value.filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "Spotify {} found in both environment and TOML. Using environment (highest priority).",
            name
        );
    }

    if let Some(value) = env_value {
        info!("Spotify {} loaded from environment variable", name);
        return Some(value);
    }

    if let Some(value) = toml_value {
        info!("Spotify {} loaded from TOML config", name);
        return Some(value.to_string());
    }

    None
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    fn test_env_wins_over_toml() {
        assert_eq!(
            resolve_value("client id", Some("env".to_string()), Some("toml")),
            Some("env".to_string())
        );
    }

    #[test]
    fn test_blank_env_falls_back_to_toml() {
        assert_eq!(
            resolve_value("client id", Some("  ".to_string()), Some("toml")),
            Some("toml".to_string())
        );
        assert_eq!(resolve_value("client id", None, None), None);
    }
}
