//! Spotify Web API response shapes
//!
//! Only the fields the analyzer reads are modelled; everything else is ignored by serde.

use serde::{Deserialize, Serialize};

/// POST /api/token response (client credentials flow)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyFollowers {
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyTotal {
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyImage {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyOwner {
    pub id: String,
    pub display_name: Option<String>,
}

/// GET /playlists/{id}?fields=snapshot_id,name,description,owner,followers,tracks(total),images
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyPlaylist {
    pub snapshot_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: SpotifyOwner,
    pub followers: SpotifyFollowers,
    pub tracks: SpotifyTotal,
    /// May be null or empty for playlists without artwork
    #[serde(default)]
    pub images: Option<Vec<SpotifyImage>>,
}

impl SpotifyPlaylist {
    /// URL of the first (largest) image, if any
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(|images| images.first())
            .map(|image| image.url.as_str())
    }
}

/// GET /playlists/{id}/tracks page
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTracksPage {
    pub items: Vec<PlaylistItem>,
    /// Absolute URL of the next page
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    /// Null for removed or unavailable tracks
    pub track: Option<SpotifyTrack>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyAlbum {
    /// Null for local files
    #[serde(default)]
    pub release_date: Option<String>,
    /// "day", "month" or "year"
    #[serde(default)]
    pub release_date_precision: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyArtistRef {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyTrack {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub popularity: i64,
    #[serde(default)]
    pub explicit: bool,
    pub album: SpotifyAlbum,
    #[serde(default)]
    pub artists: Vec<SpotifyArtistRef>,
}

impl SpotifyTrack {
    /// Local files cannot be looked up in the catalog
    pub fn is_local(&self) -> bool {
        self.id.is_none() || self.uri.starts_with("spotify:local:")
    }
}

/// GET /artists?ids=...
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistsResponse {
    pub artists: Vec<Option<SpotifyArtist>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: i64,
    pub followers: SpotifyFollowers,
}

/// GET /audio-features?ids=...
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesResponse {
    /// Null entries for tracks without analysis
    pub audio_features: Vec<Option<SpotifyAudioFeatures>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpotifyAudioFeatures {
    pub id: String,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub key: Option<i32>,
    pub loudness: Option<f64>,
    pub mode: Option<i32>,
    pub speechiness: Option<f64>,
    pub acousticness: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub valence: Option<f64>,
    pub tempo: Option<f64>,
    pub duration_ms: Option<i64>,
    pub time_signature: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_without_images() {
        let playlist: SpotifyPlaylist = serde_json::from_str(
            r#"{
                "snapshot_id": "snap",
                "name": "Mix",
                "description": "",
                "owner": {"id": "owner1", "display_name": null},
                "followers": {"href": null, "total": 12},
                "tracks": {"total": 3},
                "images": []
            }"#,
        )
        .unwrap();

        assert_eq!(playlist.followers.total, 12);
        assert!(playlist.image_url().is_none());
    }

    #[test]
    fn test_tracks_page_with_null_and_local_tracks() {
        let page: PlaylistTracksPage = serde_json::from_str(
            r#"{
                "items": [
                    {"track": null},
                    {"track": {
                        "id": null, "name": "home demo", "uri": "spotify:local:x:y:demo:120",
                        "popularity": 0, "explicit": false,
                        "album": {"release_date": null, "release_date_precision": null},
                        "artists": [{"id": null, "name": "me"}]
                    }},
                    {"track": {
                        "id": "4uLU6hMCjMI75M1A2tKUQC", "name": "Song", "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
                        "popularity": 64, "explicit": true,
                        "album": {"release_date": "1987", "release_date_precision": "year"},
                        "artists": [{"id": "0gxyHStUsqpMadRV0Di1Qt", "name": "Rick"}]
                    }}
                ],
                "next": null
            }"#,
        )
        .unwrap_or_else(|e| panic!("parse failed: {e}"));

        assert!(page.items[0].track.is_none());
        assert!(page.items[1].track.as_ref().unwrap().is_local());
        let track = page.items[2].track.as_ref().unwrap();
        assert!(!track.is_local());
        assert_eq!(track.album.release_date_precision.as_deref(), Some("year"));
    }

    #[test]
    fn test_audio_features_with_nulls() {
        let response: AudioFeaturesResponse = serde_json::from_str(
            r#"{"audio_features": [null, {"id": "t1", "tempo": 120.5, "key": 7, "mode": 0}]}"#,
        )
        .unwrap();

        assert!(response.audio_features[0].is_none());
        let features = response.audio_features[1].as_ref().unwrap();
        assert_eq!(features.key, Some(7));
        assert!(features.energy.is_none());
    }
}
