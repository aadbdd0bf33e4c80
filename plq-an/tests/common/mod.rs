//! Shared fixtures for plq-an integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use plq_an::services::AnalysisService;
use plq_an::spotify::models::{
    SpotifyAlbum, SpotifyArtistRef, SpotifyFollowers, SpotifyOwner, SpotifyTotal,
};
use plq_an::spotify::{
    CatalogApi, SpotifyArtist, SpotifyAudioFeatures, SpotifyError, SpotifyPlaylist, SpotifyTrack,
};
use plq_common::config::AnalysisConfig;
use plq_common::uniqueness::WeightConfig;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub const PLAYLIST_ID: &str = "37i9dQZF1DXcBWIGoYBM5M";

/// Single-connection in-memory database with all tables
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    plq_an::db::init_tables(&pool)
        .await
        .expect("Table initialization failed");
    pool
}

/// Catalog double serving a fixed playlist and counting calls
pub struct FakeCatalog {
    pub snapshot_id: Mutex<String>,
    pub tracks: Mutex<Vec<SpotifyTrack>>,
    pub artists: HashMap<String, SpotifyArtist>,
    pub features: HashMap<String, SpotifyAudioFeatures>,
    pub playlist_calls: AtomicUsize,
    pub track_calls: AtomicUsize,
    pub artist_calls: AtomicUsize,
    pub feature_calls: AtomicUsize,
    pub requested_artist_ids: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new(
        tracks: Vec<SpotifyTrack>,
        artists: Vec<SpotifyArtist>,
        features: Vec<SpotifyAudioFeatures>,
    ) -> Self {
        Self {
            snapshot_id: Mutex::new("snapshot-1".to_string()),
            tracks: Mutex::new(tracks),
            artists: artists.into_iter().map(|a| (a.id.clone(), a)).collect(),
            features: features.into_iter().map(|f| (f.id.clone(), f)).collect(),
            playlist_calls: AtomicUsize::new(0),
            track_calls: AtomicUsize::new(0),
            artist_calls: AtomicUsize::new(0),
            feature_calls: AtomicUsize::new(0),
            requested_artist_ids: Mutex::new(Vec::new()),
        }
    }

    /// The three-track fixture used across tests
    pub fn golden() -> Self {
        Self::new(
            vec![
                track("track1", 50, "2000-05-01", "day", &["artist1"]),
                track("track2", 60, "2010", "year", &["artist2"]),
                track("track3", 70, "2020-09", "month", &["artist1", "artist2"]),
            ],
            vec![artist("artist1", 40, &["pop"]), artist("artist2", 80, &["rock"])],
            vec![
                features("track1", 120.0, 5, -6.0, 1, 210_000, 0.8, 0.6, 0.7),
                features("track2", 95.5, 0, -9.5, 0, 185_000, 0.4, 0.3, 0.5),
                features("track3", 140.0, 11, -4.2, 1, 240_000, 0.9, 0.8, 0.65),
            ],
        )
    }

    pub fn set_snapshot(&self, snapshot_id: &str) {
        *self.snapshot_id.lock().unwrap() = snapshot_id.to_string();
    }

    pub fn set_tracks(&self, tracks: Vec<SpotifyTrack>) {
        *self.tracks.lock().unwrap() = tracks;
    }

    pub fn add_track(&self, track: SpotifyTrack) {
        self.tracks.lock().unwrap().push(track);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn playlist(&self, playlist_id: &str) -> Result<SpotifyPlaylist, SpotifyError> {
        self.playlist_calls.fetch_add(1, Ordering::SeqCst);
        if playlist_id != PLAYLIST_ID {
            return Err(SpotifyError::NotFound(format!("/playlists/{}", playlist_id)));
        }
        Ok(SpotifyPlaylist {
            snapshot_id: self.snapshot_id.lock().unwrap().clone(),
            name: "Golden Mix".to_string(),
            description: Some(String::new()),
            owner: SpotifyOwner {
                id: "owner".to_string(),
                display_name: Some("Owner".to_string()),
            },
            followers: SpotifyFollowers { total: 7 },
            tracks: SpotifyTotal {
                total: self.tracks.lock().unwrap().len() as i64,
            },
            images: None,
        })
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyTrack>, SpotifyError> {
        self.track_calls.fetch_add(1, Ordering::SeqCst);
        if playlist_id != PLAYLIST_ID {
            return Err(SpotifyError::NotFound(format!("/playlists/{}/tracks", playlist_id)));
        }
        Ok(self.tracks.lock().unwrap().clone())
    }

    async fn artists(&self, artist_ids: &[String]) -> Result<Vec<SpotifyArtist>, SpotifyError> {
        self.artist_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_artist_ids
            .lock()
            .unwrap()
            .extend(artist_ids.iter().cloned());
        Ok(artist_ids
            .iter()
            .filter_map(|id| self.artists.get(id).cloned())
            .collect())
    }

    async fn audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<SpotifyAudioFeatures>, SpotifyError> {
        self.feature_calls.fetch_add(1, Ordering::SeqCst);
        Ok(track_ids
            .iter()
            .filter_map(|id| self.features.get(id).cloned())
            .collect())
    }
}

pub fn track(
    id: &str,
    popularity: i64,
    date: &str,
    precision: &str,
    artists: &[&str],
) -> SpotifyTrack {
    SpotifyTrack {
        id: Some(id.to_string()),
        name: format!("Song {}", id),
        uri: format!("spotify:track:{}", id),
        popularity,
        explicit: false,
        album: SpotifyAlbum {
            release_date: Some(date.to_string()),
            release_date_precision: Some(precision.to_string()),
        },
        artists: artists
            .iter()
            .map(|a| SpotifyArtistRef {
                id: Some(a.to_string()),
                name: a.to_string(),
            })
            .collect(),
    }
}

pub fn artist(id: &str, popularity: i64, genres: &[&str]) -> SpotifyArtist {
    SpotifyArtist {
        id: id.to_string(),
        name: format!("Artist {}", id),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        popularity,
        followers: SpotifyFollowers { total: 1000 },
    }
}

#[allow(clippy::too_many_arguments)]
pub fn features(
    id: &str,
    tempo: f64,
    key: i32,
    loudness: f64,
    mode: i32,
    duration_ms: i64,
    energy: f64,
    valence: f64,
    danceability: f64,
) -> SpotifyAudioFeatures {
    SpotifyAudioFeatures {
        id: id.to_string(),
        tempo: Some(tempo),
        key: Some(key),
        loudness: Some(loudness),
        mode: Some(mode),
        duration_ms: Some(duration_ms),
        energy: Some(energy),
        valence: Some(valence),
        danceability: Some(danceability),
        ..Default::default()
    }
}

pub fn service(
    pool: SqlitePool,
    catalog: Arc<FakeCatalog>,
    config: AnalysisConfig,
) -> Arc<AnalysisService> {
    Arc::new(AnalysisService::new(
        pool,
        catalog,
        config,
        WeightConfig::default(),
    ))
}
