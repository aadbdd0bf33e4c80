//! Cached catalog tracks and their audio features

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use plq_common::uniqueness::{Artist, Track, TrackFeatures};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};

use super::artists::load_track_artists;
use super::parse_timestamp;
use crate::spotify::SpotifyAudioFeatures;

/// Track record as cached from the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTrack {
    pub track_id: String,
    pub name: String,
    pub release_date: NaiveDate,
    pub explicit: bool,
    pub popularity: u8,
    pub expires_at: DateTime<Utc>,
}

impl CachedTrack {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Insert or refresh a track
pub async fn save_track<'e, E: SqliteExecutor<'e>>(
    executor: E,
    track: &CachedTrack,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO tracks (
            track_id, name, release_date, explicit, popularity, created_at, updated_at, expires_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(track_id) DO UPDATE SET
            name = excluded.name,
            release_date = excluded.release_date,
            explicit = excluded.explicit,
            popularity = excluded.popularity,
            updated_at = excluded.updated_at,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(&track.track_id)
    .bind(&track.name)
    .bind(track.release_date.to_string())
    .bind(track.explicit)
    .bind(i64::from(track.popularity))
    .bind(&now)
    .bind(&now)
    .bind(track.expires_at.to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}

/// Load track by catalog id
pub async fn load_track<'e, E: SqliteExecutor<'e>>(
    executor: E,
    track_id: &str,
) -> Result<Option<CachedTrack>> {
    let row = sqlx::query(
        r#"
        SELECT track_id, name, release_date, explicit, popularity, expires_at
        FROM tracks
        WHERE track_id = ?
        "#,
    )
    .bind(track_id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(track_from_row).transpose()
}

fn track_from_row(row: &SqliteRow) -> Result<CachedTrack> {
    let release_date: String = row.get("release_date");
    let popularity: i64 = row.get("popularity");
    let expires_at: String = row.get("expires_at");

    Ok(CachedTrack {
        track_id: row.get("track_id"),
        name: row.get("name"),
        release_date: release_date.parse()?,
        explicit: row.get("explicit"),
        popularity: u8::try_from(popularity)?,
        expires_at: parse_timestamp(&expires_at)?,
    })
}

/// Store audio features for a track, replacing any earlier row
pub async fn save_features<'e, E: SqliteExecutor<'e>>(
    executor: E,
    features: &SpotifyAudioFeatures,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO track_features (
            track_id, danceability, energy, track_key, loudness, mode, speechiness,
            acousticness, instrumentalness, liveness, valence, tempo, duration_ms,
            time_signature, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(track_id) DO UPDATE SET
            danceability = excluded.danceability,
            energy = excluded.energy,
            track_key = excluded.track_key,
            loudness = excluded.loudness,
            mode = excluded.mode,
            speechiness = excluded.speechiness,
            acousticness = excluded.acousticness,
            instrumentalness = excluded.instrumentalness,
            liveness = excluded.liveness,
            valence = excluded.valence,
            tempo = excluded.tempo,
            duration_ms = excluded.duration_ms,
            time_signature = excluded.time_signature
        "#,
    )
    .bind(&features.id)
    .bind(features.danceability)
    .bind(features.energy)
    .bind(features.key)
    .bind(features.loudness)
    .bind(features.mode)
    .bind(features.speechiness)
    .bind(features.acousticness)
    .bind(features.instrumentalness)
    .bind(features.liveness)
    .bind(features.valence)
    .bind(features.tempo)
    .bind(features.duration_ms)
    .bind(features.time_signature)
    .bind(Utc::now().to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}

/// Load the scoring features of a track; None when no row was stored
pub async fn load_features<'e, E: SqliteExecutor<'e>>(
    executor: E,
    track_id: &str,
) -> Result<Option<TrackFeatures>> {
    let row = sqlx::query(
        r#"
        SELECT tempo, track_key, loudness, mode, duration_ms, energy, valence, danceability
        FROM track_features
        WHERE track_id = ?
        "#,
    )
    .bind(track_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|row| TrackFeatures {
        tempo: row.get("tempo"),
        key: row.get("track_key"),
        loudness: row.get("loudness"),
        mode: row.get("mode"),
        duration_ms: row.get("duration_ms"),
        energy: row.get("energy"),
        valence: row.get("valence"),
        danceability: row.get("danceability"),
    }))
}

/// True when a features row exists, even one with null columns
pub async fn has_features<'e, E: SqliteExecutor<'e>>(executor: E, track_id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM track_features WHERE track_id = ?")
        .bind(track_id)
        .fetch_optional(executor)
        .await?;
    Ok(row.is_some())
}

/// Assemble the scoring view of a cached track: artists in credit order plus features
pub async fn load_scoring_track(pool: &SqlitePool, track_id: &str) -> Result<Option<Track>> {
    let Some(track) = load_track(pool, track_id).await? else {
        return Ok(None);
    };

    let artists = load_track_artists(pool, track_id)
        .await?
        .into_iter()
        .map(|a| Artist {
            id: a.artist_id,
            popularity: a.popularity,
            genres: a.genres,
        })
        .collect();

    let features = load_features(pool, track_id).await?;

    Ok(Some(Track {
        id: track.track_id,
        popularity: track.popularity,
        release_date: track.release_date,
        artists,
        features,
    }))
}
