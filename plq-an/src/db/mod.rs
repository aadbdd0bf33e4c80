//! Database access for plq-an
//!
//! Cached catalog data (tracks, artists, audio features), playlist snapshots,
//! and analysis results live in a single SQLite file in the root folder.

pub mod analyses;
pub mod artists;
pub mod playlists;
pub mod tracks;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the file (and parent directory) when missing, then the tables.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            playlist_id TEXT PRIMARY KEY,
            spotify_playlist_id TEXT NOT NULL UNIQUE,
            current_snapshot_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_versions (
            version_id TEXT PRIMARY KEY,
            playlist_id TEXT NOT NULL REFERENCES playlists(playlist_id) ON DELETE CASCADE,
            snapshot_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT,
            owner_name TEXT,
            owner_spotify_id TEXT NOT NULL,
            followers INTEGER NOT NULL DEFAULT 0,
            tracks_count INTEGER NOT NULL DEFAULT 0,
            image_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            track_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            release_date TEXT NOT NULL,
            explicit INTEGER NOT NULL DEFAULT 0,
            popularity INTEGER NOT NULL CHECK (popularity BETWEEN 0 AND 100),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track_features (
            track_id TEXT PRIMARY KEY REFERENCES tracks(track_id) ON DELETE CASCADE,
            danceability REAL,
            energy REAL,
            track_key INTEGER,
            loudness REAL,
            mode INTEGER,
            speechiness REAL,
            acousticness REAL,
            instrumentalness REAL,
            liveness REAL,
            valence REAL,
            tempo REAL,
            duration_ms INTEGER,
            time_signature INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            artist_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            followers INTEGER NOT NULL DEFAULT 0,
            popularity INTEGER NOT NULL CHECK (popularity BETWEEN 0 AND 100),
            genres TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artist_tracks (
            artist_id TEXT NOT NULL REFERENCES artists(artist_id) ON DELETE CASCADE,
            track_id TEXT NOT NULL REFERENCES tracks(track_id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            PRIMARY KEY (artist_id, track_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_version_tracks (
            version_id TEXT NOT NULL REFERENCES playlist_versions(version_id) ON DELETE CASCADE,
            track_id TEXT NOT NULL REFERENCES tracks(track_id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            PRIMARY KEY (version_id, track_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            analysis_id TEXT PRIMARY KEY,
            version_id TEXT NOT NULL UNIQUE REFERENCES playlist_versions(version_id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            task_id TEXT NOT NULL,
            uniqueness REAL,
            error TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (playlists, playlist_versions, tracks, track_features, \
         artists, artist_tracks, playlist_version_tracks, analyses)"
    );

    Ok(())
}

/// Timestamps are stored as RFC 3339 text
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    // One connection: every in-memory connection is its own database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_tables(&pool).await.expect("Table initialization failed");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let pool = memory_pool().await;
        init_tables(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_init_database_pool_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("plq.db");

        let pool = init_database_pool(&path).await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }

    #[test]
    fn test_parse_timestamp_roundtrip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&now.to_rfc3339()).unwrap();
        assert_eq!(parsed, now);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
