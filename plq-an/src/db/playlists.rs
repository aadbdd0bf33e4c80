//! Playlists and their snapshot versions
//!
//! A playlist row tracks the latest snapshot seen; every distinct snapshot gets
//! its own version row, and analyses hang off versions.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

/// Playlist record
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub playlist_id: Uuid,
    pub spotify_playlist_id: String,
    pub current_snapshot_id: String,
}

impl Playlist {
    pub fn new(spotify_playlist_id: String, snapshot_id: String) -> Self {
        Self {
            playlist_id: Uuid::new_v4(),
            spotify_playlist_id,
            current_snapshot_id: snapshot_id,
        }
    }
}

/// Playlist metadata at one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistVersion {
    pub version_id: Uuid,
    pub playlist_id: Uuid,
    pub snapshot_id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_name: Option<String>,
    pub owner_spotify_id: String,
    pub followers: i64,
    pub tracks_count: i64,
    pub image_url: Option<String>,
}

/// Save a new playlist
pub async fn save_playlist(pool: &SqlitePool, playlist: &Playlist) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO playlists (
            playlist_id, spotify_playlist_id, current_snapshot_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(playlist.playlist_id.to_string())
    .bind(&playlist.spotify_playlist_id)
    .bind(&playlist.current_snapshot_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load playlist by catalog id
pub async fn load_playlist_by_spotify_id(
    pool: &SqlitePool,
    spotify_playlist_id: &str,
) -> Result<Option<Playlist>> {
    let row = sqlx::query(
        r#"
        SELECT playlist_id, spotify_playlist_id, current_snapshot_id
        FROM playlists
        WHERE spotify_playlist_id = ?
        "#,
    )
    .bind(spotify_playlist_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let playlist_id: String = row.get("playlist_id");

            Ok(Some(Playlist {
                playlist_id: Uuid::parse_str(&playlist_id)?,
                spotify_playlist_id: row.get("spotify_playlist_id"),
                current_snapshot_id: row.get("current_snapshot_id"),
            }))
        }
        None => Ok(None),
    }
}

/// Record the latest snapshot seen for a playlist
pub async fn update_current_snapshot(
    pool: &SqlitePool,
    playlist_id: Uuid,
    snapshot_id: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE playlists
        SET current_snapshot_id = ?, updated_at = ?
        WHERE playlist_id = ?
        "#,
    )
    .bind(snapshot_id)
    .bind(Utc::now().to_rfc3339())
    .bind(playlist_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Save a playlist version
pub async fn save_version(pool: &SqlitePool, version: &PlaylistVersion) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO playlist_versions (
            version_id, playlist_id, snapshot_id, name, description, owner_name,
            owner_spotify_id, followers, tracks_count, image_url, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(version.version_id.to_string())
    .bind(version.playlist_id.to_string())
    .bind(&version.snapshot_id)
    .bind(&version.name)
    .bind(&version.description)
    .bind(&version.owner_name)
    .bind(&version.owner_spotify_id)
    .bind(version.followers)
    .bind(version.tracks_count)
    .bind(&version.image_url)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

const VERSION_COLUMNS: &str = "version_id, playlist_id, snapshot_id, name, description, \
     owner_name, owner_spotify_id, followers, tracks_count, image_url";

/// Load version by snapshot id
pub async fn load_version_by_snapshot(
    pool: &SqlitePool,
    snapshot_id: &str,
) -> Result<Option<PlaylistVersion>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM playlist_versions WHERE snapshot_id = ?",
        VERSION_COLUMNS
    ))
    .bind(snapshot_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(version_from_row).transpose()
}

/// Load version by id
pub async fn load_version(pool: &SqlitePool, version_id: Uuid) -> Result<Option<PlaylistVersion>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM playlist_versions WHERE version_id = ?",
        VERSION_COLUMNS
    ))
    .bind(version_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(version_from_row).transpose()
}

fn version_from_row(row: &SqliteRow) -> Result<PlaylistVersion> {
    let version_id: String = row.get("version_id");
    let playlist_id: String = row.get("playlist_id");

    Ok(PlaylistVersion {
        version_id: Uuid::parse_str(&version_id)?,
        playlist_id: Uuid::parse_str(&playlist_id)?,
        snapshot_id: row.get("snapshot_id"),
        name: row.get("name"),
        description: row.get("description"),
        owner_name: row.get("owner_name"),
        owner_spotify_id: row.get("owner_spotify_id"),
        followers: row.get("followers"),
        tracks_count: row.get("tracks_count"),
        image_url: row.get("image_url"),
    })
}

/// Link a track to a version at its playlist position
pub async fn link_track_to_version<'e, E: SqliteExecutor<'e>>(
    executor: E,
    version_id: Uuid,
    track_id: &str,
    position: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO playlist_version_tracks (version_id, track_id, position)
        VALUES (?, ?, ?)
        ON CONFLICT(version_id, track_id) DO UPDATE SET
            position = excluded.position
        "#,
    )
    .bind(version_id.to_string())
    .bind(track_id)
    .bind(position)
    .execute(executor)
    .await?;

    Ok(())
}

/// Track ids of a version in playlist order
pub async fn load_version_track_ids(pool: &SqlitePool, version_id: Uuid) -> Result<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT track_id FROM playlist_version_tracks
        WHERE version_id = ?
        ORDER BY position
        "#,
    )
    .bind(version_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
