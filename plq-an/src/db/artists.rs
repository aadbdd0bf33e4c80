//! Cached catalog artists

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};

use super::parse_timestamp;

/// Artist record as cached from the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CachedArtist {
    pub artist_id: String,
    pub name: String,
    pub followers: i64,
    pub popularity: u8,
    pub genres: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl CachedArtist {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Insert or refresh an artist
pub async fn save_artist<'e, E: SqliteExecutor<'e>>(
    executor: E,
    artist: &CachedArtist,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO artists (
            artist_id, name, followers, popularity, genres, created_at, updated_at, expires_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(artist_id) DO UPDATE SET
            name = excluded.name,
            followers = excluded.followers,
            popularity = excluded.popularity,
            genres = excluded.genres,
            updated_at = excluded.updated_at,
            expires_at = excluded.expires_at
        "#,
    )
    .bind(&artist.artist_id)
    .bind(&artist.name)
    .bind(artist.followers)
    .bind(i64::from(artist.popularity))
    .bind(serde_json::to_string(&artist.genres)?)
    .bind(&now)
    .bind(&now)
    .bind(artist.expires_at.to_rfc3339())
    .execute(executor)
    .await?;

    Ok(())
}

/// Load artist by catalog id
pub async fn load_artist<'e, E: SqliteExecutor<'e>>(
    executor: E,
    artist_id: &str,
) -> Result<Option<CachedArtist>> {
    let row = sqlx::query(
        r#"
        SELECT artist_id, name, followers, popularity, genres, expires_at
        FROM artists
        WHERE artist_id = ?
        "#,
    )
    .bind(artist_id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(artist_from_row).transpose()
}

/// Link an artist to a track; `position` keeps the credit order
pub async fn link_artist_to_track<'e, E: SqliteExecutor<'e>>(
    executor: E,
    artist_id: &str,
    track_id: &str,
    position: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO artist_tracks (artist_id, track_id, position)
        VALUES (?, ?, ?)
        ON CONFLICT(artist_id, track_id) DO UPDATE SET
            position = excluded.position
        "#,
    )
    .bind(artist_id)
    .bind(track_id)
    .bind(position)
    .execute(executor)
    .await?;

    Ok(())
}

/// Remove every artist credit of a track
pub async fn unlink_track_artists<'e, E: SqliteExecutor<'e>>(
    executor: E,
    track_id: &str,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM artist_tracks WHERE track_id = ?")
        .bind(track_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Artists credited on a track, in credit order
pub async fn load_track_artists<'e, E: SqliteExecutor<'e>>(
    executor: E,
    track_id: &str,
) -> Result<Vec<CachedArtist>> {
    let rows = sqlx::query(
        r#"
        SELECT a.artist_id, a.name, a.followers, a.popularity, a.genres, a.expires_at
        FROM artist_tracks l
        JOIN artists a ON a.artist_id = l.artist_id
        WHERE l.track_id = ?
        ORDER BY l.position
        "#,
    )
    .bind(track_id)
    .fetch_all(executor)
    .await?;

    rows.iter().map(artist_from_row).collect()
}

fn artist_from_row(row: &SqliteRow) -> Result<CachedArtist> {
    let genres: String = row.get("genres");
    let popularity: i64 = row.get("popularity");
    let expires_at: String = row.get("expires_at");

    Ok(CachedArtist {
        artist_id: row.get("artist_id"),
        name: row.get("name"),
        followers: row.get("followers"),
        popularity: u8::try_from(popularity)?,
        genres: serde_json::from_str(&genres)?,
        expires_at: parse_timestamp(&expires_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use chrono::Duration;

    fn artist(id: &str, genres: &[&str]) -> CachedArtist {
        CachedArtist {
            artist_id: id.to_string(),
            name: format!("Artist {}", id),
            followers: 1000,
            popularity: 55,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            expires_at: Utc::now() + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_artist() {
        let pool = memory_pool().await;
        let saved = artist("a1", &["indie rock", "shoegaze"]);

        save_artist(&pool, &saved).await.expect("Failed to save artist");

        let loaded = load_artist(&pool, "a1")
            .await
            .expect("Failed to load artist")
            .expect("Artist not found");
        assert_eq!(loaded.genres, vec!["indie rock", "shoegaze"]);
        assert_eq!(loaded.popularity, 55);
        assert!(!loaded.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_save_artist_refreshes_existing() {
        let pool = memory_pool().await;
        save_artist(&pool, &artist("a1", &["pop"])).await.unwrap();

        let mut refreshed = artist("a1", &[]);
        refreshed.popularity = 90;
        save_artist(&pool, &refreshed).await.unwrap();

        let loaded = load_artist(&pool, "a1").await.unwrap().unwrap();
        assert_eq!(loaded.popularity, 90);
        assert!(loaded.genres.is_empty());
    }

    #[tokio::test]
    async fn test_missing_artist() {
        let pool = memory_pool().await;
        assert!(load_artist(&pool, "nobody").await.unwrap().is_none());
    }

    #[test]
    fn test_expiry() {
        let mut a = artist("a1", &[]);
        let now = Utc::now();
        a.expires_at = now;
        assert!(a.is_expired(now));
        assert!(!a.is_expired(now - Duration::seconds(1)));
    }
}
