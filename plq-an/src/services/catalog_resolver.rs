//! Playlist-to-tracks resolution with a SQLite catalog cache
//!
//! Order of work:
//! 1. Fetch every playlist page (null and local tracks already dropped)
//! 2. Decide what is stale: missing or expired tracks, missing or expired
//!    artists, tracks without a features row
//! 3. Fetch only the stale artists and features
//! 4. Write everything in one transaction
//! 5. Load the scoring view of each track from the cache

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};
use plq_common::config::AnalysisConfig;
use plq_common::uniqueness::Track;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::AnalysisError;
use crate::db::artists::{self, CachedArtist};
use crate::db::playlists;
use crate::db::tracks::{self, CachedTrack};
use crate::spotify::{parse_release_date, CatalogApi, SpotifyArtist, SpotifyTrack};

pub struct CatalogResolver<'a> {
    catalog: &'a dyn CatalogApi,
    pool: &'a SqlitePool,
    config: &'a AnalysisConfig,
}

/// Playlist entry that can be cached
struct ResolvedItem {
    track: CachedTrack,
    artist_ids: Vec<String>,
}

impl<'a> CatalogResolver<'a> {
    pub fn new(
        catalog: &'a dyn CatalogApi,
        pool: &'a SqlitePool,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            catalog,
            pool,
            config,
        }
    }

    /// Resolve a playlist into scoring tracks and link them to `version_id`
    ///
    /// Tracks without complete audio features are left out.
    pub async fn resolve_playlist(
        &self,
        spotify_playlist_id: &str,
        version_id: Uuid,
    ) -> Result<Vec<Track>, AnalysisError> {
        let now = Utc::now();
        let track_expiry = now + Duration::days(self.config.track_expiry_days);
        let artist_expiry = now + Duration::days(self.config.artist_expiry_days);

        let raw_tracks = self.catalog.playlist_tracks(spotify_playlist_id).await?;
        let items = to_items(&raw_tracks, track_expiry);

        let mut stale_tracks = Vec::new();
        let mut missing_features = Vec::new();
        for item in &items {
            let cached = tracks::load_track(self.pool, &item.track.track_id).await?;
            if cached.map_or(true, |t| t.is_expired(now)) {
                stale_tracks.push(&item.track);
            }
            if !tracks::has_features(self.pool, &item.track.track_id).await? {
                missing_features.push(item.track.track_id.clone());
            }
        }

        let artist_ids: BTreeSet<&String> =
            items.iter().flat_map(|item| item.artist_ids.iter()).collect();
        let mut known_artists = HashSet::new();
        let mut stale_artists = Vec::new();
        for artist_id in artist_ids {
            match artists::load_artist(self.pool, artist_id).await? {
                Some(artist) => {
                    known_artists.insert(artist_id.clone());
                    if artist.is_expired(now) {
                        stale_artists.push(artist_id.clone());
                    }
                }
                None => stale_artists.push(artist_id.clone()),
            }
        }

        tracing::debug!(
            playlist_id = %spotify_playlist_id,
            tracks = items.len(),
            stale_tracks = stale_tracks.len(),
            stale_artists = stale_artists.len(),
            missing_features = missing_features.len(),
            "Catalog cache check complete"
        );

        let fetched_artists = if stale_artists.is_empty() {
            Vec::new()
        } else {
            self.catalog.artists(&stale_artists).await?
        };
        let fetched_features = if missing_features.is_empty() {
            Vec::new()
        } else {
            self.catalog.audio_features(&missing_features).await?
        };

        let mut tx = self.pool.begin().await?;

        for artist in &fetched_artists {
            artists::save_artist(&mut *tx, &to_cached_artist(artist, artist_expiry)).await?;
            known_artists.insert(artist.id.clone());
        }
        for track in stale_tracks {
            tracks::save_track(&mut *tx, track).await?;
        }
        for features in &fetched_features {
            tracks::save_features(&mut *tx, features).await?;
        }
        for (position, item) in items.iter().enumerate() {
            // Credits mirror the latest playlist fetch
            artists::unlink_track_artists(&mut *tx, &item.track.track_id).await?;
            for (credit, artist_id) in item.artist_ids.iter().enumerate() {
                if known_artists.contains(artist_id) {
                    artists::link_artist_to_track(
                        &mut *tx,
                        artist_id,
                        &item.track.track_id,
                        credit as i64,
                    )
                    .await?;
                } else {
                    tracing::warn!(
                        artist_id = %artist_id,
                        "Artist unavailable in catalog, not linked"
                    );
                }
            }
            playlists::link_track_to_version(
                &mut *tx,
                version_id,
                &item.track.track_id,
                position as i64,
            )
            .await?;
        }

        tx.commit().await?;

        let mut scoring_tracks = Vec::with_capacity(items.len());
        for item in &items {
            let Some(track) = tracks::load_scoring_track(self.pool, &item.track.track_id).await?
            else {
                continue;
            };
            if track.features.as_ref().map_or(false, |f| f.is_complete()) {
                scoring_tracks.push(track);
            } else {
                tracing::warn!(track_id = %track.id, "Audio features incomplete, track not scored");
            }
        }

        tracing::info!(
            playlist_id = %spotify_playlist_id,
            version_id = %version_id,
            scored = scoring_tracks.len(),
            "Resolved playlist tracks"
        );

        Ok(scoring_tracks)
    }
}

/// Keep the first occurrence of each track with a usable release date
fn to_items(raw_tracks: &[SpotifyTrack], expires_at: DateTime<Utc>) -> Vec<ResolvedItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(raw_tracks.len());

    for raw in raw_tracks {
        let Some(track_id) = raw.id.as_deref() else {
            continue;
        };
        if !seen.insert(track_id) {
            continue;
        }
        match to_cached_track(raw, track_id, expires_at) {
            Some(track) => items.push(ResolvedItem {
                track,
                artist_ids: raw.artists.iter().filter_map(|a| a.id.clone()).collect(),
            }),
            None => tracing::warn!(
                track_id = %track_id,
                release_date = ?raw.album.release_date,
                "Unparseable release date, track skipped"
            ),
        }
    }

    items
}

fn to_cached_track(
    raw: &SpotifyTrack,
    track_id: &str,
    expires_at: DateTime<Utc>,
) -> Option<CachedTrack> {
    let release_date = parse_release_date(
        raw.album.release_date.as_deref()?,
        raw.album.release_date_precision.as_deref(),
    )?;

    Some(CachedTrack {
        track_id: track_id.to_string(),
        name: raw.name.clone(),
        release_date,
        explicit: raw.explicit,
        popularity: clamp_popularity(raw.popularity),
        expires_at,
    })
}

fn to_cached_artist(raw: &SpotifyArtist, expires_at: DateTime<Utc>) -> CachedArtist {
    CachedArtist {
        artist_id: raw.id.clone(),
        name: raw.name.clone(),
        followers: raw.followers.total,
        popularity: clamp_popularity(raw.popularity),
        genres: raw.genres.clone(),
        expires_at,
    }
}

fn clamp_popularity(popularity: i64) -> u8 {
    popularity.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::models::{SpotifyAlbum, SpotifyArtistRef};
    use chrono::NaiveDate;

    fn raw(id: &str, date: Option<&str>, precision: Option<&str>) -> SpotifyTrack {
        SpotifyTrack {
            id: Some(id.to_string()),
            name: id.to_string(),
            uri: format!("spotify:track:{}", id),
            popularity: 120,
            explicit: false,
            album: SpotifyAlbum {
                release_date: date.map(str::to_string),
                release_date_precision: precision.map(str::to_string),
            },
            artists: vec![
                SpotifyArtistRef {
                    id: Some("a1".to_string()),
                    name: "One".to_string(),
                },
                SpotifyArtistRef {
                    id: None,
                    name: "Local".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_items_dedupe_and_skip_bad_dates() {
        let raw_tracks = vec![
            raw("t1", Some("1999"), Some("year")),
            raw("t2", Some("garbage"), Some("day")),
            raw("t1", Some("1999"), Some("year")),
            raw("t3", None, None),
            raw("t4", Some("2004-06"), Some("month")),
        ];

        let items = to_items(&raw_tracks, Utc::now());
        let ids: Vec<&str> = items.iter().map(|i| i.track.track_id.as_str()).collect();

        assert_eq!(ids, vec!["t1", "t4"]);
        assert_eq!(items[0].track.release_date, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap());
        assert_eq!(items[1].track.release_date, NaiveDate::from_ymd_opt(2004, 6, 1).unwrap());
        assert_eq!(items[0].artist_ids, vec!["a1"]);
        assert_eq!(items[0].track.popularity, 100);
    }

    #[test]
    fn test_clamp_popularity() {
        assert_eq!(clamp_popularity(-5), 0);
        assert_eq!(clamp_popularity(64), 64);
        assert_eq!(clamp_popularity(101), 100);
    }
}
