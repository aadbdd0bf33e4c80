//! Playlist versions, analysis records and background analysis tasks

use std::sync::Arc;

use plq_common::config::AnalysisConfig;
use plq_common::time::current_year;
use plq_common::uniqueness::{
    compute_uniqueness, flatten_artists, UniquenessBreakdown, WeightConfig,
};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{AnalysisError, CatalogResolver};
use crate::db::analyses::{self, Analysis, AnalysisStatus};
use crate::db::playlists::{self, Playlist, PlaylistVersion};
use crate::spotify::{CatalogApi, SpotifyPlaylist};
use crate::tasks::TaskRegistry;

/// Result of one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub uniqueness: f64,
    /// Absent when the score came from an earlier analysis of the same version
    pub breakdown: Option<UniquenessBreakdown>,
    /// Tracks that entered the score (stored results: tracks linked to the version)
    pub scored_tracks: usize,
}

pub struct AnalysisService {
    pool: SqlitePool,
    catalog: Arc<dyn CatalogApi>,
    config: AnalysisConfig,
    weights: WeightConfig,
}

impl AnalysisService {
    pub fn new(
        pool: SqlitePool,
        catalog: Arc<dyn CatalogApi>,
        config: AnalysisConfig,
        weights: WeightConfig,
    ) -> Self {
        Self {
            pool,
            catalog,
            config,
            weights,
        }
    }

    /// Fetch playlist metadata and return the version for its current snapshot
    ///
    /// Creates the playlist and/or version rows on first sight of a playlist or snapshot.
    pub async fn playlist_info(
        &self,
        spotify_playlist_id: &str,
    ) -> Result<PlaylistVersion, AnalysisError> {
        let remote = self.catalog.playlist(spotify_playlist_id).await?;

        let playlist_id =
            match playlists::load_playlist_by_spotify_id(&self.pool, spotify_playlist_id).await? {
                Some(existing) => {
                    if existing.current_snapshot_id != remote.snapshot_id {
                        tracing::info!(
                            playlist_id = %spotify_playlist_id,
                            old_snapshot = %existing.current_snapshot_id,
                            new_snapshot = %remote.snapshot_id,
                            "Playlist changed since last seen"
                        );
                        playlists::update_current_snapshot(
                            &self.pool,
                            existing.playlist_id,
                            &remote.snapshot_id,
                        )
                        .await?;
                    }
                    existing.playlist_id
                }
                None => {
                    let playlist = Playlist::new(
                        spotify_playlist_id.to_string(),
                        remote.snapshot_id.clone(),
                    );
                    playlists::save_playlist(&self.pool, &playlist).await?;
                    tracing::info!(playlist_id = %spotify_playlist_id, "New playlist recorded");
                    playlist.playlist_id
                }
            };

        if let Some(version) =
            playlists::load_version_by_snapshot(&self.pool, &remote.snapshot_id).await?
        {
            return Ok(version);
        }

        let version = new_version(playlist_id, &remote);
        playlists::save_version(&self.pool, &version).await?;
        Ok(version)
    }

    /// Score a playlist version
    ///
    /// A version that was already scored returns its stored result. A version
    /// whose analysis is still running is rejected. Failed analyses are retried.
    pub async fn analyze_playlist(
        &self,
        spotify_playlist_id: &str,
        version_id: Uuid,
        task_id: Uuid,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        if playlists::load_version(&self.pool, version_id).await?.is_none() {
            return Err(AnalysisError::VersionNotFound(version_id));
        }

        let mut analysis = match analyses::load_analysis_by_version(&self.pool, version_id).await? {
            Some(existing) => match (existing.status, existing.uniqueness) {
                (AnalysisStatus::Success, Some(uniqueness)) => {
                    tracing::info!(
                        version_id = %version_id,
                        uniqueness,
                        "Returning stored analysis"
                    );
                    let scored_tracks =
                        playlists::load_version_track_ids(&self.pool, version_id).await?.len();
                    return Ok(AnalysisOutcome {
                        uniqueness,
                        breakdown: None,
                        scored_tracks,
                    });
                }
                (AnalysisStatus::Pending | AnalysisStatus::Started, _) => {
                    return Err(AnalysisError::InProgress(version_id));
                }
                (status, _) => {
                    // Another request may restart the same analysis first
                    if !analyses::restart_analysis(&self.pool, existing.analysis_id, status, task_id)
                        .await?
                    {
                        return Err(AnalysisError::InProgress(version_id));
                    }
                    Analysis {
                        status: AnalysisStatus::Started,
                        task_id,
                        uniqueness: None,
                        error: None,
                        ..existing
                    }
                }
            },
            None => {
                let analysis = Analysis::new(version_id, task_id, AnalysisStatus::Started);
                if !analyses::save_analysis(&self.pool, &analysis).await? {
                    return Err(AnalysisError::InProgress(version_id));
                }
                analysis
            }
        };

        tracing::info!(
            playlist_id = %spotify_playlist_id,
            version_id = %version_id,
            task_id = %task_id,
            "Analysis started"
        );

        match self.run_analysis(spotify_playlist_id, version_id).await {
            Ok(outcome) => {
                analysis.status = AnalysisStatus::Success;
                analysis.uniqueness = Some(outcome.uniqueness);
                analyses::update_analysis(&self.pool, &analysis).await?;
                tracing::info!(
                    version_id = %version_id,
                    uniqueness = outcome.uniqueness,
                    tracks = outcome.scored_tracks,
                    "Analysis complete"
                );
                Ok(outcome)
            }
            Err(e) => {
                analysis.status = AnalysisStatus::Failed;
                analysis.error = Some(e.to_string());
                if let Err(update_err) = analyses::update_analysis(&self.pool, &analysis).await {
                    tracing::error!(
                        version_id = %version_id,
                        error = %update_err,
                        "Failed to record analysis failure"
                    );
                }
                tracing::warn!(version_id = %version_id, error = %e, "Analysis failed");
                Err(e)
            }
        }
    }

    async fn run_analysis(
        &self,
        spotify_playlist_id: &str,
        version_id: Uuid,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let resolver = CatalogResolver::new(self.catalog.as_ref(), &self.pool, &self.config);
        let tracks = resolver.resolve_playlist(spotify_playlist_id, version_id).await?;
        let scored_tracks = tracks.len();
        let weights = self.weights.clone();
        let year = current_year();

        let breakdown = tokio::task::spawn_blocking(move || {
            let artists = flatten_artists(&tracks);
            compute_uniqueness(&tracks, &artists, &weights, year)
        })
        .await
        .map_err(|e| AnalysisError::TaskJoin(e.to_string()))??;

        Ok(AnalysisOutcome {
            uniqueness: breakdown.uniqueness,
            breakdown: Some(breakdown),
            scored_tracks,
        })
    }

    /// Register a task and run the analysis in the background
    ///
    /// The returned task id is PENDING until the spawned task picks it up.
    pub async fn start_analysis(
        self: &Arc<Self>,
        tasks: &TaskRegistry,
        spotify_playlist_id: String,
        version_id: Uuid,
    ) -> Uuid {
        let task_id = tasks.create().await;
        let service = Arc::clone(self);
        let tasks = tasks.clone();

        tokio::spawn(async move {
            tasks.mark_started(task_id).await;
            match service
                .analyze_playlist(&spotify_playlist_id, version_id, task_id)
                .await
            {
                Ok(outcome) => tasks.mark_success(task_id, outcome.uniqueness).await,
                Err(e) => tasks.mark_failure(task_id, e.to_string()).await,
            }
        });

        task_id
    }
}

fn new_version(playlist_id: Uuid, remote: &SpotifyPlaylist) -> PlaylistVersion {
    PlaylistVersion {
        version_id: Uuid::new_v4(),
        playlist_id,
        snapshot_id: remote.snapshot_id.clone(),
        name: remote.name.clone(),
        description: remote.description.clone().filter(|d| !d.is_empty()),
        owner_name: remote.owner.display_name.clone(),
        owner_spotify_id: remote.owner.id.clone(),
        followers: remote.followers.total,
        tracks_count: remote.tracks.total,
        image_url: remote.image_url().map(str::to_string),
    }
}
