//! Analysis records, one per playlist version

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Started,
    Success,
    Failed,
    Revoked,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Started => "started",
            AnalysisStatus::Success => "success",
            AnalysisStatus::Failed => "failed",
            AnalysisStatus::Revoked => "revoked",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "started" => Ok(AnalysisStatus::Started),
            "success" => Ok(AnalysisStatus::Success),
            "failed" => Ok(AnalysisStatus::Failed),
            "revoked" => Ok(AnalysisStatus::Revoked),
            other => Err(anyhow!("Unknown analysis status: {}", other)),
        }
    }
}

/// Analysis record
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub analysis_id: Uuid,
    pub version_id: Uuid,
    pub status: AnalysisStatus,
    pub task_id: Uuid,
    pub uniqueness: Option<f64>,
    pub error: Option<String>,
}

impl Analysis {
    pub fn new(version_id: Uuid, task_id: Uuid, status: AnalysisStatus) -> Self {
        Self {
            analysis_id: Uuid::new_v4(),
            version_id,
            status,
            task_id,
            uniqueness: None,
            error: None,
        }
    }
}

/// Save a new analysis
///
/// Returns false, leaving the stored row untouched, when the version already
/// has one (one analysis per version).
pub async fn save_analysis(pool: &SqlitePool, analysis: &Analysis) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT INTO analyses (
            analysis_id, version_id, status, task_id, uniqueness, error, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(version_id) DO NOTHING
        "#,
    )
    .bind(analysis.analysis_id.to_string())
    .bind(analysis.version_id.to_string())
    .bind(analysis.status.as_str())
    .bind(analysis.task_id.to_string())
    .bind(analysis.uniqueness)
    .bind(&analysis.error)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Move a finished analysis back to STARTED under a new task
///
/// Returns false when its stored status is no longer `from`.
pub async fn restart_analysis(
    pool: &SqlitePool,
    analysis_id: Uuid,
    from: AnalysisStatus,
    task_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE analyses
        SET status = ?, task_id = ?, uniqueness = NULL, error = NULL, updated_at = ?
        WHERE analysis_id = ? AND status = ?
        "#,
    )
    .bind(AnalysisStatus::Started.as_str())
    .bind(task_id.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(analysis_id.to_string())
    .bind(from.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Update status, score and error of an existing analysis
pub async fn update_analysis(pool: &SqlitePool, analysis: &Analysis) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE analyses
        SET status = ?, task_id = ?, uniqueness = ?, error = ?, updated_at = ?
        WHERE analysis_id = ?
        "#,
    )
    .bind(analysis.status.as_str())
    .bind(analysis.task_id.to_string())
    .bind(analysis.uniqueness)
    .bind(&analysis.error)
    .bind(Utc::now().to_rfc3339())
    .bind(analysis.analysis_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark analyses left PENDING or STARTED by an earlier process as REVOKED
///
/// Task state lives in memory, so nothing can finish them after a restart.
pub async fn revoke_unfinished(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE analyses
        SET status = ?, updated_at = ?
        WHERE status IN (?, ?)
        "#,
    )
    .bind(AnalysisStatus::Revoked.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(AnalysisStatus::Pending.as_str())
    .bind(AnalysisStatus::Started.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Load the analysis of a version
pub async fn load_analysis_by_version(
    pool: &SqlitePool,
    version_id: Uuid,
) -> Result<Option<Analysis>> {
    let row = sqlx::query(
        r#"
        SELECT analysis_id, version_id, status, task_id, uniqueness, error
        FROM analyses
        WHERE version_id = ?
        "#,
    )
    .bind(version_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(analysis_from_row).transpose()
}

fn analysis_from_row(row: &SqliteRow) -> Result<Analysis> {
    let analysis_id: String = row.get("analysis_id");
    let version_id: String = row.get("version_id");
    let status: String = row.get("status");
    let task_id: String = row.get("task_id");

    Ok(Analysis {
        analysis_id: Uuid::parse_str(&analysis_id)?,
        version_id: Uuid::parse_str(&version_id)?,
        status: status.parse()?,
        task_id: Uuid::parse_str(&task_id)?,
        uniqueness: row.get("uniqueness"),
        error: row.get("error"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::db::playlists::{save_playlist, save_version, Playlist, PlaylistVersion};

    async fn seeded_version(pool: &SqlitePool) -> Uuid {
        let playlist = Playlist::new("p".to_string(), "snap".to_string());
        save_playlist(pool, &playlist).await.unwrap();
        let version = PlaylistVersion {
            version_id: Uuid::new_v4(),
            playlist_id: playlist.playlist_id,
            snapshot_id: "snap".to_string(),
            name: "n".to_string(),
            description: None,
            owner_name: None,
            owner_spotify_id: "o".to_string(),
            followers: 0,
            tracks_count: 0,
            image_url: None,
        };
        save_version(pool, &version).await.unwrap();
        version.version_id
    }

    #[test]
    fn test_status_strings() {
        for status in [
            AnalysisStatus::Pending,
            AnalysisStatus::Started,
            AnalysisStatus::Success,
            AnalysisStatus::Failed,
            AnalysisStatus::Revoked,
        ] {
            assert_eq!(status.as_str().parse::<AnalysisStatus>().unwrap(), status);
        }
        assert!("done".parse::<AnalysisStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&AnalysisStatus::Started).unwrap(),
            "\"started\""
        );
    }

    #[tokio::test]
    async fn test_save_update_load() {
        let pool = memory_pool().await;
        let version_id = seeded_version(&pool).await;

        let mut analysis = Analysis::new(version_id, Uuid::new_v4(), AnalysisStatus::Started);
        save_analysis(&pool, &analysis).await.expect("Failed to save analysis");

        analysis.status = AnalysisStatus::Success;
        analysis.uniqueness = Some(0.42);
        update_analysis(&pool, &analysis).await.unwrap();

        let loaded = load_analysis_by_version(&pool, version_id)
            .await
            .unwrap()
            .expect("Analysis not found");
        assert_eq!(loaded, analysis);
    }

    #[tokio::test]
    async fn test_revoke_unfinished() {
        let pool = memory_pool().await;
        let version_id = seeded_version(&pool).await;
        save_analysis(&pool, &Analysis::new(version_id, Uuid::new_v4(), AnalysisStatus::Started))
            .await
            .unwrap();

        assert_eq!(revoke_unfinished(&pool).await.unwrap(), 1);
        let loaded = load_analysis_by_version(&pool, version_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, AnalysisStatus::Revoked);
        assert_eq!(revoke_unfinished(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_one_analysis_per_version() {
        let pool = memory_pool().await;
        let version_id = seeded_version(&pool).await;

        save_analysis(&pool, &Analysis::new(version_id, Uuid::new_v4(), AnalysisStatus::Started))
            .await
            .unwrap();
        let second = Analysis::new(version_id, Uuid::new_v4(), AnalysisStatus::Started);
        assert!(!save_analysis(&pool, &second).await.unwrap());

        let stored = load_analysis_by_version(&pool, version_id).await.unwrap().unwrap();
        assert_ne!(stored.analysis_id, second.analysis_id);
    }

    #[tokio::test]
    async fn test_restart_only_from_expected_status() {
        let pool = memory_pool().await;
        let version_id = seeded_version(&pool).await;
        let mut failed = Analysis::new(version_id, Uuid::new_v4(), AnalysisStatus::Failed);
        failed.error = Some("boom".to_string());
        save_analysis(&pool, &failed).await.unwrap();

        let task_id = Uuid::new_v4();
        assert!(restart_analysis(&pool, failed.analysis_id, AnalysisStatus::Failed, task_id)
            .await
            .unwrap());
        // Already restarted by the call above
        assert!(!restart_analysis(&pool, failed.analysis_id, AnalysisStatus::Failed, Uuid::new_v4())
            .await
            .unwrap());

        let loaded = load_analysis_by_version(&pool, version_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, AnalysisStatus::Started);
        assert_eq!(loaded.task_id, task_id);
        assert!(loaded.error.is_none());
    }
}
