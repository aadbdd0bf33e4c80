//! Analysis API handlers
//!
//! POST /analysis/start, GET /analysis/status, GET /analysis/result

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::playlists::PlaylistVersion;
use crate::error::{ApiError, ApiResult};
use crate::spotify::is_valid_spotify_id;
use crate::tasks::{decode_task_id, encode_task_id, TaskStatus};
use crate::AppState;

/// POST /analysis/start request
#[derive(Debug, Deserialize)]
pub struct StartAnalysisRequest {
    pub spotify_playlist_id: String,
}

/// Playlist metadata at the analyzed snapshot
#[derive(Debug, Serialize)]
pub struct PlaylistInfo {
    pub spotify_playlist_id: String,
    pub snapshot_id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_name: Option<String>,
    pub owner_spotify_id: String,
    pub followers: i64,
    pub tracks_count: i64,
    pub image_url: Option<String>,
}

impl PlaylistInfo {
    fn new(spotify_playlist_id: String, version: PlaylistVersion) -> Self {
        Self {
            spotify_playlist_id,
            snapshot_id: version.snapshot_id,
            name: version.name,
            description: version.description,
            owner_name: version.owner_name,
            owner_spotify_id: version.owner_spotify_id,
            followers: version.followers,
            tracks_count: version.tracks_count,
            image_url: version.image_url,
        }
    }
}

/// POST /analysis/start response
#[derive(Debug, Serialize)]
pub struct StartAnalysisResponse {
    pub task_id: String,
    pub info: PlaylistInfo,
}

/// Query string of the status and result endpoints
#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    pub task_id: String,
}

/// GET /analysis/status response
#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: TaskStatus,
}

/// GET /analysis/result response
#[derive(Debug, Serialize)]
pub struct TaskResultResponse {
    pub task_id: String,
    pub result: f64,
}

/// POST /analysis/start
///
/// Fetches playlist metadata, then scores the playlist in the background.
pub async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<StartAnalysisRequest>,
) -> ApiResult<Json<StartAnalysisResponse>> {
    let playlist_id = request.spotify_playlist_id.trim().to_string();
    if !is_valid_spotify_id(&playlist_id) {
        return Err(ApiError::InvalidSpotifyId(format!(
            "'{}' is not a 22-character base-62 id",
            request.spotify_playlist_id
        )));
    }

    let version = state.service.playlist_info(&playlist_id).await?;
    let task_id = state
        .service
        .start_analysis(&state.tasks, playlist_id.clone(), version.version_id)
        .await;

    tracing::info!(
        playlist_id = %playlist_id,
        version_id = %version.version_id,
        task_id = %task_id,
        "Analysis task queued"
    );

    Ok(Json(StartAnalysisResponse {
        task_id: encode_task_id(task_id),
        info: PlaylistInfo::new(playlist_id, version),
    }))
}

/// GET /analysis/status?task_id=
pub async fn get_analysis_status(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<TaskStatusResponse>> {
    let task_id = parse_task_id(&query.task_id)?;
    let record = state
        .tasks
        .get(task_id)
        .await
        .ok_or_else(|| ApiError::TaskNotFound(query.task_id.clone()))?;

    Ok(Json(TaskStatusResponse {
        task_id: query.task_id,
        status: record.status,
    }))
}

/// GET /analysis/result?task_id=
pub async fn get_analysis_result(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<TaskResultResponse>> {
    let task_id = parse_task_id(&query.task_id)?;
    let record = state
        .tasks
        .get(task_id)
        .await
        .ok_or_else(|| ApiError::TaskNotFound(query.task_id.clone()))?;

    match (record.status, record.result) {
        (TaskStatus::Success, Some(result)) => Ok(Json(TaskResultResponse {
            task_id: query.task_id,
            result,
        })),
        (TaskStatus::Failure, _) => Err(ApiError::TaskFailed(
            record.error.unwrap_or_else(|| "Analysis failed".to_string()),
        )),
        _ => Err(ApiError::TaskNotCompleted(query.task_id)),
    }
}

fn parse_task_id(encoded: &str) -> ApiResult<Uuid> {
    decode_task_id(encoded).ok_or_else(|| ApiError::InvalidTaskId(encoded.to_string()))
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/analysis/start", post(start_analysis))
        .route("/analysis/status", get(get_analysis_status))
        .route("/analysis/result", get(get_analysis_result))
}
