//! plq-an library interface
//!
//! Playlist analyzer: resolves playlists through the Spotify catalog, caches
//! catalog data in SQLite, and scores playlists with the uniqueness engine
//! from plq-common. Exposed as a library for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod services;
pub mod spotify;
pub mod tasks;

pub use crate::error::{ApiError, ApiResult};

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::AnalysisService;
use crate::tasks::TaskRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub service: Arc<AnalysisService>,
    pub tasks: TaskRegistry,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, service: Arc<AnalysisService>) -> Self {
        Self {
            db,
            service,
            tasks: TaskRegistry::new(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `cors_origin` is the single origin allowed to call the API from a browser;
/// an unparseable value disables CORS with a warning.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let router = Router::new()
        .merge(api::analysis_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match HeaderValue::from_str(cors_origin) {
        Ok(origin) => router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE]),
        ),
        Err(_) => {
            tracing::warn!(origin = %cors_origin, "Invalid CORS origin, CORS disabled");
            router
        }
    }
}
