//! Analysis services
//!
//! - `catalog_resolver`: turns a playlist into scoring tracks, caching catalog data
//! - `analysis_service`: playlist versions, analysis records, background tasks

pub mod analysis_service;
pub mod catalog_resolver;

use thiserror::Error;
use uuid::Uuid;

use crate::spotify::SpotifyError;
use plq_common::UniquenessError;

pub use analysis_service::{AnalysisOutcome, AnalysisService};
pub use catalog_resolver::CatalogResolver;

/// Errors raised while resolving or scoring a playlist
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Spotify error: {0}")]
    Spotify(#[from] SpotifyError),

    #[error(transparent)]
    Database(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Scoring error: {0}")]
    Scoring(#[from] UniquenessError),

    #[error("Playlist version not found: {0}")]
    VersionNotFound(Uuid),

    #[error("Analysis already running for version {0}")]
    InProgress(Uuid),

    #[error("Scoring task failed: {0}")]
    TaskJoin(String),
}
