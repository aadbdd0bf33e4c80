//! Scoring validation errors

use thiserror::Error;

/// Reasons the scoring engine refuses its inputs
///
/// All variants are local validation failures raised before any component is computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UniquenessError {
    /// One of the six required weight keys is absent
    #[error("Missing weight: {0}")]
    MissingWeight(String),

    /// A weight is negative or not a finite number
    #[error("Invalid weight for {key}: {value}")]
    InvalidWeight { key: String, value: f64 },

    /// Weights are present but do not sum to 1.0
    #[error("Weights must sum to 1.0, got {0}")]
    InvalidWeightSum(f64),

    /// No tracks were supplied
    #[error("Playlist has no tracks")]
    EmptyPlaylist,

    /// A track lacks one or more audio features
    #[error("Track {0} has incomplete audio features")]
    IncompleteFeatures(String),
}
