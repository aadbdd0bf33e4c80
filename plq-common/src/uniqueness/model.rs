//! Read-only scoring inputs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Artist as seen by the scoring engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    /// Catalog artist ID
    pub id: String,
    /// Catalog popularity (0-100)
    pub popularity: u8,
    /// Genre tags attached to the artist
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Per-track audio features
///
/// Every field is nullable because the catalog may not report all of them. The aggregator
/// rejects tracks where any field is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatures {
    /// Beats per minute
    pub tempo: Option<f64>,
    /// Pitch class (0 = C, 1 = C#, ..., 11 = B; -1 = undetected)
    pub key: Option<i32>,
    /// Overall loudness in dB
    pub loudness: Option<f64>,
    /// 1 = major, 0 = minor
    pub mode: Option<i32>,
    pub duration_ms: Option<i64>,
    pub energy: Option<f64>,
    pub valence: Option<f64>,
    pub danceability: Option<f64>,
}

/// Fully populated feature vector, one value per scored dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CompleteFeatures {
    pub tempo: f64,
    pub key: f64,
    pub loudness: f64,
    pub duration_ms: f64,
    pub mode: f64,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
}

impl TrackFeatures {
    /// True when all eight scored fields are present
    pub fn is_complete(&self) -> bool {
        self.complete().is_some()
    }

    pub(crate) fn complete(&self) -> Option<CompleteFeatures> {
        Some(CompleteFeatures {
            tempo: self.tempo?,
            key: f64::from(self.key?),
            loudness: self.loudness?,
            duration_ms: self.duration_ms? as f64,
            mode: f64::from(self.mode?),
            energy: self.energy?,
            valence: self.valence?,
            danceability: self.danceability?,
        })
    }
}

/// Track as seen by the scoring engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Catalog track ID
    pub id: String,
    /// Catalog popularity (0-100)
    pub popularity: u8,
    pub release_date: NaiveDate,
    /// Credited artists, in catalog order
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub features: Option<TrackFeatures>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_features() -> TrackFeatures {
        TrackFeatures {
            tempo: Some(120.0),
            key: Some(5),
            loudness: Some(-6.0),
            mode: Some(1),
            duration_ms: Some(210_000),
            energy: Some(0.8),
            valence: Some(0.6),
            danceability: Some(0.7),
        }
    }

    #[test]
    fn test_complete_features_converts_every_field() {
        let complete = full_features().complete().expect("features should be complete");
        assert_eq!(complete.tempo, 120.0);
        assert_eq!(complete.key, 5.0);
        assert_eq!(complete.mode, 1.0);
        assert_eq!(complete.duration_ms, 210_000.0);
    }

    #[test]
    fn test_any_missing_field_is_incomplete() {
        let mut features = full_features();
        features.valence = None;
        assert!(!features.is_complete());

        assert!(!TrackFeatures::default().is_complete());
    }

    #[test]
    fn test_artist_genres_default_when_absent() {
        let artist: Artist = serde_json::from_str(r#"{"id":"a1","popularity":40}"#).unwrap();
        assert!(artist.genres.is_empty());
    }
}
