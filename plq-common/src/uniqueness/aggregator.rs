//! Weighted aggregation of the six uniqueness components

use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::diversity::dataset_uniqueness;
use super::error::UniquenessError;
use super::model::{Artist, CompleteFeatures, Track};
use super::weights::WeightConfig;

/// Per-component scores plus the weighted result
///
/// Components are not clamped; only `uniqueness` is the headline value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniquenessBreakdown {
    /// P
    pub popularity: f64,
    /// A
    pub artist_diversity: f64,
    /// M
    pub musical_diversity: f64,
    /// G
    pub genre_diversity: f64,
    /// T
    pub temporal_diversity: f64,
    /// E
    pub era_diversity: f64,
    /// U
    pub uniqueness: f64,
}

impl UniquenessBreakdown {
    /// Components in weight order (P, A, M, G, T, E)
    pub fn components(&self) -> [f64; 6] {
        [
            self.popularity,
            self.artist_diversity,
            self.musical_diversity,
            self.genre_diversity,
            self.temporal_diversity,
            self.era_diversity,
        ]
    }
}

/// Every artist credit across the playlist, duplicates included
pub fn flatten_artists(tracks: &[Track]) -> Vec<Artist> {
    tracks
        .iter()
        .flat_map(|track| track.artists.iter().cloned())
        .collect()
}

/// Headline uniqueness score
///
/// `artists` is the flat list of artist credits (see [`flatten_artists`]); it feeds the
/// popularity and genre components without deduplication. Artist diversity counts unique
/// IDs from the tracks' own artist lists.
pub fn calculate_uniqueness(
    tracks: &[Track],
    artists: &[Artist],
    weights: &WeightConfig,
    current_year: i32,
) -> Result<f64, UniquenessError> {
    compute_uniqueness(tracks, artists, weights, current_year).map(|b| b.uniqueness)
}

/// Full component breakdown
///
/// Validation order: weights, then track count, then audio features.
pub fn compute_uniqueness(
    tracks: &[Track],
    artists: &[Artist],
    weights: &WeightConfig,
    current_year: i32,
) -> Result<UniquenessBreakdown, UniquenessError> {
    let weights = weights.resolve()?;

    if tracks.is_empty() {
        return Err(UniquenessError::EmptyPlaylist);
    }

    let features = tracks
        .iter()
        .map(|track| {
            track
                .features
                .as_ref()
                .and_then(|f| f.complete())
                .ok_or_else(|| UniquenessError::IncompleteFeatures(track.id.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let years: Vec<i32> = tracks.iter().map(|t| t.release_date.year()).collect();
    let track_count = tracks.len() as f64;

    let popularity = popularity_component(tracks, artists);
    let artist_diversity = artist_diversity_component(tracks);
    let musical_diversity = musical_diversity_component(&features);
    let genre_diversity = genre_diversity_component(artists, track_count);
    let temporal_diversity = temporal_diversity_component(&years, current_year);
    let era_diversity = era_diversity_component(&years, current_year);

    let components = [
        popularity,
        artist_diversity,
        musical_diversity,
        genre_diversity,
        temporal_diversity,
        era_diversity,
    ];
    let weighted: f64 = weights
        .as_array()
        .iter()
        .zip(components.iter())
        .map(|(w, c)| w * c)
        .sum();
    let uniqueness = weighted / weights.total();

    Ok(UniquenessBreakdown {
        popularity,
        artist_diversity,
        musical_diversity,
        genre_diversity,
        temporal_diversity,
        era_diversity,
        uniqueness,
    })
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let len = values.len();
    if len == 0 {
        return 0.0;
    }
    values.sum::<f64>() / len as f64
}

/// P = 1 - (mean track popularity + mean artist popularity) / 200
fn popularity_component(tracks: &[Track], artists: &[Artist]) -> f64 {
    let track_mean = mean(tracks.iter().map(|t| f64::from(t.popularity)));
    let artist_mean = mean(artists.iter().map(|a| f64::from(a.popularity)));
    1.0 - (track_mean + artist_mean) / 200.0
}

/// A = (unique artists / tracks) * (1 - most artists on one track / tracks)
fn artist_diversity_component(tracks: &[Track]) -> f64 {
    let track_count = tracks.len() as f64;
    let unique_artists = tracks
        .iter()
        .flat_map(|t| t.artists.iter().map(|a| a.id.as_str()))
        .collect::<BTreeSet<_>>()
        .len() as f64;
    let max_per_track = tracks.iter().map(|t| t.artists.len()).max().unwrap_or(0) as f64;

    (unique_artists / track_count) * (1.0 - max_per_track / track_count)
}

/// M = mean diversity over the eight audio feature dimensions
fn musical_diversity_component(features: &[CompleteFeatures]) -> f64 {
    let dimensions: [fn(&CompleteFeatures) -> f64; 8] = [
        |f| f.tempo,
        |f| f.key,
        |f| f.loudness,
        |f| f.duration_ms,
        |f| f.mode,
        |f| f.energy,
        |f| f.valence,
        |f| f.danceability,
    ];

    let scores = dimensions.iter().map(|dimension| {
        let column: Vec<f64> = features.iter().map(dimension).collect();
        dataset_uniqueness(&column)
    });
    mean(scores)
}

/// G = (unique genres / tracks) * (1 - H / ln(unique genres))
///
/// One unique genre: the entropy term is taken as 0, so G = 1 / tracks.
/// No genres at all: G = 0.
fn genre_diversity_component(artists: &[Artist], track_count: f64) -> f64 {
    // BTreeMap keeps summation order stable between calls
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for genre in artists.iter().flat_map(|a| a.genres.iter()) {
        *counts.entry(genre.as_str()).or_default() += 1;
    }

    let unique_genres = counts.len();
    if unique_genres == 0 {
        return 0.0;
    }
    let genre_share = unique_genres as f64 / track_count;
    if unique_genres == 1 {
        return genre_share;
    }

    let total: usize = counts.values().sum();
    let entropy: f64 = -counts
        .values()
        .map(|count| {
            let p = *count as f64 / total as f64;
            p * p.ln()
        })
        .sum::<f64>();

    genre_share * (1.0 - entropy / (unique_genres as f64).ln())
}

/// T = 1 - (newest - oldest) / (current year - oldest + 1)
///
/// A release year later than `current_year` is treated as the current year.
fn temporal_diversity_component(years: &[i32], current_year: i32) -> f64 {
    let (Some(&min_year), Some(&max_year)) = (years.iter().min(), years.iter().max()) else {
        return 0.0;
    };
    let current_year = current_year.max(max_year);
    1.0 - f64::from(max_year - min_year) / f64::from(current_year - min_year + 1)
}

/// E = unique decades / (current decade - oldest decade + 1)
fn era_diversity_component(years: &[i32], current_year: i32) -> f64 {
    let Some(&min_year) = years.iter().min() else {
        return 0.0;
    };
    let max_year = years.iter().copied().max().unwrap_or(min_year);
    let current_decade = current_year.max(max_year).div_euclid(10);
    let min_decade = min_year.div_euclid(10);
    let unique_decades = years
        .iter()
        .map(|y| y.div_euclid(10))
        .collect::<BTreeSet<_>>()
        .len();

    unique_decades as f64 / f64::from(current_decade - min_decade + 1)
}
