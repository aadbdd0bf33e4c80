//! Playlist uniqueness scoring engine
//!
//! Pure, synchronous computation over a resolved playlist snapshot. Nothing in here performs
//! I/O, reads the clock, or logs; the current year is passed in by the caller.
//!
//! # Components
//! - **P** Popularity: how far track and artist popularity sit below the maximum
//! - **A** Artist diversity: unique artists per track, penalised by heavy co-billing
//! - **M** Musical diversity: [`dataset_uniqueness`] averaged over eight audio features
//! - **G** Genre diversity: unique genres per track, scaled by genre entropy
//! - **T** Temporal diversity: release year spread relative to the age of the oldest track
//! - **E** Era diversity: share of decades covered since the oldest track's decade
//!
//! `U = (w1·P + w2·A + w3·M + w4·G + w5·T + w6·E) / (w1 + ... + w6)`

pub mod aggregator;
pub mod diversity;
pub mod error;
pub mod model;
pub mod weights;

pub use aggregator::{calculate_uniqueness, compute_uniqueness, flatten_artists, UniquenessBreakdown};
pub use diversity::dataset_uniqueness;
pub use error::UniquenessError;
pub use model::{Artist, Track, TrackFeatures};
pub use weights::{ResolvedWeights, WeightConfig, WEIGHT_KEYS};
