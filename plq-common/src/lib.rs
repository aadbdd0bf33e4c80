//! # PLQ Common Library
//!
//! Shared code for the playlist uniqueness analyzer:
//! - Uniqueness scoring engine (diversity primitive + weighted aggregator)
//! - Configuration loading and root folder resolution
//! - Common error type
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod time;
pub mod uniqueness;

pub use error::{Error, Result};
pub use uniqueness::{
    calculate_uniqueness, compute_uniqueness, dataset_uniqueness, UniquenessBreakdown,
    UniquenessError, WeightConfig,
};
