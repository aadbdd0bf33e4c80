//! Component weight configuration
//!
//! Weights arrive as a plain key/value map (TOML `[weights]` table) and are validated into
//! [`ResolvedWeights`] before any scoring happens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::UniquenessError;

pub const POPULARITY: &str = "popularity";
pub const ARTIST_DIVERSITY: &str = "artist_diversity";
pub const MUSICAL_DIVERSITY: &str = "musical_diversity";
pub const GENRE_DIVERSITY: &str = "genre_diversity";
pub const TEMPORAL_DIVERSITY: &str = "temporal_diversity";
pub const ERA_DIVERSITY: &str = "era_diversity";

/// The six required weight keys, in component order (P, A, M, G, T, E)
pub const WEIGHT_KEYS: [&str; 6] = [
    POPULARITY,
    ARTIST_DIVERSITY,
    MUSICAL_DIVERSITY,
    GENRE_DIVERSITY,
    TEMPORAL_DIVERSITY,
    ERA_DIVERSITY,
];

/// Tolerance for the weight sum check
pub const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Raw weight map keyed by component name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightConfig(BTreeMap<String, f64>);

impl WeightConfig {
    /// Build from any iterator of (key, weight) pairs
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Every key set to 1/6
    pub fn uniform() -> Self {
        Self::from_pairs(WEIGHT_KEYS.iter().map(|key| (*key, 1.0 / 6.0)))
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, weight: f64) {
        self.0.insert(key.into(), weight);
    }

    pub fn remove(&mut self, key: &str) -> Option<f64> {
        self.0.remove(key)
    }

    /// Validate presence, sign and sum
    ///
    /// Unknown keys are ignored.
    pub fn resolve(&self) -> Result<ResolvedWeights, UniquenessError> {
        let mut values = [0.0; 6];
        for (slot, key) in values.iter_mut().zip(WEIGHT_KEYS) {
            let weight = self
                .get(key)
                .ok_or_else(|| UniquenessError::MissingWeight(key.to_string()))?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(UniquenessError::InvalidWeight {
                    key: key.to_string(),
                    value: weight,
                });
            }
            *slot = weight;
        }

        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(UniquenessError::InvalidWeightSum(sum));
        }

        let [popularity, artist_diversity, musical_diversity, genre_diversity, temporal_diversity, era_diversity] =
            values;
        Ok(ResolvedWeights {
            popularity,
            artist_diversity,
            musical_diversity,
            genre_diversity,
            temporal_diversity,
            era_diversity,
        })
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self::from_pairs([
            (POPULARITY, 0.3),
            (ARTIST_DIVERSITY, 0.2),
            (MUSICAL_DIVERSITY, 0.1),
            (GENRE_DIVERSITY, 0.2),
            (TEMPORAL_DIVERSITY, 0.1),
            (ERA_DIVERSITY, 0.1),
        ])
    }
}

/// Validated weights, one per component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedWeights {
    pub popularity: f64,
    pub artist_diversity: f64,
    pub musical_diversity: f64,
    pub genre_diversity: f64,
    pub temporal_diversity: f64,
    pub era_diversity: f64,
}

impl ResolvedWeights {
    /// Weights in component order (P, A, M, G, T, E)
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.popularity,
            self.artist_diversity,
            self.musical_diversity,
            self.genre_diversity,
            self.temporal_diversity,
            self.era_diversity,
        ]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_resolve() {
        let resolved = WeightConfig::default().resolve().unwrap();
        assert_eq!(resolved.popularity, 0.3);
        assert_eq!(resolved.genre_diversity, 0.2);
        assert!((resolved.total() - 1.0).abs() < WEIGHT_SUM_EPSILON);
    }

    #[test]
    fn test_uniform_weights_resolve_despite_float_drift() {
        // 6 * (1/6) is 0.9999999999999999 in f64
        let resolved = WeightConfig::uniform().resolve().unwrap();
        assert!(resolved.as_array().iter().all(|w| *w == 1.0 / 6.0));
    }

    #[test]
    fn test_each_missing_key_is_reported() {
        for key in WEIGHT_KEYS {
            let mut weights = WeightConfig::default();
            weights.remove(key);
            assert_eq!(
                weights.resolve(),
                Err(UniquenessError::MissingWeight(key.to_string()))
            );
        }
    }

    #[test]
    fn test_sum_must_be_one() {
        let mut low = WeightConfig::default();
        low.set(POPULARITY, 0.2);
        assert!(matches!(low.resolve(), Err(UniquenessError::InvalidWeightSum(s)) if (s - 0.9).abs() < 1e-12));

        let mut high = WeightConfig::default();
        high.set(POPULARITY, 0.4);
        assert!(matches!(high.resolve(), Err(UniquenessError::InvalidWeightSum(s)) if (s - 1.1).abs() < 1e-12));
    }

    #[test]
    fn test_negative_and_nan_weights_rejected() {
        let mut negative = WeightConfig::default();
        negative.set(ERA_DIVERSITY, -0.1);
        assert!(matches!(
            negative.resolve(),
            Err(UniquenessError::InvalidWeight { ref key, .. }) if key == ERA_DIVERSITY
        ));

        let mut nan = WeightConfig::default();
        nan.set(TEMPORAL_DIVERSITY, f64::NAN);
        assert!(matches!(nan.resolve(), Err(UniquenessError::InvalidWeight { .. })));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut weights = WeightConfig::default();
        weights.set("loudness_bonus", 5.0);
        assert!(weights.resolve().is_ok());
    }

    #[test]
    fn test_deserializes_from_toml_table() {
        let weights: WeightConfig = toml::from_str(
            r#"
            popularity = 0.5
            artist_diversity = 0.1
            musical_diversity = 0.1
            genre_diversity = 0.1
            temporal_diversity = 0.1
            era_diversity = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(weights.get(POPULARITY), Some(0.5));
        assert!(weights.resolve().is_ok());
    }
}
