//! Statistical diversity of a numeric sample
//!
//! Blends three normalised measures into one score in [0, 1]:
//! - Shannon entropy over distinct values, divided by its maximum `log2(k)`
//! - Simpson diversity `1 - Σ p²`
//! - Coefficient of variation `σ / |μ|`, capped at 1

/// Diversity score of `values` in [0, 1]
///
/// Empty input scores exactly 0. Distinct values are compared with `==`, so `0.0` and `-0.0`
/// count as the same value. Non-finite input is not meaningful and yields NaN.
pub fn dataset_uniqueness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len() as f64;
    let probabilities: Vec<f64> = distinct_counts(values)
        .into_iter()
        .map(|count| count as f64 / n)
        .collect();

    let shannon = normalized_shannon(&probabilities);
    let simpson = 1.0 - probabilities.iter().map(|p| p * p).sum::<f64>();
    let cv = coefficient_of_variation(values).min(1.0);

    (shannon + simpson + cv) / 3.0
}

/// Occurrence count of each distinct value, in ascending value order
fn distinct_counts(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut counts: Vec<usize> = Vec::new();
    let mut previous: Option<f64> = None;
    for value in sorted {
        match (previous, counts.last_mut()) {
            (Some(prev), Some(count)) if prev == value => *count += 1,
            _ => counts.push(1),
        }
        previous = Some(value);
    }
    counts
}

/// Shannon entropy (base 2) divided by `log2(k)`; 0 when only one distinct value exists
fn normalized_shannon(probabilities: &[f64]) -> f64 {
    let max_entropy = (probabilities.len() as f64).log2();
    if max_entropy <= 0.0 {
        return 0.0;
    }
    let entropy: f64 = -probabilities
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| p * p.log2())
        .sum::<f64>();
    entropy / max_entropy
}

/// Population standard deviation over absolute mean; 0 when the mean is 0
fn coefficient_of_variation(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean.abs()
}
