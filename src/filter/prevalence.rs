//! Prevalence-based filtering of features.

use crate::data::JoinedDataset;
use crate::error::{AssocError, Result};
use rayon::prelude::*;

/// Fraction of rows in which a feature exceeds `epsilon`.
///
/// Missing cells count as absent.
pub fn prevalence(dataset: &JoinedDataset, feature_idx: usize, rows: &[usize], epsilon: f64) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let present = count_present(dataset, feature_idx, rows, epsilon);
    present as f64 / rows.len() as f64
}

fn count_present(dataset: &JoinedDataset, feature_idx: usize, rows: &[usize], epsilon: f64) -> usize {
    dataset
        .feature_values(feature_idx, rows)
        .into_iter()
        .filter(|v| v.map_or(false, |x| x > epsilon))
        .count()
}

/// Keep features present (value > `epsilon`) in at least `fraction` of rows.
///
/// # Arguments
/// * `dataset` - Joined samples
/// * `rows` - Rows to evaluate (every joined sample in a run)
/// * `fraction` - Minimum prevalence (0.0 to 1.0)
/// * `epsilon` - Presence threshold
///
/// # Returns
/// Indices of the retained features, in feature order.
pub fn filter_prevalence(
    dataset: &JoinedDataset,
    rows: &[usize],
    fraction: f64,
    epsilon: f64,
) -> Result<Vec<usize>> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(AssocError::InvalidParameter(
            "Prevalence threshold must be between 0 and 1".to_string(),
        ));
    }
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(AssocError::InvalidParameter(
            "Presence epsilon must be a non-negative number".to_string(),
        ));
    }

    // Compare the ratio itself: `fraction * n` can round above an exact count.
    let keep: Vec<usize> = (0..dataset.n_features())
        .into_par_iter()
        .filter(|&feature| prevalence(dataset, feature, rows, epsilon) >= fraction)
        .collect();

    Ok(keep)
}
