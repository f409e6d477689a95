//! Mean-abundance filtering of features.

use crate::compare::mean;
use crate::data::JoinedDataset;
use crate::error::{AssocError, Result};
use rayon::prelude::*;

/// Overall mean abundance of a feature across the given rows.
///
/// Missing cells are skipped. Returns NaN when no row has a defined value.
pub fn overall_mean(dataset: &JoinedDataset, feature_idx: usize, rows: &[usize]) -> f64 {
    mean(&dataset.defined_values(feature_idx, rows))
}

/// Keep features whose overall mean abundance is at least `min_mean`.
///
/// # Arguments
/// * `dataset` - Joined samples
/// * `rows` - Rows to average over (every joined sample in a run)
/// * `min_mean` - Minimum mean abundance
///
/// # Returns
/// Indices of the retained features, in feature order.
pub fn filter_mean_abundance(
    dataset: &JoinedDataset,
    rows: &[usize],
    min_mean: f64,
) -> Result<Vec<usize>> {
    if !min_mean.is_finite() || min_mean < 0.0 {
        return Err(AssocError::InvalidParameter(
            "min_mean must be a non-negative number".to_string(),
        ));
    }

    let keep: Vec<usize> = (0..dataset.n_features())
        .into_par_iter()
        .filter(|&feature| overall_mean(dataset, feature, rows) >= min_mean)
        .collect();

    Ok(keep)
}
