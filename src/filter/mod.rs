//! Feature filtering ahead of statistical testing.

pub mod abundance;
pub mod prevalence;

pub use abundance::{filter_mean_abundance, overall_mean};
pub use prevalence::{filter_prevalence, prevalence as feature_prevalence};

use crate::data::JoinedDataset;
use crate::error::{AssocError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// How features are screened before testing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FeatureFilter {
    /// Keep every feature.
    #[default]
    None,
    /// Keep features whose overall mean abundance is at least `threshold`.
    MinMean { threshold: f64 },
    /// Keep features above `epsilon` in at least `fraction` of samples.
    MinPrevalence { fraction: f64, epsilon: f64 },
}

impl FeatureFilter {
    /// Short name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            FeatureFilter::None => "none",
            FeatureFilter::MinMean { .. } => "min_mean",
            FeatureFilter::MinPrevalence { .. } => "min_prevalence",
        }
    }
}

/// Outcome of feature filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterReport {
    /// Filter that was applied.
    pub filter: FeatureFilter,
    /// Number of features before filtering.
    pub n_before: usize,
    /// Number of features after filtering.
    pub n_after: usize,
    /// Number of features removed.
    pub n_removed: usize,
    /// Proportion of features retained.
    pub retention_rate: f64,
    /// Indices of retained features, in feature order.
    pub kept: Vec<usize>,
    /// Names of removed features, in feature order.
    pub dropped: Vec<String>,
}

impl std::fmt::Display for FilterReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Feature Filter ({})", self.filter.name())?;
        writeln!(f, "  Before:    {} features", self.n_before)?;
        writeln!(f, "  After:     {} features", self.n_after)?;
        writeln!(f, "  Removed:   {} features", self.n_removed)?;
        writeln!(f, "  Retained:  {:.1}%", self.retention_rate * 100.0)?;
        Ok(())
    }
}

/// Apply a feature filter over the given rows.
///
/// Errors with `EmptyData` when no feature survives.
pub fn filter_features(
    dataset: &JoinedDataset,
    rows: &[usize],
    filter: &FeatureFilter,
) -> Result<FilterReport> {
    let n_before = dataset.n_features();
    let kept = match *filter {
        FeatureFilter::None => (0..n_before).collect(),
        FeatureFilter::MinMean { threshold } => filter_mean_abundance(dataset, rows, threshold)?,
        FeatureFilter::MinPrevalence { fraction, epsilon } => {
            filter_prevalence(dataset, rows, fraction, epsilon)?
        }
    };

    if kept.is_empty() {
        return Err(AssocError::EmptyData(format!(
            "No features pass the {} filter",
            filter.name()
        )));
    }

    let mut keep_mask = vec![false; n_before];
    for &i in &kept {
        keep_mask[i] = true;
    }
    let dropped: Vec<String> = dataset
        .feature_names()
        .iter()
        .zip(&keep_mask)
        .filter(|(_, &keep)| !keep)
        .map(|(name, _)| name.clone())
        .collect();

    let n_after = kept.len();
    if dropped.is_empty() {
        info!("Feature filter ({}): all {} features retained", filter.name(), n_before);
    } else {
        warn!(
            "Feature filter ({}) dropped {} of {} features",
            filter.name(),
            dropped.len(),
            n_before
        );
    }

    Ok(FilterReport {
        filter: *filter,
        n_before,
        n_after,
        n_removed: n_before - n_after,
        retention_rate: n_after as f64 / n_before as f64,
        kept,
        dropped,
    })
}
