//! Per-feature two-group comparison.
//!
//! Every feature maps independently to a `FeatureStat`: cohort means, log2
//! fold change of group 2 over group 1, and a two-sided Mann-Whitney p-value.
//! The loop runs on rayon; `collect` keeps feature order regardless of
//! completion order.

use crate::data::{FeatureStat, JoinedDataset};
use crate::error::Result;
use crate::partition::GroupAssignment;
use crate::test::mann_whitney_u;
use crate::zero::{log2_fold_change, validate_pseudocount};
use rayon::prelude::*;

/// Minimum defined values per cohort for a feature to be tested.
pub const MIN_TEST_SAMPLES: usize = 2;

/// Arithmetic mean, NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compare one feature between the two cohorts.
///
/// Missing cells are dropped per cohort. When either cohort keeps fewer than
/// `MIN_TEST_SAMPLES` values the p-value is NaN; means and fold change are
/// still reported when defined. The q-value is left NaN for the corrector.
pub fn compare_feature(
    dataset: &JoinedDataset,
    assignment: &GroupAssignment,
    feature_idx: usize,
    pseudocount: f64,
) -> FeatureStat {
    let x = dataset.defined_values(feature_idx, &assignment.group1);
    let y = dataset.defined_values(feature_idx, &assignment.group2);

    let mean1 = mean(&x);
    let mean2 = mean(&y);

    let (u_statistic, p_value) = if x.len() >= MIN_TEST_SAMPLES && y.len() >= MIN_TEST_SAMPLES {
        let res = mann_whitney_u(&x, &y);
        (res.u_statistic, res.p_value)
    } else {
        (f64::NAN, f64::NAN)
    };

    FeatureStat {
        feature: dataset.feature_names()[feature_idx].clone(),
        feature_index: feature_idx,
        mean_group1: mean1,
        mean_group2: mean2,
        log2_fold_change: log2_fold_change(mean1, mean2, pseudocount),
        u_statistic,
        p_value,
        q_value: f64::NAN,
        n_group1: x.len(),
        n_group2: y.len(),
    }
}

/// Compare every listed feature, returning records in the order of `features`.
pub fn compare_features(
    dataset: &JoinedDataset,
    assignment: &GroupAssignment,
    features: &[usize],
    pseudocount: f64,
) -> Result<Vec<FeatureStat>> {
    validate_pseudocount(pseudocount)?;

    Ok(features
        .par_iter()
        .map(|&f| compare_feature(dataset, assignment, f, pseudocount))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{JoinedRow, Variable};
    use crate::partition::{partition_groups, GroupSpec};
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    const PC: f64 = 1e-9;

    fn dataset(features: &[&str], groups: &[&str], values: &[Vec<Option<f64>>]) -> JoinedDataset {
        let rows = groups
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (g, v))| {
                let mut metadata = HashMap::new();
                metadata.insert("Severity".to_string(), Variable::Categorical(g.to_string()));
                JoinedRow {
                    sample_id: format!("S{:02}", i + 1),
                    abundances: v.clone(),
                    metadata,
                }
            })
            .collect();
        JoinedDataset::new(features.iter().map(|f| f.to_string()).collect(), rows).unwrap()
    }

    fn bacteroides() -> JoinedDataset {
        dataset(
            &["Bacteroides"],
            &["Mild", "Severe", "Mild", "Severe"],
            &[
                vec![Some(0.30)],
                vec![Some(0.05)],
                vec![Some(0.28)],
                vec![Some(0.02)],
            ],
        )
    }

    #[test]
    fn test_bacteroides_scenario() {
        let ds = bacteroides();
        let assignment = partition_groups(&ds, &GroupSpec::default()).unwrap();
        let stat = compare_feature(&ds, &assignment, 0, PC);

        assert_relative_eq!(stat.mean_group1, 0.29, epsilon = 1e-12);
        assert_relative_eq!(stat.mean_group2, 0.035, epsilon = 1e-12);
        let expected = ((0.035 + PC) / (0.29 + PC)).log2();
        assert_relative_eq!(stat.log2_fold_change, expected, epsilon = 1e-12);
        assert!(stat.log2_fold_change < 0.0);
        assert_relative_eq!(stat.p_value, 1.0 / 3.0, epsilon = 1e-12);
        assert!(stat.q_value.is_nan());
    }

    #[test]
    fn test_swapping_groups() {
        let ds = bacteroides();
        let spec = GroupSpec::default();
        let forward = partition_groups(&ds, &spec).unwrap();
        let backward = partition_groups(&ds, &spec.swapped()).unwrap();

        let a = compare_feature(&ds, &forward, 0, PC);
        let b = compare_feature(&ds, &backward, 0, PC);
        assert_relative_eq!(a.log2_fold_change, -b.log2_fold_change, epsilon = 1e-12);
        assert_eq!(a.p_value, b.p_value);
    }

    #[test]
    fn test_all_zero_feature() {
        let ds = dataset(
            &["Absent"],
            &["Mild", "Severe", "Mild", "Severe"],
            &[vec![Some(0.0)], vec![Some(0.0)], vec![Some(0.0)], vec![Some(0.0)]],
        );
        let assignment = partition_groups(&ds, &GroupSpec::default()).unwrap();
        let stat = compare_feature(&ds, &assignment, 0, PC);

        assert_eq!(stat.log2_fold_change, 0.0);
        assert!(!stat.p_value.is_nan());
        assert_eq!(stat.p_value, 1.0);
    }

    #[test]
    fn test_insufficient_data_gives_nan() {
        let ds = dataset(
            &["A"],
            &["Mild", "Severe", "Mild", "Severe"],
            &[vec![Some(0.1)], vec![Some(0.2)], vec![None], vec![Some(0.3)]],
        );
        let assignment = partition_groups(&ds, &GroupSpec::default()).unwrap();
        let stat = compare_feature(&ds, &assignment, 0, PC);

        assert!(stat.p_value.is_nan());
        assert_eq!(stat.n_group1, 1);
        assert_eq!(stat.n_group2, 2);
        assert_relative_eq!(stat.mean_group1, 0.1, epsilon = 1e-12);
        assert!(stat.log2_fold_change.is_finite());
    }

    #[test]
    fn test_compare_features_keeps_order() {
        let ds = dataset(
            &["A", "B", "C"],
            &["Mild", "Severe", "Mild", "Severe"],
            &[
                vec![Some(1.0), Some(0.0), Some(5.0)],
                vec![Some(2.0), Some(0.0), Some(6.0)],
                vec![Some(1.5), Some(0.1), Some(5.5)],
                vec![Some(2.5), Some(0.0), Some(6.5)],
            ],
        );
        let assignment = partition_groups(&ds, &GroupSpec::default()).unwrap();
        let stats = compare_features(&ds, &assignment, &[2, 0], PC).unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].feature, "C");
        assert_eq!(stats[1].feature, "A");
        assert_eq!(stats[0].feature_index, 2);
    }

    #[test]
    fn test_invalid_pseudocount() {
        let ds = bacteroides();
        let assignment = partition_groups(&ds, &GroupSpec::default()).unwrap();
        assert!(compare_features(&ds, &assignment, &[0], 0.0).is_err());
    }
}
