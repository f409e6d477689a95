//! Deterministic ordering of comparison results and label selection.

use crate::data::FeatureStat;
use crate::error::{AssocError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Significance measure used by threshold labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceMetric {
    /// BH-adjusted q-value.
    #[default]
    QValue,
    /// Raw p-value.
    PValue,
}

impl SignificanceMetric {
    fn value(self, stat: &FeatureStat) -> f64 {
        match self {
            SignificanceMetric::QValue => stat.q_value,
            SignificanceMetric::PValue => stat.p_value,
        }
    }

    /// Short name.
    pub fn name(self) -> &'static str {
        match self {
            SignificanceMetric::QValue => "q",
            SignificanceMetric::PValue => "p",
        }
    }
}

/// Which ranked features get labeled on the volcano plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Label nothing.
    None,
    /// Label the first `n` tested features in rank order.
    Top { n: usize },
    /// Label features with `metric <= alpha` and `|log2FC| >= fc_thresh`.
    Threshold {
        metric: SignificanceMetric,
        alpha: f64,
        fc_thresh: f64,
    },
}

impl Default for LabelPolicy {
    fn default() -> Self {
        LabelPolicy::Threshold {
            metric: SignificanceMetric::QValue,
            alpha: 0.10,
            fc_thresh: 1.0,
        }
    }
}

impl LabelPolicy {
    /// Short name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            LabelPolicy::None => "none",
            LabelPolicy::Top { .. } => "top",
            LabelPolicy::Threshold { .. } => "threshold",
        }
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        match *self {
            LabelPolicy::None => Ok(()),
            LabelPolicy::Top { n } => {
                if n == 0 {
                    return Err(AssocError::InvalidParameter(
                        "top_n must be at least 1".to_string(),
                    ));
                }
                Ok(())
            }
            LabelPolicy::Threshold {
                alpha, fc_thresh, ..
            } => {
                if !(0.0..=1.0).contains(&alpha) {
                    return Err(AssocError::InvalidParameter(format!(
                        "Significance threshold must be between 0 and 1, got {}",
                        alpha
                    )));
                }
                if !fc_thresh.is_finite() || fc_thresh < 0.0 {
                    return Err(AssocError::InvalidParameter(format!(
                        "Fold-change threshold must be a non-negative number, got {}",
                        fc_thresh
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Ascending order with NaN after every number.
fn nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// Rank order: q ascending, then p ascending, then |log2FC| descending, then
/// original feature position. Undefined values sort last at every step.
pub fn rank_order(a: &FeatureStat, b: &FeatureStat) -> Ordering {
    nan_last(a.q_value, b.q_value)
        .then_with(|| nan_last(a.p_value, b.p_value))
        .then_with(|| {
            let (fa, fb) = (a.abs_log2_fold_change(), b.abs_log2_fold_change());
            match (fa.is_nan(), fb.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => fb.total_cmp(&fa),
            }
        })
        .then_with(|| a.feature_index.cmp(&b.feature_index))
}

/// Sort records into rank order.
pub fn rank_features(mut records: Vec<FeatureStat>) -> Vec<FeatureStat> {
    records.sort_by(rank_order);
    records
}

/// Positions (into `ranked`) of the records selected for labeling.
///
/// `ranked` must already be in rank order. Records without a defined p-value
/// are never labeled.
pub fn select_labels(ranked: &[FeatureStat], policy: &LabelPolicy) -> Vec<usize> {
    match *policy {
        LabelPolicy::None => Vec::new(),
        LabelPolicy::Top { n } => ranked
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_tested())
            .take(n)
            .map(|(i, _)| i)
            .collect(),
        LabelPolicy::Threshold {
            metric,
            alpha,
            fc_thresh,
        } => ranked
            .iter()
            .enumerate()
            .filter(|(_, r)| metric.value(r) <= alpha && r.abs_log2_fold_change() >= fc_thresh)
            .map(|(i, _)| i)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(idx: usize, p: f64, q: f64, lfc: f64) -> FeatureStat {
        FeatureStat {
            feature: format!("F{}", idx),
            feature_index: idx,
            mean_group1: 1.0,
            mean_group2: 1.0,
            log2_fold_change: lfc,
            u_statistic: 0.0,
            p_value: p,
            q_value: q,
            n_group1: 3,
            n_group2: 3,
        }
    }

    fn ten_features() -> Vec<FeatureStat> {
        vec![
            stat(0, 0.20, 0.40, 0.5),
            stat(1, 0.01, 0.05, 1.0),
            stat(2, 0.01, 0.05, -2.0),
            stat(3, f64::NAN, f64::NAN, 0.3),
            stat(4, 0.005, 0.05, 0.1),
            stat(5, 0.50, 0.60, 3.0),
            stat(6, 0.01, 0.05, 2.0),
            stat(7, 0.90, 0.90, 0.0),
            stat(8, 0.30, 0.45, -1.5),
            stat(9, 0.70, 0.80, 0.2),
        ]
    }

    fn names(records: &[FeatureStat]) -> Vec<&str> {
        records.iter().map(|r| r.feature.as_str()).collect()
    }

    #[test]
    fn test_tie_chain() {
        let ranked = rank_features(ten_features());
        // q ties broken by p, then |log2FC| desc, then original order
        assert_eq!(
            names(&ranked),
            vec!["F4", "F2", "F6", "F1", "F0", "F8", "F5", "F9", "F7", "F3"]
        );
    }

    #[test]
    fn test_top_two_with_ties() {
        let ranked = rank_features(ten_features());
        let labels = select_labels(&ranked, &LabelPolicy::Top { n: 2 });
        let picked: Vec<&str> = labels.iter().map(|&i| ranked[i].feature.as_str()).collect();
        assert_eq!(picked, vec!["F4", "F2"]);
    }

    #[test]
    fn test_ranking_is_input_order_independent() {
        let mut shuffled = ten_features();
        shuffled.reverse();
        shuffled.swap(1, 7);
        assert_eq!(
            names(&rank_features(shuffled)),
            names(&rank_features(ten_features()))
        );
    }

    #[test]
    fn test_top_skips_untested() {
        let ranked = rank_features(ten_features());
        let labels = select_labels(&ranked, &LabelPolicy::Top { n: 20 });
        assert_eq!(labels.len(), 9);
    }

    #[test]
    fn test_threshold_labels() {
        let ranked = rank_features(ten_features());
        let labels = select_labels(&ranked, &LabelPolicy::default());
        let picked: Vec<&str> = labels.iter().map(|&i| ranked[i].feature.as_str()).collect();
        // q <= 0.10 and |log2FC| >= 1.0, inclusive at both bounds
        assert_eq!(picked, vec!["F2", "F6", "F1"]);

        let by_p = LabelPolicy::Threshold {
            metric: SignificanceMetric::PValue,
            alpha: 0.3,
            fc_thresh: 1.5,
        };
        let labels = select_labels(&ranked, &by_p);
        let picked: Vec<&str> = labels.iter().map(|&i| ranked[i].feature.as_str()).collect();
        assert_eq!(picked, vec!["F2", "F6", "F8"]);
    }

    #[test]
    fn test_no_labels() {
        let ranked = rank_features(ten_features());
        assert!(select_labels(&ranked, &LabelPolicy::None).is_empty());
    }

    #[test]
    fn test_policy_validation() {
        assert!(LabelPolicy::Top { n: 0 }.validate().is_err());
        assert!(LabelPolicy::Threshold {
            metric: SignificanceMetric::QValue,
            alpha: 1.5,
            fc_thresh: 1.0
        }
        .validate()
        .is_err());
        assert!(LabelPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_policy_yaml() {
        let yaml = serde_yaml::to_string(&LabelPolicy::Top { n: 5 }).unwrap();
        assert!(yaml.contains("mode: top"));
        let parsed: LabelPolicy = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, LabelPolicy::Top { n: 5 });
    }
}
