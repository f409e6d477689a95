//! Benjamini-Hochberg false discovery rate correction.

use crate::data::FeatureStat;
use serde::{Deserialize, Serialize};

/// Result of BH correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BhCorrected {
    /// Feature IDs in original order.
    pub feature_ids: Vec<String>,
    /// Original p-values.
    pub p_values: Vec<f64>,
    /// Adjusted p-values (q-values), NaN where the p-value is undefined.
    pub q_values: Vec<f64>,
    /// Number of defined p-values entering the correction.
    pub n_tests: usize,
}

/// Apply Benjamini-Hochberg FDR correction.
///
/// With m defined p-values sorted ascending, the q-value at rank i is
/// `min over k >= i of p[k] * m / k`, clipped to [0, 1]. Undefined (NaN)
/// p-values are left out of m and receive a NaN q-value. Equal p-values get
/// equal q-values.
///
/// # Arguments
/// * `p_values` - Raw p-values
/// * `feature_ids` - Feature identifiers (same order as p_values)
///
/// # Returns
/// BhCorrected containing q-values in input order.
pub fn correct_bh(p_values: &[f64], feature_ids: &[String]) -> BhCorrected {
    let mut q_values = vec![f64::NAN; p_values.len()];

    let mut indices: Vec<usize> = (0..p_values.len())
        .filter(|&i| !p_values[i].is_nan())
        .collect();
    let m = indices.len();

    if m > 0 {
        indices.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

        let m_f64 = m as f64;
        let mut running = f64::INFINITY;
        // Work backwards from the largest p-value
        for rank in (1..=m).rev() {
            let idx = indices[rank - 1];
            let adjusted = p_values[idx] * m_f64 / rank as f64;
            running = running.min(adjusted);
            q_values[idx] = running.clamp(0.0, 1.0);
        }
    }

    BhCorrected {
        feature_ids: feature_ids.to_vec(),
        p_values: p_values.to_vec(),
        q_values,
        n_tests: m,
    }
}

/// Fill `q_value` on every record from its `p_value`.
pub fn apply_bh(records: &mut [FeatureStat]) -> BhCorrected {
    let p_values: Vec<f64> = records.iter().map(|r| r.p_value).collect();
    let feature_ids: Vec<String> = records.iter().map(|r| r.feature.clone()).collect();
    let corrected = correct_bh(&p_values, &feature_ids);
    for (record, &q) in records.iter_mut().zip(&corrected.q_values) {
        record.q_value = q;
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("feat_{}", i)).collect()
    }

    #[test]
    fn test_bh_basic() {
        let p_values = vec![0.01, 0.04, 0.03, 0.005];
        let corrected = correct_bh(&p_values, &ids(4));

        assert_eq!(corrected.n_tests, 4);
        assert_eq!(corrected.p_values, p_values);
    }

    #[test]
    fn test_bh_ordering() {
        let p_values = vec![0.04, 0.01, 0.03, 0.005];
        let corrected = correct_bh(&p_values, &ids(4));

        // 0.005 * 4 / 1 = 0.02
        assert_relative_eq!(corrected.q_values[3], 0.02, epsilon = 1e-10);
        // min(0.01 * 4 / 2, 0.04) = 0.02
        assert_relative_eq!(corrected.q_values[1], 0.02, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[0], 0.04, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_monotonicity() {
        let p_values = vec![0.5, 0.001, 0.1, 0.02, 0.05, 0.01];
        let corrected = correct_bh(&p_values, &ids(6));

        let mut order: Vec<usize> = (0..6).collect();
        order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
        for w in order.windows(2) {
            assert!(corrected.q_values[w[0]] <= corrected.q_values[w[1]]);
        }
        for (p, q) in p_values.iter().zip(&corrected.q_values) {
            assert!(q >= p);
        }
    }

    #[test]
    fn test_bh_bounded() {
        let p_values = vec![0.5, 0.6, 0.7, 0.8, 0.9];
        let corrected = correct_bh(&p_values, &ids(5));

        for q in &corrected.q_values {
            assert!(*q <= 1.0);
        }
    }

    #[test]
    fn test_bh_empty() {
        let corrected = correct_bh(&[], &[]);
        assert_eq!(corrected.n_tests, 0);
        assert!(corrected.q_values.is_empty());
    }

    #[test]
    fn test_bh_single() {
        let corrected = correct_bh(&[0.05], &ids(1));

        assert_eq!(corrected.n_tests, 1);
        assert_relative_eq!(corrected.q_values[0], 0.05, epsilon = 1e-10);
    }

    #[test]
    fn test_bh_known_values() {
        let p_values = vec![0.005, 0.01, 0.02, 0.04, 0.1];
        let corrected = correct_bh(&p_values, &ids(5));

        // 0.025, 0.025, 0.0333, 0.05, 0.1
        assert_relative_eq!(corrected.q_values[0], 0.025, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[1], 0.025, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[2], 1.0 / 30.0, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[3], 0.05, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[4], 0.1, epsilon = 1e-10);
    }

    #[test]
    fn test_nan_passes_through() {
        let p_values = vec![0.01, f64::NAN, 0.04, f64::NAN];
        let corrected = correct_bh(&p_values, &ids(4));

        // only two defined p-values count toward m
        assert_eq!(corrected.n_tests, 2);
        assert!(corrected.q_values[1].is_nan());
        assert!(corrected.q_values[3].is_nan());
        assert_relative_eq!(corrected.q_values[0], 0.02, epsilon = 1e-10);
        assert_relative_eq!(corrected.q_values[2], 0.04, epsilon = 1e-10);
    }

    #[test]
    fn test_all_nan() {
        let corrected = correct_bh(&[f64::NAN, f64::NAN], &ids(2));
        assert_eq!(corrected.n_tests, 0);
        assert!(corrected.q_values.iter().all(|q| q.is_nan()));
    }

    #[test]
    fn test_ties_share_q() {
        let p_values = vec![0.03, 0.03, 0.03];
        let corrected = correct_bh(&p_values, &ids(3));
        for q in &corrected.q_values {
            assert_relative_eq!(*q, 0.03, epsilon = 1e-12);
        }
    }
}
