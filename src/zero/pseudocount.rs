//! Pseudocount handling for fold-change computation.

use crate::error::{AssocError, Result};

/// Default pseudocount: small enough not to distort non-zero means.
pub const DEFAULT_PSEUDOCOUNT: f64 = 1e-9;

/// Check that a pseudocount is usable.
pub fn validate_pseudocount(pseudocount: f64) -> Result<()> {
    if !pseudocount.is_finite() || pseudocount <= 0.0 {
        return Err(AssocError::InvalidParameter(
            "Pseudocount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// log2((mean2 + pc) / (mean1 + pc)).
///
/// Two zero means give exactly 0. NaN propagates when either mean is undefined.
#[inline]
pub fn log2_fold_change(mean1: f64, mean2: f64, pseudocount: f64) -> f64 {
    ((mean2 + pseudocount) / (mean1 + pseudocount)).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log2_fold_change() {
        assert_relative_eq!(log2_fold_change(1.0, 2.0, DEFAULT_PSEUDOCOUNT), 1.0, epsilon = 1e-8);
        assert_relative_eq!(log2_fold_change(4.0, 1.0, DEFAULT_PSEUDOCOUNT), -2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_zero_means_give_zero() {
        assert_eq!(log2_fold_change(0.0, 0.0, DEFAULT_PSEUDOCOUNT), 0.0);
        assert_eq!(log2_fold_change(0.0, 0.0, 0.5), 0.0);
    }

    #[test]
    fn test_one_zero_mean_is_finite() {
        let lfc = log2_fold_change(0.0, 0.25, DEFAULT_PSEUDOCOUNT);
        assert!(lfc.is_finite());
        assert!(lfc > 0.0);
    }

    #[test]
    fn test_symmetry() {
        let a = log2_fold_change(0.29, 0.035, 1e-9);
        let b = log2_fold_change(0.035, 0.29, 1e-9);
        assert_relative_eq!(a, -b, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_propagates() {
        assert!(log2_fold_change(f64::NAN, 1.0, 1e-9).is_nan());
    }

    #[test]
    fn test_invalid_pseudocount() {
        assert!(validate_pseudocount(0.0).is_err());
        assert!(validate_pseudocount(-1.0).is_err());
        assert!(validate_pseudocount(f64::NAN).is_err());
        assert!(validate_pseudocount(0.5).is_ok());
    }
}
