//! Analysis configuration, loadable from YAML.

use crate::error::{AssocError, Result};
use crate::filter::FeatureFilter;
use crate::io::parse_delimiter;
use crate::partition::GroupSpec;
use crate::plot::VolcanoGuides;
use crate::rank::LabelPolicy;
use crate::zero::{validate_pseudocount, DEFAULT_PSEUDOCOUNT};
use serde::{Deserialize, Serialize};

/// Everything one association run needs besides the two input tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Field delimiter of both input files (`,`, `\t`, `tab`, or any single character).
    pub delimiter: String,
    /// Name of the sample identifier column in both tables.
    pub sample_id_column: String,
    /// Group column and the two values being compared.
    pub group: GroupSpec,
    /// Feature screening before testing.
    pub filter: FeatureFilter,
    /// Added to both means before the fold-change ratio.
    pub pseudocount: f64,
    /// Which features get labeled on the volcano plot.
    pub labels: LabelPolicy,
    /// Volcano guide lines.
    pub volcano: VolcanoGuides,
    /// Number of top-ranked features that get a boxplot.
    pub boxplot_top_n: usize,
    /// Refuse to run when the two tables do not share exactly the same samples.
    pub strict_samples: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            sample_id_column: "SampleID".to_string(),
            group: GroupSpec::default(),
            filter: FeatureFilter::None,
            pseudocount: DEFAULT_PSEUDOCOUNT,
            labels: LabelPolicy::default(),
            volcano: VolcanoGuides::default(),
            boxplot_top_n: 3,
            strict_samples: false,
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(AssocError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(AssocError::from)
    }

    /// Set the group column and the two compared values.
    pub fn group(mut self, column: &str, group1: &str, group2: &str) -> Self {
        self.group = GroupSpec::new(column, group1, group2);
        self
    }

    /// Set the feature filter.
    pub fn filter(mut self, filter: FeatureFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the label policy.
    pub fn labels(mut self, labels: LabelPolicy) -> Self {
        self.labels = labels;
        self
    }

    /// Set the pseudocount.
    pub fn pseudocount(mut self, value: f64) -> Self {
        self.pseudocount = value;
        self
    }

    /// Set the field delimiter.
    pub fn delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    /// Require identical sample sets.
    pub fn strict_samples(mut self, strict: bool) -> Self {
        self.strict_samples = strict;
        self
    }

    /// Delimiter as a byte.
    pub fn delimiter_byte(&self) -> Result<u8> {
        parse_delimiter(&self.delimiter)
    }

    /// Reject out-of-range settings before any data is read.
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        if self.sample_id_column.trim().is_empty() {
            return Err(AssocError::InvalidParameter(
                "Sample ID column must not be empty".to_string(),
            ));
        }
        self.group.validate()?;
        validate_pseudocount(self.pseudocount)?;
        self.labels.validate()?;
        self.volcano.validate()?;

        match self.filter {
            FeatureFilter::None => {}
            FeatureFilter::MinMean { threshold } => {
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(AssocError::InvalidParameter(format!(
                        "Mean abundance threshold must be a non-negative number, got {}",
                        threshold
                    )));
                }
            }
            FeatureFilter::MinPrevalence { fraction, epsilon } => {
                if !(0.0..=1.0).contains(&fraction) {
                    return Err(AssocError::InvalidParameter(format!(
                        "Prevalence threshold must be between 0 and 1, got {}",
                        fraction
                    )));
                }
                if !epsilon.is_finite() || epsilon < 0.0 {
                    return Err(AssocError::InvalidParameter(format!(
                        "Presence epsilon must be a non-negative number, got {}",
                        epsilon
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::SignificanceMetric;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.group.column, "Severity");
        assert_eq!(config.group.group1, "Mild");
        assert_eq!(config.group.group2, "Severe");
        assert_eq!(config.sample_id_column, "SampleID");
        assert_eq!(config.pseudocount, 1e-9);
        assert_eq!(config.boxplot_top_n, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = AnalysisConfig::new()
            .group("Status", "Healthy", "IBD")
            .delimiter("\\t")
            .filter(FeatureFilter::MinMean { threshold: 0.001 })
            .labels(LabelPolicy::Top { n: 5 });

        let yaml = config.to_yaml().unwrap();
        let parsed = AnalysisConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.delimiter_byte().unwrap(), b'\t');
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
group:
  column: Status
labels:
  mode: threshold
  metric: p_value
  alpha: 0.05
  fc_thresh: 0.5
"#;
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.group.column, "Status");
        assert_eq!(config.group.group1, "Mild");
        assert_eq!(
            config.labels,
            LabelPolicy::Threshold {
                metric: SignificanceMetric::PValue,
                alpha: 0.05,
                fc_thresh: 0.5
            }
        );
        assert_eq!(config.pseudocount, 1e-9);
    }

    #[test]
    fn test_validation_errors() {
        assert!(AnalysisConfig::new().pseudocount(0.0).validate().is_err());
        assert!(AnalysisConfig::new().delimiter(";;").validate().is_err());

        let err = AnalysisConfig::new()
            .group("Severity", "Mild", "Mild")
            .validate()
            .unwrap_err();
        assert!(matches!(err, AssocError::IdenticalGroups(_)));

        let bad_filter = AnalysisConfig::new().filter(FeatureFilter::MinPrevalence {
            fraction: 2.0,
            epsilon: 0.0,
        });
        assert!(bad_filter.validate().is_err());
    }
}
