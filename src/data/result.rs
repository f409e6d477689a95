//! Per-feature comparison records and the exported results table.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Comparison result for a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStat {
    /// Feature name.
    pub feature: String,
    /// Position of the feature in the abundance table, used as the final tie-break.
    pub feature_index: usize,
    /// Mean abundance in group 1 (NaN when the cohort has no defined values).
    pub mean_group1: f64,
    /// Mean abundance in group 2.
    pub mean_group2: f64,
    /// log2((mean2 + pc) / (mean1 + pc)).
    pub log2_fold_change: f64,
    /// Mann-Whitney U statistic for group 1.
    pub u_statistic: f64,
    /// Two-sided raw p-value, NaN when the test was not run.
    pub p_value: f64,
    /// Benjamini-Hochberg q-value, NaN when the p-value is undefined.
    pub q_value: f64,
    /// Defined values in group 1.
    pub n_group1: usize,
    /// Defined values in group 2.
    pub n_group2: usize,
}

impl FeatureStat {
    /// Whether a p-value could be computed.
    pub fn is_tested(&self) -> bool {
        !self.p_value.is_nan()
    }

    /// Absolute log2 fold change.
    pub fn abs_log2_fold_change(&self) -> f64 {
        self.log2_fold_change.abs()
    }

    /// Check if significant at a q-value threshold.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.q_value <= alpha
    }
}

/// Ranked comparison results for one group contrast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultTable {
    /// Group column the cohorts were drawn from.
    pub group_column: String,
    /// Baseline group label.
    pub group1: String,
    /// Compared group label.
    pub group2: String,
    /// Records in rank order.
    pub records: Vec<FeatureStat>,
}

impl ResultTable {
    /// Create a new result table.
    pub fn new(group_column: &str, group1: &str, group2: &str, records: Vec<FeatureStat>) -> Self {
        Self {
            group_column: group_column.to_string(),
            group1: group1.to_string(),
            group2: group2.to_string(),
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in rank order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureStat> {
        self.records.iter()
    }

    /// Look up one feature.
    pub fn get(&self, feature: &str) -> Option<&FeatureStat> {
        self.records.iter().find(|r| r.feature == feature)
    }

    /// Records with q <= alpha.
    pub fn significant_at(&self, alpha: f64) -> Vec<&FeatureStat> {
        self.records
            .iter()
            .filter(|r| r.is_significant_at(alpha))
            .collect()
    }

    /// Name of the fold change column.
    pub fn log2fc_column(&self) -> String {
        format!("log2FC_({}_vs_{})", self.group2, self.group1)
    }

    /// Column names of the exported table.
    pub fn header(&self) -> Vec<String> {
        vec![
            "feature".to_string(),
            format!("mean_{}", self.group1),
            format!("mean_{}", self.group2),
            self.log2fc_column(),
            "p_value".to_string(),
            "q_value".to_string(),
        ]
    }

    /// Write the table as CSV to any writer. Undefined values are written as `NA`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;
        for r in &self.records {
            wtr.write_record([
                r.feature.clone(),
                format_value(r.mean_group1),
                format_value(r.mean_group2),
                format_value(r.log2_fold_change),
                format_value(r.p_value),
                format_value(r.q_value),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Count tested and significant features.
    pub fn summary(&self) -> ResultSummary {
        let tested = self.records.iter().filter(|r| r.is_tested()).count();
        ResultSummary {
            total: self.len(),
            tested,
            untested: self.len() - tested,
            significant_05: self.significant_at(0.05).len(),
            significant_10: self.significant_at(0.10).len(),
        }
    }
}

/// Summary statistics for a result table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total: usize,
    pub tested: usize,
    pub untested: usize,
    pub significant_05: usize,
    pub significant_10: usize,
}

impl std::fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Features in table:       {}", self.total)?;
        writeln!(f, "Features tested:         {}", self.tested)?;
        writeln!(f, "Insufficient data (NA):  {}", self.untested)?;
        writeln!(f, "Significant at q <= 0.05: {}", self.significant_05)?;
        writeln!(f, "Significant at q <= 0.10: {}", self.significant_10)?;
        Ok(())
    }
}

/// Shortest round-trip representation, `NA` for NaN.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NA".to_string()
    } else {
        value.to_string()
    }
}
