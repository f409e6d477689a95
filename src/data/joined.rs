//! Abundance and metadata joined on SampleID.

use super::metadata::Variable;
use crate::error::{AssocError, Result};
use std::collections::{HashMap, HashSet};

/// One sample present in both input tables.
#[derive(Debug, Clone)]
pub struct JoinedRow {
    /// Sample identifier.
    pub sample_id: String,
    /// Abundance per feature, indexed like `JoinedDataset::feature_names`.
    pub abundances: Vec<Option<f64>>,
    /// Clinical fields of the sample.
    pub metadata: HashMap<String, Variable>,
}

impl JoinedRow {
    /// Metadata value of a column, `Missing` when absent.
    pub fn field(&self, column: &str) -> &Variable {
        self.metadata.get(column).unwrap_or(&Variable::Missing)
    }
}

/// Rows restricted to the SampleIDs shared by both tables.
#[derive(Debug, Clone)]
pub struct JoinedDataset {
    feature_names: Vec<String>,
    rows: Vec<JoinedRow>,
}

impl JoinedDataset {
    /// Create a dataset, checking row shape and SampleID uniqueness.
    pub fn new(feature_names: Vec<String>, rows: Vec<JoinedRow>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if row.abundances.len() != feature_names.len() {
                return Err(AssocError::InvalidParameter(format!(
                    "Sample '{}' has {} abundances, expected {}",
                    row.sample_id,
                    row.abundances.len(),
                    feature_names.len()
                )));
            }
            if !seen.insert(row.sample_id.as_str()) {
                return Err(AssocError::DuplicateSample {
                    table: "Joined".to_string(),
                    sample: row.sample_id.clone(),
                });
            }
        }
        Ok(Self {
            feature_names,
            rows,
        })
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Feature names in abundance-table order.
    #[inline]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Rows in join order.
    #[inline]
    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    /// Sample identifiers in join order.
    pub fn sample_ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.sample_id.as_str()).collect()
    }

    /// Values of one feature for the given rows.
    pub fn feature_values(&self, feature_idx: usize, row_indices: &[usize]) -> Vec<Option<f64>> {
        row_indices
            .iter()
            .map(|&i| self.rows[i].abundances[feature_idx])
            .collect()
    }

    /// Defined (non-missing) values of one feature for the given rows.
    pub fn defined_values(&self, feature_idx: usize, row_indices: &[usize]) -> Vec<f64> {
        row_indices
            .iter()
            .filter_map(|&i| self.rows[i].abundances[feature_idx])
            .collect()
    }
}
