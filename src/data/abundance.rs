//! Feature abundance table keyed by sample identifier.

use crate::error::{AssocError, Result};
use crate::io::{is_missing_token, RawTable};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Abundance values for every sample, one row per sample.
///
/// Rows are samples, columns are features (taxa or molecules), in file order.
/// Cells are `None` when the source cell was empty or `NA`.
#[derive(Debug, Clone)]
pub struct AbundanceTable {
    /// Sample identifiers (row names).
    sample_ids: Vec<String>,
    /// Feature names (column names), unique and order-preserving.
    feature_names: Vec<String>,
    /// Values in sample-major order: `values[sample][feature]`.
    values: Vec<Vec<Option<f64>>>,
    /// SampleID -> row index.
    index: HashMap<String, usize>,
}

impl AbundanceTable {
    /// Create a table from already parsed values.
    pub fn new(
        sample_ids: Vec<String>,
        feature_names: Vec<String>,
        values: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        if values.len() != sample_ids.len() {
            return Err(AssocError::InvalidParameter(format!(
                "Expected {} rows of values, got {}",
                sample_ids.len(),
                values.len()
            )));
        }
        if feature_names.is_empty() {
            return Err(AssocError::EmptyData(
                "Abundance table has no feature columns".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(AssocError::DuplicateFeature(name.clone()));
            }
        }

        let mut index = HashMap::with_capacity(sample_ids.len());
        for (row, (sample_id, row_values)) in sample_ids.iter().zip(&values).enumerate() {
            if row_values.len() != feature_names.len() {
                return Err(AssocError::InvalidParameter(format!(
                    "Sample '{}' has {} values, expected {}",
                    sample_id,
                    row_values.len(),
                    feature_names.len()
                )));
            }
            for (value, feature) in row_values.iter().zip(&feature_names) {
                if let Some(v) = value {
                    if !v.is_finite() || *v < 0.0 {
                        return Err(AssocError::InvalidAbundance {
                            value: v.to_string(),
                            sample: sample_id.clone(),
                            feature: feature.clone(),
                        });
                    }
                }
            }
            if index.insert(sample_id.clone(), row).is_some() {
                return Err(AssocError::DuplicateSample {
                    table: "Abundance".to_string(),
                    sample: sample_id.clone(),
                });
            }
        }

        Ok(Self {
            sample_ids,
            feature_names,
            values,
            index,
        })
    }

    /// Build the table from a raw delimited table.
    ///
    /// Every column except `id_column` is a feature. A non-numeric cell is a
    /// computation error naming the sample and feature.
    pub fn from_raw(raw: &RawTable, id_column: &str) -> Result<Self> {
        let id_idx = raw
            .column_index(id_column)
            .ok_or_else(|| AssocError::MissingColumn {
                table: "Abundance".to_string(),
                column: id_column.to_string(),
            })?;

        let feature_cols: Vec<usize> = (0..raw.header.len()).filter(|&c| c != id_idx).collect();
        let feature_names: Vec<String> =
            feature_cols.iter().map(|&c| raw.header[c].clone()).collect();

        let mut sample_ids = Vec::with_capacity(raw.n_rows());
        let mut values = Vec::with_capacity(raw.n_rows());

        for record in &raw.records {
            let sample_id = record[id_idx].clone();
            if sample_id.is_empty() {
                return Err(AssocError::EmptyData(
                    "Abundance table has a row without SampleID".to_string(),
                ));
            }
            let row: Vec<Option<f64>> = feature_cols
                .iter()
                .map(|&c| parse_cell(&record[c], &sample_id, &raw.header[c]))
                .collect::<Result<_>>()?;
            sample_ids.push(sample_id);
            values.push(row);
        }

        if sample_ids.is_empty() {
            return Err(AssocError::EmptyData(
                "Abundance table has no samples".to_string(),
            ));
        }

        Self::new(sample_ids, feature_names, values)
    }

    /// Load an abundance table from a delimited file.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8, id_column: &str) -> Result<Self> {
        let raw = RawTable::from_path(path, delimiter)?;
        Self::from_raw(&raw, id_column)
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of features (columns).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Feature names.
    #[inline]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Row index of a sample.
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.index.get(sample_id).copied()
    }

    /// All values of one sample.
    pub fn row(&self, sample_idx: usize) -> &[Option<f64>] {
        &self.values[sample_idx]
    }

    /// All values of one sample, looked up by identifier.
    pub fn row_for(&self, sample_id: &str) -> Option<&[Option<f64>]> {
        self.sample_index(sample_id).map(|i| self.row(i))
    }

    /// Value at (sample, feature).
    #[inline]
    pub fn get(&self, sample_idx: usize, feature_idx: usize) -> Option<f64> {
        self.values[sample_idx][feature_idx]
    }
}

fn parse_cell(cell: &str, sample: &str, feature: &str) -> Result<Option<f64>> {
    if is_missing_token(cell) {
        return Ok(None);
    }
    let invalid = || AssocError::InvalidAbundance {
        value: cell.to_string(),
        sample: sample.to_string(),
        feature: feature.to_string(),
    };
    let value: f64 = cell.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(Some(value))
}
