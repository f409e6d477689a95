//! Clinical metadata keyed by sample identifier.

use crate::error::{AssocError, Result};
use crate::io::{is_missing_token, RawTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// A metadata value that can be categorical or continuous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    /// Compare against a literal given on the command line or in a config.
    ///
    /// Numeric columns match when the literal parses to the same number, so
    /// a group value of `1` selects rows stored as `1.0`.
    pub fn matches_literal(&self, literal: &str) -> bool {
        let literal = literal.trim();
        match self {
            Variable::Categorical(s) => s == literal,
            Variable::Continuous(v) => literal.parse::<f64>().map_or(false, |l| l == *v),
            Variable::Missing => false,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Categorical(s) => write!(f, "{}", s),
            Variable::Continuous(v) => write!(f, "{}", v),
            Variable::Missing => write!(f, "NA"),
        }
    }
}

/// Type hint for metadata columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

/// Sample metadata: one row of clinical fields per sample.
#[derive(Debug, Clone)]
pub struct MetadataTable {
    /// Sample IDs in file order.
    sample_ids: Vec<String>,
    /// Column names, excluding the sample ID column.
    column_names: Vec<String>,
    /// Data stored as sample_id -> column_name -> Variable.
    data: HashMap<String, HashMap<String, Variable>>,
}

impl MetadataTable {
    /// Build metadata from a raw delimited table.
    ///
    /// Columns are inferred as continuous if every non-missing value parses as
    /// a number, otherwise categorical.
    pub fn from_raw(raw: &RawTable, id_column: &str) -> Result<Self> {
        let id_idx = raw
            .column_index(id_column)
            .ok_or_else(|| AssocError::MissingColumn {
                table: "Metadata".to_string(),
                column: id_column.to_string(),
            })?;

        let value_cols: Vec<usize> = (0..raw.header.len()).filter(|&c| c != id_idx).collect();
        let column_names: Vec<String> =
            value_cols.iter().map(|&c| raw.header[c].clone()).collect();

        if raw.records.is_empty() {
            return Err(AssocError::EmptyData("No samples in metadata".to_string()));
        }

        let mut column_types = HashMap::new();
        for (&col_idx, col_name) in value_cols.iter().zip(&column_names) {
            let all_numeric = raw.records.iter().all(|record| {
                let v = record[col_idx].as_str();
                is_missing_token(v) || v.parse::<f64>().is_ok()
            });
            let var_type = if all_numeric {
                VariableType::Continuous
            } else {
                VariableType::Categorical
            };
            column_types.insert(col_name.clone(), var_type);
        }

        let mut sample_ids = Vec::with_capacity(raw.n_rows());
        let mut data = HashMap::with_capacity(raw.n_rows());

        for record in &raw.records {
            let sample_id = record[id_idx].clone();
            if sample_id.is_empty() {
                return Err(AssocError::EmptyData(
                    "Metadata table has a row without SampleID".to_string(),
                ));
            }

            let mut sample_data = HashMap::with_capacity(column_names.len());
            for (&col_idx, col_name) in value_cols.iter().zip(&column_names) {
                let raw_value = record[col_idx].as_str();
                let var = if is_missing_token(raw_value) {
                    Variable::Missing
                } else {
                    match column_types.get(col_name) {
                        Some(VariableType::Continuous) => raw_value
                            .parse::<f64>()
                            .map(Variable::Continuous)
                            .unwrap_or(Variable::Missing),
                        Some(VariableType::Categorical) | None => {
                            Variable::Categorical(raw_value.to_string())
                        }
                    }
                };
                sample_data.insert(col_name.clone(), var);
            }

            if data.insert(sample_id.clone(), sample_data).is_some() {
                return Err(AssocError::DuplicateSample {
                    table: "Metadata".to_string(),
                    sample: sample_id,
                });
            }
            sample_ids.push(sample_id);
        }

        Ok(Self {
            sample_ids,
            column_names,
            data,
        })
    }

    /// Load metadata from a delimited file.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: u8, id_column: &str) -> Result<Self> {
        let raw = RawTable::from_path(path, delimiter)?;
        Self::from_raw(&raw, id_column)
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Get a variable value for a specific sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        self.data.get(sample_id).and_then(|m| m.get(column))
    }

    /// All fields of one sample.
    pub fn row(&self, sample_id: &str) -> Option<&HashMap<String, Variable>> {
        self.data.get(sample_id)
    }

    /// Check if a sample exists.
    pub fn has_sample(&self, sample_id: &str) -> bool {
        self.data.contains_key(sample_id)
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}
