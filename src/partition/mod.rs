//! Splitting joined samples into the two cohorts being compared.

use crate::data::JoinedDataset;
use crate::error::{AssocError, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Which metadata column defines the cohorts, and which two values to compare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    /// Categorical metadata column.
    pub column: String,
    /// Baseline group value.
    pub group1: String,
    /// Group compared against the baseline.
    pub group2: String,
}

impl Default for GroupSpec {
    fn default() -> Self {
        Self {
            column: "Severity".to_string(),
            group1: "Mild".to_string(),
            group2: "Severe".to_string(),
        }
    }
}

impl GroupSpec {
    /// Create a group specification.
    pub fn new(column: &str, group1: &str, group2: &str) -> Self {
        Self {
            column: column.to_string(),
            group1: group1.to_string(),
            group2: group2.to_string(),
        }
    }

    /// The same contrast with baseline and comparison exchanged.
    pub fn swapped(&self) -> Self {
        Self::new(&self.column, &self.group2, &self.group1)
    }

    /// Reject specifications that cannot produce two disjoint cohorts.
    pub fn validate(&self) -> Result<()> {
        if self.column.trim().is_empty() {
            return Err(AssocError::InvalidParameter(
                "Group column must not be empty".to_string(),
            ));
        }
        if self.group1.trim() == self.group2.trim() {
            return Err(AssocError::IdenticalGroups(self.group1.clone()));
        }
        Ok(())
    }
}

/// Row indices of the two cohorts, each in joined-dataset order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAssignment {
    /// Rows whose group value equals `group1`.
    pub group1: Vec<usize>,
    /// Rows whose group value equals `group2`.
    pub group2: Vec<usize>,
    /// Rows matching neither value.
    pub n_excluded: usize,
}

impl GroupAssignment {
    /// All assigned rows, group 1 first.
    pub fn assigned(&self) -> Vec<usize> {
        self.group1.iter().chain(&self.group2).copied().collect()
    }

    /// Number of assigned rows.
    pub fn n_assigned(&self) -> usize {
        self.group1.len() + self.group2.len()
    }

    /// Exchange the two cohorts.
    pub fn swapped(&self) -> Self {
        Self {
            group1: self.group2.clone(),
            group2: self.group1.clone(),
            n_excluded: self.n_excluded,
        }
    }
}

/// Partition joined rows into two cohorts.
///
/// Rows whose group value matches neither target are excluded silently. The
/// partition is stable: each cohort keeps the joined-dataset row order.
///
/// # Errors
/// `IdenticalGroups` if both targets are equal, `EmptyCohort` if either target
/// matches zero rows.
pub fn partition_groups(dataset: &JoinedDataset, spec: &GroupSpec) -> Result<GroupAssignment> {
    spec.validate()?;

    let mut group1 = Vec::new();
    let mut group2 = Vec::new();
    let mut n_excluded = 0;

    for (idx, row) in dataset.rows().iter().enumerate() {
        let value = row.field(&spec.column);
        if value.matches_literal(&spec.group1) {
            group1.push(idx);
        } else if value.matches_literal(&spec.group2) {
            group2.push(idx);
        } else {
            n_excluded += 1;
        }
    }

    for (rows, value) in [(&group1, &spec.group1), (&group2, &spec.group2)] {
        if rows.is_empty() {
            return Err(AssocError::EmptyCohort {
                column: spec.column.clone(),
                value: value.clone(),
            });
        }
    }

    debug!(
        "Cohorts: {}={}, {}={}, excluded={}",
        spec.group1,
        group1.len(),
        spec.group2,
        group2.len(),
        n_excluded
    );

    Ok(GroupAssignment {
        group1,
        group2,
        n_excluded,
    })
}
