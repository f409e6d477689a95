//! Sample alignment between the abundance and metadata tables.
//!
//! The joined dataset holds the intersection of SampleIDs, in metadata order.
//! Samples present in only one table are reported and logged, not fatal,
//! unless strict alignment is requested.

use crate::data::{AbundanceTable, JoinedDataset, JoinedRow, MetadataTable};
use crate::error::{AssocError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Diagnostics about which samples were matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Samples in the abundance table.
    pub n_abundance: usize,
    /// Samples in the metadata table.
    pub n_metadata: usize,
    /// Samples in the joined dataset.
    pub n_joined: usize,
    /// Sorted SampleIDs found only in the abundance table.
    pub only_in_abundance: Vec<String>,
    /// Sorted SampleIDs found only in the metadata table.
    pub only_in_metadata: Vec<String>,
}

impl AlignmentReport {
    /// True when both tables list exactly the same samples.
    pub fn is_exact(&self) -> bool {
        self.only_in_abundance.is_empty() && self.only_in_metadata.is_empty()
    }

    /// Total number of dropped samples.
    pub fn n_dropped(&self) -> usize {
        self.only_in_abundance.len() + self.only_in_metadata.len()
    }
}

impl std::fmt::Display for AlignmentReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sample Alignment")?;
        writeln!(f, "  Abundance samples: {}", self.n_abundance)?;
        writeln!(f, "  Metadata samples:  {}", self.n_metadata)?;
        writeln!(f, "  Joined samples:    {}", self.n_joined)?;
        if !self.only_in_abundance.is_empty() {
            writeln!(f, "  Only in abundance: {}", self.only_in_abundance.join(", "))?;
        }
        if !self.only_in_metadata.is_empty() {
            writeln!(f, "  Only in metadata:  {}", self.only_in_metadata.join(", "))?;
        }
        Ok(())
    }
}

/// Join abundance and metadata rows on SampleID.
///
/// # Arguments
/// * `abundance` - Feature abundance table
/// * `metadata` - Clinical metadata table
/// * `group_column` - Metadata column the cohorts will be drawn from
/// * `strict` - Fail instead of warning when any sample is unmatched
///
/// # Errors
/// Validation errors when the group column is absent, when no SampleID is
/// shared, or (in strict mode) when any SampleID is unmatched.
pub fn align_samples(
    abundance: &AbundanceTable,
    metadata: &MetadataTable,
    group_column: &str,
    strict: bool,
) -> Result<(JoinedDataset, AlignmentReport)> {
    if !metadata.has_column(group_column) {
        return Err(AssocError::MissingColumn {
            table: "Metadata".to_string(),
            column: group_column.to_string(),
        });
    }

    let mut only_in_abundance: Vec<String> = abundance
        .sample_ids()
        .iter()
        .filter(|sid| !metadata.has_sample(sid))
        .cloned()
        .collect();
    only_in_abundance.sort();

    let mut rows = Vec::new();
    let mut only_in_metadata = Vec::new();
    for sample_id in metadata.sample_ids() {
        match (abundance.row_for(sample_id), metadata.row(sample_id)) {
            (Some(values), Some(fields)) => rows.push(JoinedRow {
                sample_id: sample_id.clone(),
                abundances: values.to_vec(),
                metadata: fields.clone(),
            }),
            _ => only_in_metadata.push(sample_id.clone()),
        }
    }
    only_in_metadata.sort();

    let report = AlignmentReport {
        n_abundance: abundance.n_samples(),
        n_metadata: metadata.n_samples(),
        n_joined: rows.len(),
        only_in_abundance,
        only_in_metadata,
    };

    if !report.is_exact() {
        if strict {
            return Err(AssocError::SampleMismatch(format!(
                "{} sample(s) only in abundance [{}], {} only in metadata [{}]",
                report.only_in_abundance.len(),
                report.only_in_abundance.join(", "),
                report.only_in_metadata.len(),
                report.only_in_metadata.join(", ")
            )));
        }
        if !report.only_in_abundance.is_empty() {
            warn!(
                "Dropping {} sample(s) present in abundance but missing in metadata: {}",
                report.only_in_abundance.len(),
                report.only_in_abundance.join(", ")
            );
        }
        if !report.only_in_metadata.is_empty() {
            warn!(
                "Dropping {} sample(s) present in metadata but missing in abundance: {}",
                report.only_in_metadata.len(),
                report.only_in_metadata.join(", ")
            );
        }
    }

    if rows.is_empty() {
        return Err(AssocError::EmptyIntersection);
    }

    debug!(
        "Aligned {} of {} abundance / {} metadata samples",
        report.n_joined, report.n_abundance, report.n_metadata
    );

    let joined = JoinedDataset::new(abundance.feature_names().to_vec(), rows)?;
    Ok((joined, report))
}
