//! Microbiome two-group association library
//!
//! Joins a per-sample feature abundance table with clinical metadata, splits
//! samples into two cohorts on a metadata column, and tests every feature for
//! a difference between the cohorts.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **io**: Delimited table loading
//! - **data**: Abundance and metadata tables, joined samples, result records
//! - **align**: SampleID intersection of the two tables
//! - **partition**: Two-cohort split on a metadata column
//! - **filter**: Feature screening (mean abundance, prevalence)
//! - **zero**: Pseudocount and log2 fold change
//! - **test**: Mann-Whitney U test
//! - **compare**: Per-feature means, fold change and p-value
//! - **correct**: Multiple testing correction (Benjamini-Hochberg)
//! - **rank**: Deterministic ordering and label selection
//! - **plot**: Volcano plot and boxplots
//! - **pipeline**: Configuration, orchestration and output writing
//!
//! # Example
//!
//! ```no_run
//! use microbiome_assoc::prelude::*;
//!
//! let config = AnalysisConfig::new()
//!     .group("Severity", "Mild", "Severe")
//!     .labels(LabelPolicy::Top { n: 10 });
//!
//! let outcome = run_from_paths("abundance.csv", "metadata.csv", "results", &config).unwrap();
//! println!("{}", outcome);
//! ```

pub mod align;
pub mod compare;
pub mod correct;
pub mod data;
pub mod error;
pub mod filter;
pub mod io;
pub mod partition;
pub mod pipeline;
pub mod plot;
pub mod rank;
pub mod test;
pub mod zero;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::align::{align_samples, AlignmentReport};
    pub use crate::compare::{compare_feature, compare_features};
    pub use crate::correct::{apply_bh, correct_bh, BhCorrected};
    pub use crate::data::{
        AbundanceTable, FeatureStat, JoinedDataset, JoinedRow, MetadataTable, ResultSummary,
        ResultTable, Variable, VariableType,
    };
    pub use crate::error::{AssocError, ErrorKind, Result};
    pub use crate::filter::{filter_features, FeatureFilter, FilterReport};
    pub use crate::io::{parse_delimiter, RawTable};
    pub use crate::partition::{partition_groups, GroupAssignment, GroupSpec};
    pub use crate::pipeline::{
        load_inputs, run_analysis, run_from_paths, write_outputs, AnalysisConfig,
        AnalysisOutcome, OutputFiles, RunReport,
    };
    pub use crate::plot::{boxplot, volcano_plot, VolcanoGuides};
    pub use crate::rank::{rank_features, select_labels, LabelPolicy, SignificanceMetric};
    pub use crate::test::{mann_whitney_u, MannWhitneyResult};
    pub use crate::zero::{log2_fold_change, DEFAULT_PSEUDOCOUNT};
}
