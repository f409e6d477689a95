//! Running one association analysis and writing its artifacts.

use super::config::AnalysisConfig;
use crate::align::{align_samples, AlignmentReport};
use crate::compare::compare_features;
use crate::correct::apply_bh;
use crate::data::{AbundanceTable, JoinedDataset, MetadataTable, ResultSummary, ResultTable};
use crate::error::Result;
use crate::filter::{filter_features, FilterReport};
use crate::partition::{partition_groups, GroupAssignment};
use crate::plot::{boxplot, boxplot_file_names, volcano_plot, write_plot};
use crate::rank::{rank_features, select_labels};
use log::{debug, info};
use plotly::Plot;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Results table file name.
pub const RESULTS_FILE: &str = "results_table.csv";
/// Volcano plot file name.
pub const VOLCANO_FILE: &str = "volcano_plot.html";
/// Run report file name.
pub const REPORT_FILE: &str = "run_report.json";

/// Cohort sizes after partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortSizes {
    pub group1: usize,
    pub group2: usize,
    pub excluded: usize,
}

/// Everything produced by a successful analysis, before anything touches disk.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Configuration the run used.
    pub config: AnalysisConfig,
    /// Samples present in both tables.
    pub dataset: JoinedDataset,
    /// Cohort membership.
    pub assignment: GroupAssignment,
    /// Sample matching diagnostics.
    pub alignment: AlignmentReport,
    /// Features kept and dropped by the filter.
    pub filter: FilterReport,
    /// Ranked per-feature results.
    pub results: ResultTable,
    /// Positions into `results.records` selected for volcano labels.
    pub labels: Vec<usize>,
}

impl AnalysisOutcome {
    /// Cohort sizes.
    pub fn cohorts(&self) -> CohortSizes {
        CohortSizes {
            group1: self.assignment.group1.len(),
            group2: self.assignment.group2.len(),
            excluded: self.assignment.n_excluded,
        }
    }

    /// Names of the labeled features, in rank order.
    pub fn labeled_features(&self) -> Vec<&str> {
        self.labels
            .iter()
            .map(|&i| self.results.records[i].feature.as_str())
            .collect()
    }

    /// Names of the features that get a boxplot: the first tested records in rank order.
    pub fn boxplot_features(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.is_tested())
            .take(self.config.boxplot_top_n)
            .map(|r| r.feature.as_str())
            .collect()
    }

    /// Machine-readable run report.
    pub fn report(&self) -> RunReport {
        RunReport {
            config: self.config.clone(),
            alignment: self.alignment.clone(),
            cohorts: self.cohorts(),
            filter: self.filter.clone(),
            summary: self.results.summary(),
            labeled: self.labeled_features().iter().map(|s| s.to_string()).collect(),
            boxplots: self.boxplot_features().iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let group = &self.config.group;
        let cohorts = self.cohorts();
        writeln!(f, "Association: {} ({} vs {})", group.column, group.group2, group.group1)?;
        writeln!(f, "  {}: {} samples", group.group1, cohorts.group1)?;
        writeln!(f, "  {}: {} samples", group.group2, cohorts.group2)?;
        if cohorts.excluded > 0 {
            writeln!(f, "  Excluded (other {} values): {}", group.column, cohorts.excluded)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.alignment)?;
        writeln!(f)?;
        write!(f, "{}", self.filter)?;
        writeln!(f)?;
        write!(f, "{}", self.results.summary())?;
        writeln!(
            f,
            "Labeled on volcano ({}):  {}",
            self.config.labels.name(),
            self.labels.len()
        )?;

        let top: Vec<_> = self.results.iter().filter(|r| r.is_tested()).take(5).collect();
        if !top.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top hits:")?;
            for r in top {
                writeln!(
                    f,
                    "  {}: log2FC={:.3}, p={:.4}, q={:.4}",
                    r.feature, r.log2_fold_change, r.p_value, r.q_value
                )?;
            }
        }
        Ok(())
    }
}

/// Contents of `run_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub config: AnalysisConfig,
    pub alignment: AlignmentReport,
    pub cohorts: CohortSizes,
    pub filter: FilterReport,
    pub summary: ResultSummary,
    pub labeled: Vec<String>,
    pub boxplots: Vec<String>,
}

/// Paths of the files written by `write_outputs`.
#[derive(Debug, Clone, Default)]
pub struct OutputFiles {
    pub results: PathBuf,
    pub volcano: PathBuf,
    pub boxplots: Vec<PathBuf>,
    pub report: PathBuf,
}

/// Run the analysis on loaded tables. Touches no files.
///
/// Stages: align, partition, filter, compare, correct, rank, label. Any
/// validation failure aborts the run with no partial result.
pub fn run_analysis(
    abundance: &AbundanceTable,
    metadata: &MetadataTable,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome> {
    config.validate()?;
    let group = &config.group;

    let (dataset, alignment) =
        align_samples(abundance, metadata, &group.column, config.strict_samples)?;
    info!(
        "Joined {} samples x {} features",
        dataset.n_samples(),
        dataset.n_features()
    );

    let assignment = partition_groups(&dataset, group)?;
    info!(
        "Cohorts: {} {} vs {} {}",
        assignment.group1.len(),
        group.group1,
        assignment.group2.len(),
        group.group2
    );

    let all_rows: Vec<usize> = (0..dataset.n_samples()).collect();
    let filter = filter_features(&dataset, &all_rows, &config.filter)?;

    let mut records = compare_features(&dataset, &assignment, &filter.kept, config.pseudocount)?;
    let corrected = apply_bh(&mut records);
    debug!("BH correction over {} defined p-values", corrected.n_tests);

    let records = rank_features(records);
    let labels = select_labels(&records, &config.labels);
    let results = ResultTable::new(&group.column, &group.group1, &group.group2, records);
    info!(
        "Tested {} features, {} labeled ({})",
        results.len(),
        labels.len(),
        config.labels.name()
    );

    Ok(AnalysisOutcome {
        config: config.clone(),
        dataset,
        assignment,
        alignment,
        filter,
        results,
        labels,
    })
}

/// Load both tables with the configured delimiter and SampleID column.
pub fn load_inputs<P: AsRef<Path>, Q: AsRef<Path>>(
    abundance_path: P,
    metadata_path: Q,
    config: &AnalysisConfig,
) -> Result<(AbundanceTable, MetadataTable)> {
    config.validate()?;
    let delimiter = config.delimiter_byte()?;
    let abundance = AbundanceTable::from_path(abundance_path, delimiter, &config.sample_id_column)?;
    let metadata = MetadataTable::from_path(metadata_path, delimiter, &config.sample_id_column)?;
    Ok((abundance, metadata))
}

/// Write the results table, plots and run report into `out_dir`.
///
/// Every artifact is rendered in memory first; the directory is only
/// created once rendering has succeeded.
pub fn write_outputs<P: AsRef<Path>>(outcome: &AnalysisOutcome, out_dir: P) -> Result<OutputFiles> {
    let out_dir = out_dir.as_ref();

    let mut table = Vec::new();
    outcome.results.write_csv(&mut table)?;

    let volcano = volcano_plot(&outcome.results, &outcome.labels, &outcome.config.volcano);

    let features = outcome.boxplot_features();
    let boxplots = features
        .iter()
        .zip(boxplot_file_names(&features))
        .map(|(feature, name)| -> Result<(String, Plot)> {
            let plot = boxplot(
                &outcome.dataset,
                &outcome.assignment,
                &outcome.config.group,
                feature,
            )?;
            Ok((name, plot))
        })
        .collect::<Result<Vec<_>>>()?;

    let report = serde_json::to_string_pretty(&outcome.report())?;

    fs::create_dir_all(out_dir)?;
    let files = OutputFiles {
        results: out_dir.join(RESULTS_FILE),
        volcano: out_dir.join(VOLCANO_FILE),
        boxplots: boxplots.iter().map(|(name, _)| out_dir.join(name)).collect(),
        report: out_dir.join(REPORT_FILE),
    };

    fs::write(&files.results, table)?;
    write_plot(&volcano, &files.volcano)?;
    for ((_, plot), path) in boxplots.iter().zip(&files.boxplots) {
        write_plot(plot, path)?;
    }
    fs::write(&files.report, report)?;

    info!("Wrote outputs to {}", out_dir.display());
    Ok(files)
}

/// Load, analyse and write in one call.
pub fn run_from_paths<A: AsRef<Path>, M: AsRef<Path>, O: AsRef<Path>>(
    abundance_path: A,
    metadata_path: M,
    out_dir: O,
    config: &AnalysisConfig,
) -> Result<AnalysisOutcome> {
    let (abundance, metadata) = load_inputs(abundance_path, metadata_path, config)?;
    let outcome = run_analysis(&abundance, &metadata, config)?;
    write_outputs(&outcome, out_dir)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssocError;
    use crate::io::RawTable;
    use crate::rank::LabelPolicy;
    use approx::assert_relative_eq;

    fn tables(abundance: &str, metadata: &str) -> (AbundanceTable, MetadataTable) {
        let raw_a = RawTable::from_reader(abundance.as_bytes(), b',').unwrap();
        let raw_m = RawTable::from_reader(metadata.as_bytes(), b',').unwrap();
        (
            AbundanceTable::from_raw(&raw_a, "SampleID").unwrap(),
            MetadataTable::from_raw(&raw_m, "SampleID").unwrap(),
        )
    }

    const ABUNDANCE: &str = "SampleID,Bacteroides,Prevotella\n\
        S01,0.30,0.10\n\
        S02,0.05,0.12\n\
        S03,0.28,0.09\n\
        S04,0.02,0.11\n";

    const METADATA: &str = "SampleID,Severity,Age\n\
        S01,Mild,40\n\
        S02,Severe,52\n\
        S03,Mild,38\n\
        S04,Severe,61\n";

    #[test]
    fn test_run_analysis_scenario() {
        let (a, m) = tables(ABUNDANCE, METADATA);
        let outcome = run_analysis(&a, &m, &AnalysisConfig::default()).unwrap();

        assert_eq!(outcome.dataset.n_samples(), 4);
        assert_eq!(outcome.results.len(), 2);
        let bact = outcome.results.get("Bacteroides").unwrap();
        assert_relative_eq!(bact.mean_group1, 0.29, epsilon = 1e-12);
        assert_relative_eq!(bact.mean_group2, 0.035, epsilon = 1e-12);
        assert!(bact.log2_fold_change < 0.0);
        assert_relative_eq!(bact.p_value, 1.0 / 3.0, epsilon = 1e-12);
        assert!(bact.q_value >= bact.p_value);
    }

    #[test]
    fn test_unmatched_samples_are_dropped() {
        let metadata = "SampleID,Severity\nS01,Mild\nS02,Severe\nS03,Mild\nS04,Severe\nS99,Mild\n";
        let (a, m) = tables(ABUNDANCE, metadata);
        let outcome = run_analysis(&a, &m, &AnalysisConfig::default()).unwrap();
        assert_eq!(outcome.dataset.n_samples(), 4);
        assert_eq!(outcome.alignment.only_in_metadata, vec!["S99"]);

        let err = run_analysis(&a, &m, &AnalysisConfig::default().strict_samples(true)).unwrap_err();
        assert!(matches!(err, AssocError::SampleMismatch(_)));
    }

    #[test]
    fn test_empty_group_is_validation_error() {
        let (a, m) = tables(ABUNDANCE, METADATA);
        let config = AnalysisConfig::default().group("Severity", "Moderate", "Severe");
        let err = run_analysis(&a, &m, &config).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_boxplot_and_label_selection() {
        let (a, m) = tables(ABUNDANCE, METADATA);
        let config = AnalysisConfig::default().labels(LabelPolicy::Top { n: 1 });
        let outcome = run_analysis(&a, &m, &config).unwrap();

        assert_eq!(outcome.labeled_features().len(), 1);
        assert_eq!(outcome.boxplot_features().len(), 2);
        assert_eq!(outcome.report().cohorts.group1, 2);
        assert!(outcome.to_string().contains("Top hits:"));
    }

    #[test]
    fn test_boxplot_names_do_not_overwrite() {
        let abundance = "SampleID,a b,a_b\n\
            S01,0.30,0.10\n\
            S02,0.05,0.12\n\
            S03,0.28,0.09\n\
            S04,0.02,0.11\n";
        let (a, m) = tables(abundance, METADATA);
        let outcome = run_analysis(&a, &m, &AnalysisConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let files = write_outputs(&outcome, dir.path()).unwrap();

        assert_eq!(files.boxplots.len(), 2);
        assert_ne!(files.boxplots[0], files.boxplots[1]);
        for path in &files.boxplots {
            assert!(path.exists());
        }
    }
}
