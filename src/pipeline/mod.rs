//! Configuration and orchestration of an association run.

mod config;
mod runner;

pub use config::AnalysisConfig;
pub use runner::{
    load_inputs, run_analysis, run_from_paths, write_outputs, AnalysisOutcome, CohortSizes,
    OutputFiles, RunReport, REPORT_FILE, RESULTS_FILE, VOLCANO_FILE,
};
