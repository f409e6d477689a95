//! Error types for the microbiome-assoc library.

use thiserror::Error;

/// Coarse classification of failures, used by callers to decide how to report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or incompatible input structure.
    Validation,
    /// Numeric data could not be interpreted.
    Computation,
    /// Filesystem or parsing failure below the table level.
    Io,
    /// Invalid configuration value.
    Config,
}

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum AssocError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{table} table must contain a '{column}' column")]
    MissingColumn { table: String, column: String },

    #[error("{table} table contains duplicate SampleID '{sample}'")]
    DuplicateSample { table: String, sample: String },

    #[error("Abundance table contains duplicate feature column '{0}'")]
    DuplicateFeature(String),

    #[error("No SampleID is shared between the abundance and metadata tables")]
    EmptyIntersection,

    #[error("SampleID mismatch: {0}")]
    SampleMismatch(String),

    #[error("No samples with {column} = '{value}' (cohort would be empty)")]
    EmptyCohort { column: String, value: String },

    #[error("Group values must differ, both are '{0}'")]
    IdenticalGroups(String),

    #[error("Line {line} has {found} fields, but the header has {expected}")]
    RaggedRecord {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid abundance value '{value}' for feature '{feature}' in sample '{sample}'")]
    InvalidAbundance {
        value: String,
        sample: String,
        feature: String,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Plot error: {0}")]
    Plot(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AssocError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssocError::MissingColumn { .. }
            | AssocError::DuplicateSample { .. }
            | AssocError::DuplicateFeature(_)
            | AssocError::EmptyIntersection
            | AssocError::SampleMismatch(_)
            | AssocError::EmptyCohort { .. }
            | AssocError::IdenticalGroups(_)
            | AssocError::RaggedRecord { .. }
            | AssocError::EmptyData(_) => ErrorKind::Validation,
            AssocError::InvalidAbundance { .. } => ErrorKind::Computation,
            AssocError::InvalidParameter(_) | AssocError::Yaml(_) => ErrorKind::Config,
            AssocError::Io(_) | AssocError::Csv(_) | AssocError::Plot(_) | AssocError::Json(_) => {
                ErrorKind::Io
            }
        }
    }

    /// True for structural input problems.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// True for uninterpretable numeric input.
    pub fn is_computation(&self) -> bool {
        self.kind() == ErrorKind::Computation
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, AssocError>;
