//! Data structures for two-group association analysis.

mod abundance;
mod joined;
mod metadata;
mod result;

pub use abundance::AbundanceTable;
pub use joined::{JoinedDataset, JoinedRow};
pub use metadata::{MetadataTable, Variable, VariableType};
pub use result::{format_value, FeatureStat, ResultSummary, ResultTable};
