//! Rank-based hypothesis testing.


pub use mann_whitney::{average_ranks, mann_whitney_u, MannWhitneyResult, MwuMethod};
