//! Zero handling for ratio and log computations.

pub mod pseudocount;

pub use pseudocount::{log2_fold_change, validate_pseudocount, DEFAULT_PSEUDOCOUNT};
