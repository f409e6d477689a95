//! Multiple testing correction.

pub mod bh;

pub use bh::{apply_bh, correct_bh, BhCorrected};
