//! Volcano and boxplot rendering as self-contained HTML.

pub mod boxplot;
pub mod volcano;

pub use boxplot::{boxplot, boxplot_file_name, boxplot_file_names};
pub use volcano::{neg_log10_p, volcano_plot, VolcanoGuides};

use crate::error::Result;
use plotly::Plot;
use std::path::Path;

/// Write a plot to `path` as a standalone HTML page.
pub fn write_plot<P: AsRef<Path>>(plot: &Plot, path: P) -> Result<()> {
    std::fs::write(path, plot.to_html())?;
    Ok(())
}
