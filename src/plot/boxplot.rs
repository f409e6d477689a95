//! Per-feature abundance boxplots, one box per cohort.

use crate::data::JoinedDataset;
use crate::error::{AssocError, Result};
use crate::partition::{GroupAssignment, GroupSpec};
use plotly::box_plot::BoxPoints;
use plotly::layout::{Axis, Layout};
use plotly::{BoxPlot, Plot};
use std::collections::HashSet;

/// File name for a feature's boxplot. Path separators and other characters
/// unsafe in file names are replaced with `_`.
pub fn boxplot_file_name(feature: &str) -> String {
    let safe: String = feature
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    format!("boxplot_{}.html", safe)
}

/// File names for several boxplots, one per feature and all distinct.
///
/// When two features sanitise to the same name, the later one gets a
/// `_2`, `_3`, ... suffix.
pub fn boxplot_file_names(features: &[&str]) -> Vec<String> {
    let mut taken = HashSet::new();
    features
        .iter()
        .map(|feature| {
            let base = boxplot_file_name(feature);
            let mut name = base.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{}_{}.html", base.trim_end_matches(".html"), n);
                n += 1;
            }
            name
        })
        .collect()
}

/// Boxplot of one feature's defined abundances in both cohorts.
pub fn boxplot(
    dataset: &JoinedDataset,
    assignment: &GroupAssignment,
    group: &GroupSpec,
    feature: &str,
) -> Result<Plot> {
    let feature_idx = dataset
        .feature_names()
        .iter()
        .position(|f| f == feature)
        .ok_or_else(|| AssocError::Plot(format!("Unknown feature '{}'", feature)))?;

    let mut plot = Plot::new();
    for (label, rows) in [
        (&group.group1, &assignment.group1),
        (&group.group2, &assignment.group2),
    ] {
        let values = dataset.defined_values(feature_idx, rows);
        plot.add_trace(
            BoxPlot::<f64, f64>::new(values)
                .name(label.as_str())
                .box_points(BoxPoints::All),
        );
    }

    plot.set_layout(
        Layout::new()
            .title(format!("{} by {}", feature, group.column).as_str())
            .x_axis(Axis::new().title(group.column.as_str()))
            .y_axis(Axis::new().title("Abundance")),
    );

    Ok(plot)
}
