//! Volcano plot: log2 fold change against -log10(p).

use crate::data::{FeatureStat, ResultTable};
use crate::error::{AssocError, Result};
use plotly::common::{DashType, Line, Mode, Position};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};
use serde::{Deserialize, Serialize};

/// Offset added to p before the log so that p = 0 stays finite.
const P_FLOOR: f64 = 1e-12;

/// Threshold guide lines drawn on the volcano plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolcanoGuides {
    /// Horizontal guide at -log10(p_thresh).
    pub p_thresh: f64,
    /// Vertical guides at +/- fc_thresh.
    pub fc_thresh: f64,
}

impl Default for VolcanoGuides {
    fn default() -> Self {
        Self {
            p_thresh: 0.05,
            fc_thresh: 1.0,
        }
    }
}

impl VolcanoGuides {
    /// Check guide positions.
    pub fn validate(&self) -> Result<()> {
        if !(self.p_thresh > 0.0 && self.p_thresh <= 1.0) {
            return Err(AssocError::InvalidParameter(format!(
                "p_thresh must be in (0, 1], got {}",
                self.p_thresh
            )));
        }
        if !self.fc_thresh.is_finite() || self.fc_thresh < 0.0 {
            return Err(AssocError::InvalidParameter(format!(
                "fc_thresh must be a non-negative number, got {}",
                self.fc_thresh
            )));
        }
        Ok(())
    }
}

/// -log10(p + 1e-12).
#[inline]
pub fn neg_log10_p(p: f64) -> f64 {
    -(p + P_FLOOR).log10()
}

fn guide(x: Vec<f64>, y: Vec<f64>) -> Box<Scatter<f64, f64>> {
    Scatter::new(x, y)
        .mode(Mode::Lines)
        .show_legend(false)
        .line(Line::new().color("grey").dash(DashType::Dash))
}

/// x, y and hover text of a set of points.
fn coords(points: &[(&FeatureStat, bool)]) -> (Vec<f64>, Vec<f64>, Vec<String>) {
    let x = points.iter().map(|(r, _)| r.log2_fold_change).collect();
    let y = points.iter().map(|(r, _)| neg_log10_p(r.p_value)).collect();
    let text = points.iter().map(|(r, _)| r.feature.clone()).collect();
    (x, y, text)
}

/// Build the volcano plot for a ranked table.
///
/// Features without a p-value are left out. `labels` are positions into
/// `table.records`; those points carry their feature name as text.
pub fn volcano_plot(table: &ResultTable, labels: &[usize], guides: &VolcanoGuides) -> Plot {
    let mut labeled = vec![false; table.len()];
    for &i in labels {
        if let Some(flag) = labeled.get_mut(i) {
            *flag = true;
        }
    }

    let tested: Vec<(&FeatureStat, bool)> = table
        .records
        .iter()
        .zip(&labeled)
        .filter(|(r, _)| r.is_tested() && r.log2_fold_change.is_finite())
        .map(|(r, &l)| (r, l))
        .collect();

    let (plain, marked): (Vec<_>, Vec<_>) = tested.into_iter().partition(|(_, l)| !l);

    let mut plot = Plot::new();
    let (x, y, text) = coords(&plain);
    plot.add_trace(
        Scatter::new(x, y)
            .mode(Mode::Markers)
            .name("features")
            .text_array(text),
    );
    if !marked.is_empty() {
        let (x, y, text) = coords(&marked);
        plot.add_trace(
            Scatter::new(x, y)
                .mode(Mode::MarkersText)
                .name("labeled")
                .text_position(Position::TopRight)
                .text_array(text),
        );
    }

    let all: Vec<&FeatureStat> = plain.iter().chain(&marked).map(|(r, _)| *r).collect();
    let x_extent = all
        .iter()
        .map(|r| r.log2_fold_change.abs())
        .fold(guides.fc_thresh, f64::max)
        * 1.1;
    let y_top = all
        .iter()
        .map(|r| neg_log10_p(r.p_value))
        .fold(neg_log10_p(guides.p_thresh), f64::max)
        * 1.1;

    let y_line = neg_log10_p(guides.p_thresh);
    plot.add_trace(guide(vec![-x_extent, x_extent], vec![y_line, y_line]));
    plot.add_trace(guide(vec![0.0, 0.0], vec![0.0, y_top]));
    plot.add_trace(guide(vec![guides.fc_thresh, guides.fc_thresh], vec![0.0, y_top]));
    plot.add_trace(guide(vec![-guides.fc_thresh, -guides.fc_thresh], vec![0.0, y_top]));

    plot.set_layout(
        Layout::new()
            .title("Volcano Plot: Microbiome Associations")
            .x_axis(Axis::new().title(
                format!("log2 Fold Change ({} vs {})", table.group2, table.group1).as_str(),
            ))
            .y_axis(Axis::new().title("-log10(p-value)")),
    );

    plot
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stat(name: &str, idx: usize, p: f64, lfc: f64) -> FeatureStat {
        FeatureStat {
            feature: name.to_string(),
            feature_index: idx,
            mean_group1: 0.1,
            mean_group2: 0.2,
            log2_fold_change: lfc,
            u_statistic: 1.0,
            p_value: p,
            q_value: p,
            n_group1: 3,
            n_group2: 3,
        }
    }

    #[test]
    fn test_neg_log10_p() {
        assert_relative_eq!(neg_log10_p(0.01), 2.0, epsilon = 1e-9);
        assert!(neg_log10_p(0.0).is_finite());
        assert_relative_eq!(neg_log10_p(0.0), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_volcano_contains_labels_and_axis() {
        let table = ResultTable::new(
            "Severity",
            "Mild",
            "Severe",
            vec![
                stat("Bacteroides", 0, 0.001, -3.0),
                stat("Prevotella", 1, 0.4, 0.2),
                stat("Unmeasured", 2, f64::NAN, 0.0),
            ],
        );
        let plot = volcano_plot(&table, &[0], &VolcanoGuides::default());
        let html = plot.to_html();

        assert!(html.contains("Bacteroides"));
        assert!(html.contains("log2 Fold Change (Severe vs Mild)"));
        assert!(!html.contains("Unmeasured"));
    }

    #[test]
    fn test_guides_validation() {
        assert!(VolcanoGuides::default().validate().is_ok());
        let bad = VolcanoGuides {
            p_thresh: 0.0,
            fc_thresh: 1.0,
        };
        assert!(bad.validate().is_err());
    }
}
