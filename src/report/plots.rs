use std::path::{Path, PathBuf};

use anyhow::Context;
use plotly::common::Mode;
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

use crate::stats::PrCurve;

/// Build a precision-recall curve plot with the average precision in the
/// title.
pub fn precision_recall_plot(curve: &PrCurve, average_precision: f64, name: &str) -> Plot {
    let trace = Scatter::new(curve.recall.clone(), curve.precision.clone())
        .mode(Mode::Lines)
        .name("Precision-Recall");

    let title = format!(
        "{} Precision-Recall curve: AP={:.2}",
        name, average_precision
    );
    let layout = Layout::new()
        .title(title.as_str())
        .x_axis(Axis::new().title("Recall"))
        .y_axis(Axis::new().title("Precision"));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}

/// Write one label's precision-recall curve under `dir`, returning the
/// written path.
pub fn write_pr_curve_html(
    curve: &PrCurve,
    average_precision: f64,
    name: &str,
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create plot directory {}", dir.display()))?;
    let path = dir.join(format!("{} Precision-Recall curve.html", name));
    let plot = precision_recall_plot(curve, average_precision, name);
    plot.write_html(&path);
    Ok(path)
}
