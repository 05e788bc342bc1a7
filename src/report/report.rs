use std::path::{Path, PathBuf};

use anyhow::Context;
use ndarray::{Array1, Array2};

use crate::config::ModelSpec;
use crate::data_handling::{LabelDataset, LabelDatasets};
use crate::error::PipelineError;
use crate::model_selection::multilabel::{BestParamsByLabel, LabelFailure};
use crate::model_selection::validate::{cross_validate, ValidationSettings};
use crate::models::classifier_trait::Classifier;
use crate::models::factory::build_model;
use crate::report::plots::write_pr_curve_html;
use crate::sampling::{SmoteNc, SmoteSettings};
use crate::stats::{precision_recall_curve, MetricSummary};

/// Which estimator to evaluate per label: one shared configuration for all
/// labels, or the per-label winners of a previous search.
#[derive(Debug, Clone, Copy)]
pub enum ModelChoice<'a> {
    Shared(&'a ModelSpec),
    PerLabel(&'a BestParamsByLabel),
}

impl<'a> ModelChoice<'a> {
    fn resolve(&self, label: &str) -> Result<&'a ModelSpec, PipelineError> {
        match *self {
            ModelChoice::Shared(spec) => Ok(spec),
            ModelChoice::PerLabel(params) => {
                params
                    .get(label)
                    .ok_or_else(|| PipelineError::MissingModelSpec {
                        label: label.to_string(),
                    })
            }
        }
    }
}

/// One label's row of the report table. Cells are rounded to three
/// decimals, so every cell is a plain comparable float. `std` is present
/// only for cross-validated reports.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub label: String,
    pub mean: MetricSummary,
    pub std: Option<MetricSummary>,
}

/// The assembled report: one row per label, in label order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTable {
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    pub fn get(&self, label: &str) -> Option<&MetricRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// Write the table as CSV. Standard-deviation columns are emitted when
    /// any row carries them.
    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        let with_std = self.rows.iter().any(|r| r.std.is_some());
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create report file {}", path.display()))?;

        let mut header = vec![
            "label",
            "f1",
            "f1_micro",
            "f1_macro",
            "roc_auc",
            "recall",
            "precision",
            "average_precision",
        ];
        if with_std {
            header.extend([
                "f1_std",
                "f1_micro_std",
                "f1_macro_std",
                "roc_auc_std",
                "recall_std",
                "precision_std",
                "average_precision_std",
            ]);
        }
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.label.clone()];
            record.extend(metric_cells(&row.mean));
            if with_std {
                match &row.std {
                    Some(std) => record.extend(metric_cells(std)),
                    None => record.extend(std::iter::repeat(String::new()).take(7)),
                }
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn metric_cells(summary: &MetricSummary) -> Vec<String> {
    [
        summary.f1,
        summary.f1_micro,
        summary.f1_macro,
        summary.roc_auc,
        summary.recall,
        summary.precision,
        summary.average_precision,
    ]
    .iter()
    .map(|v| format!("{}", v))
    .collect()
}

/// A report plus the manifest of labels that failed. Failed labels never
/// disturb the rows already computed for the others.
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub table: MetricTable,
    pub failures: Vec<LabelFailure>,
}

impl ReportOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compute the metric battery for an already-fitted estimator on a held-out
/// partition. Pure with respect to its inputs: calling it twice with the
/// same estimator and partition yields identical values.
pub fn score_report(
    estimator: &dyn Classifier,
    x_test: &Array2<f64>,
    y_test: &Array1<i32>,
) -> Result<MetricSummary, PipelineError> {
    if x_test.nrows() != y_test.len() {
        return Err(PipelineError::DimensionMismatch {
            what: "test rows vs test targets",
            expected: x_test.nrows(),
            actual: y_test.len(),
        });
    }

    let y_score = estimator.predict_proba(x_test)?;
    if y_score.iter().any(|p| !p.is_finite()) {
        return Err(PipelineError::ProbabilityUnsupported {
            family: estimator.name().to_string(),
        });
    }
    let y_pred = y_score.mapv(|p| if p >= 0.5 { 1 } else { 0 });

    Ok(MetricSummary::battery(y_test, &y_pred, &y_score))
}

/// Cross-validated report: one mean/std battery row per label, computed on
/// each label's training partition with optional fit-only balancing.
pub fn cv_multi_report(
    datasets: &LabelDatasets,
    choice: &ModelChoice,
    settings: &ValidationSettings,
) -> ReportOutcome {
    let mut outcome = ReportOutcome::default();

    for dataset in datasets {
        log::info!("Cross-validated scores for label '{}'", dataset.label);
        let result = choice.resolve(&dataset.label).and_then(|spec| {
            cross_validate(
                dataset.x_train.x(),
                &dataset.y_train,
                spec,
                &dataset.mask,
                settings,
            )
        });
        match result {
            Ok(cv) => outcome.table.rows.push(MetricRow {
                label: dataset.label.clone(),
                mean: round3(&cv.mean),
                std: Some(round3(&cv.std)),
            }),
            Err(error) => {
                log::warn!("Label '{}' report failed: {}", dataset.label, error);
                outcome.failures.push(LabelFailure {
                    label: dataset.label.clone(),
                    error,
                });
            }
        }
    }

    outcome
}

/// Settings for the held-out reporting engine.
#[derive(Debug, Clone, Default)]
pub struct HeldOutSettings {
    /// Balance the training partition (only) before the final fit.
    pub balancing: Option<SmoteSettings>,
    /// When set, a precision-recall curve per label is written here.
    pub plot_dir: Option<PathBuf>,
}

/// Held-out report: fit each label's estimator on its (optionally balanced)
/// training partition, score its test partition once.
pub fn heldout_multi_report(
    datasets: &LabelDatasets,
    choice: &ModelChoice,
    settings: &HeldOutSettings,
) -> ReportOutcome {
    let mut outcome = ReportOutcome::default();

    for dataset in datasets {
        log::info!("Held-out scores for label '{}'", dataset.label);
        match score_one_label(dataset, choice, settings) {
            Ok(summary) => outcome.table.rows.push(MetricRow {
                label: dataset.label.clone(),
                mean: round3(&summary),
                std: None,
            }),
            Err(error) => {
                log::warn!("Label '{}' report failed: {}", dataset.label, error);
                outcome.failures.push(LabelFailure {
                    label: dataset.label.clone(),
                    error,
                });
            }
        }
    }

    outcome
}

fn score_one_label(
    dataset: &LabelDataset,
    choice: &ModelChoice,
    settings: &HeldOutSettings,
) -> Result<MetricSummary, PipelineError> {
    let spec = choice.resolve(&dataset.label)?;
    let mut estimator = build_model(spec);

    match &settings.balancing {
        Some(smote_settings) => {
            let (xb, yb) = SmoteNc::new(*smote_settings).fit_resample(
                dataset.x_train.x(),
                &dataset.y_train,
                &dataset.mask,
            )?;
            estimator.fit(&xb, &yb)?;
        }
        None => estimator.fit(dataset.x_train.x(), &dataset.y_train)?,
    }

    let summary = score_report(estimator.as_ref(), dataset.x_test.x(), &dataset.y_test)?;

    if let Some(dir) = &settings.plot_dir {
        let y_score = estimator.predict_proba(dataset.x_test.x())?;
        let curve = precision_recall_curve(&dataset.y_test, &y_score);
        // Plot output is best-effort; a failed write must not lose the row
        if let Err(e) = write_pr_curve_html(&curve, summary.average_precision, &dataset.label, dir)
        {
            log::warn!(
                "Failed to write precision-recall plot for '{}': {}",
                dataset.label,
                e
            );
        }
    }

    Ok(summary)
}

/// Round every cell to three decimals, matching the table's CSV precision.
fn round3(summary: &MetricSummary) -> MetricSummary {
    let r = |v: f64| (v * 1000.0).round() / 1000.0;
    MetricSummary {
        f1: r(summary.f1),
        f1_micro: r(summary.f1_micro),
        f1_macro: r(summary.f1_macro),
        roc_auc: r(summary.roc_auc),
        recall: r(summary.recall),
        precision: r(summary.precision),
        average_precision: r(summary.average_precision),
    }
}
