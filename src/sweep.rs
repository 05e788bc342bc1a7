//! Fingerprint-length sweep.
//!
//! Evaluates how the cross-validated metric battery changes with the
//! requested fingerprint length, for each fingerprint family at once.
//! Fingerprint computation itself is an external collaborator: the sweep
//! pulls freshly sized tables from a provider closure.
use std::path::Path;

use anyhow::Context;
use itertools_num::linspace;
use ndarray::Array1;

use crate::config::ModelSpec;
use crate::data_handling::{CategoricalMask, FeatureFrame};
use crate::error::PipelineError;
use crate::model_selection::validate::{cross_validate, ValidationSettings};
use crate::stats::MetricSummary;

#[derive(Debug, Clone)]
pub struct SweepSettings {
    pub min_size: usize,
    pub max_size: usize,
    pub num_sizes: usize,
    /// One name per fingerprint family, in the order the provider returns
    /// its tables.
    pub family_names: Vec<String>,
    pub validation: ValidationSettings,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            min_size: 100,
            max_size: 2048,
            num_sizes: 20,
            family_names: vec![
                "ecfp4".to_string(),
                "maccs".to_string(),
                "atom_pairs".to_string(),
                "topological_torsion".to_string(),
            ],
            validation: ValidationSettings {
                n_splits: 10,
                ..ValidationSettings::default()
            },
        }
    }
}

/// Mean metric batteries per (family, size) cell.
#[derive(Debug, Clone)]
pub struct SweepResults {
    pub sizes: Vec<usize>,
    pub family_names: Vec<String>,
    /// `summaries[family][size_index]`
    pub summaries: Vec<Vec<MetricSummary>>,
}

const SWEEP_METRICS: [(&str, fn(&MetricSummary) -> f64); 7] = [
    ("f1", |m| m.f1),
    ("f1_micro", |m| m.f1_micro),
    ("f1_macro", |m| m.f1_macro),
    ("roc_auc", |m| m.roc_auc),
    ("recall", |m| m.recall),
    ("precision", |m| m.precision),
    ("average_precision", |m| m.average_precision),
];

impl SweepResults {
    /// Scores of one metric, `[family][size_index]`.
    pub fn metric(&self, name: &str) -> Option<Vec<Vec<f64>>> {
        let pick = SWEEP_METRICS
            .iter()
            .find(|(metric, _)| *metric == name)
            .map(|(_, pick)| pick)?;
        Some(
            self.summaries
                .iter()
                .map(|row| row.iter().map(pick).collect())
                .collect(),
        )
    }

    /// Write one CSV per metric under `dir` (rows = fingerprint families,
    /// columns = sizes).
    pub fn write_csv(&self, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create results directory {}", dir.display()))?;

        for (metric, pick) in SWEEP_METRICS {
            let path = dir.join(format!("{}_by_fingerprint_size.csv", metric));
            let mut writer = csv::Writer::from_path(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;

            let mut header = vec!["family".to_string()];
            header.extend(self.sizes.iter().map(|s| s.to_string()));
            writer.write_record(&header)?;

            for (family, row) in self.family_names.iter().zip(&self.summaries) {
                let mut record = vec![family.clone()];
                record.extend(row.iter().map(|m| format!("{}", pick(m))));
                writer.write_record(&record)?;
            }
            writer.flush()?;
        }
        Ok(())
    }
}

/// Sweep fingerprint lengths between `min_size` and `max_size`.
///
/// For every size the provider returns one table per fingerprint family;
/// each table is cross-validated against `y` with the given estimator
/// configuration. Fingerprint bits are all-categorical, so the balancer
/// mask is derived per table.
pub fn sweep_fingerprint_sizes<P>(
    mut provider: P,
    y: &Array1<i32>,
    spec: &ModelSpec,
    settings: &SweepSettings,
) -> Result<SweepResults, PipelineError>
where
    P: FnMut(usize) -> Vec<FeatureFrame>,
{
    let sizes: Vec<usize> = linspace(
        settings.min_size as f64,
        settings.max_size as f64,
        settings.num_sizes,
    )
    .map(|v| v.round() as usize)
    .collect();

    let n_families = settings.family_names.len();
    let mut summaries: Vec<Vec<MetricSummary>> = vec![Vec::with_capacity(sizes.len()); n_families];

    for &size in &sizes {
        let frames = provider(size);
        if frames.len() != n_families {
            return Err(PipelineError::DimensionMismatch {
                what: "fingerprint families returned by provider",
                expected: n_families,
                actual: frames.len(),
            });
        }

        for (family_idx, frame) in frames.iter().enumerate() {
            let mask = CategoricalMask::from_layout(frame.ncols(), 0);
            let cv = cross_validate(frame.x(), y, spec, &mask, &settings.validation)?;
            summaries[family_idx].push(cv.mean);
        }
        log::debug!("Swept fingerprint size {}", size);
    }

    Ok(SweepResults {
        sizes,
        family_names: settings.family_names.clone(),
        summaries,
    })
}
