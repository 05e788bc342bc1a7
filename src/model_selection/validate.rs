use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ModelSpec;
use crate::data_handling::CategoricalMask;
use crate::error::PipelineError;
use crate::model_selection::split::{Fold, StratifiedKFold};
use crate::models::classifier_trait::Classifier;
use crate::models::factory::build_model;
use crate::sampling::{SmoteNc, SmoteSettings};
use crate::stats::MetricSummary;

/// Degree of data-parallelism for fold and candidate evaluation.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    Sequential,
    Threads(usize),
    /// Use all available cores.
    All,
}

impl Parallelism {
    /// Thread count for `rayon::ThreadPoolBuilder` (0 = library default,
    /// i.e. all cores).
    pub(crate) fn rayon_threads(&self) -> usize {
        match self {
            Parallelism::Sequential => 1,
            Parallelism::Threads(n) => (*n).max(1),
            Parallelism::All => 0,
        }
    }
}

/// Settings for a plain cross-validated evaluation.
#[derive(Debug, Clone)]
pub struct ValidationSettings {
    pub n_splits: usize,
    /// Fit-only SMOTE-NC composed inside each fold's training data.
    pub balancing: Option<SmoteSettings>,
    pub parallelism: Parallelism,
    pub split_seed: u64,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            n_splits: 5,
            balancing: None,
            parallelism: Parallelism::All,
            split_seed: 0,
        }
    }
}

/// Per-fold metric batteries plus their mean and standard deviation.
#[derive(Debug, Clone)]
pub struct CrossValidation {
    pub fold_metrics: Vec<MetricSummary>,
    pub mean: MetricSummary,
    pub std: MetricSummary,
}

/// Run stratified k-fold cross-validation of one estimator configuration,
/// computing the full metric battery per fold.
///
/// When balancing is requested the balancer only ever sees the fold's
/// training rows; validation rows are scored untouched.
pub fn cross_validate(
    x: &Array2<f64>,
    y: &Array1<i32>,
    spec: &ModelSpec,
    mask: &CategoricalMask,
    settings: &ValidationSettings,
) -> Result<CrossValidation, PipelineError> {
    let folds = StratifiedKFold::new(settings.n_splits, settings.split_seed).split(y)?;
    let fold_metrics = evaluate_folds(
        x,
        y,
        spec,
        mask,
        settings.balancing.as_ref(),
        &folds,
        settings.parallelism,
    )?;

    let mean = MetricSummary::mean_of(&fold_metrics);
    let std = MetricSummary::std_of(&fold_metrics);
    Ok(CrossValidation {
        fold_metrics,
        mean,
        std,
    })
}

/// Evaluate every fold of one candidate, in order, optionally on a rayon
/// pool. Results come back in fold order regardless of scheduling.
pub(crate) fn evaluate_folds(
    x: &Array2<f64>,
    y: &Array1<i32>,
    spec: &ModelSpec,
    mask: &CategoricalMask,
    balancing: Option<&SmoteSettings>,
    folds: &[Fold],
    parallelism: Parallelism,
) -> Result<Vec<MetricSummary>, PipelineError> {
    let threads = parallelism.rayon_threads();
    let results: Vec<Result<MetricSummary, PipelineError>> = if threads == 1 {
        folds
            .iter()
            .map(|fold| evaluate_fold(x, y, spec, mask, balancing, fold))
            .collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("failed to build rayon thread pool");
        pool.install(|| {
            folds
                .par_iter()
                .map(|fold| evaluate_fold(x, y, spec, mask, balancing, fold))
                .collect()
        })
    };

    results.into_iter().collect()
}

/// Fit on the fold's (optionally balanced) training rows and score the
/// untouched validation rows.
pub(crate) fn evaluate_fold(
    x: &Array2<f64>,
    y: &Array1<i32>,
    spec: &ModelSpec,
    mask: &CategoricalMask,
    balancing: Option<&SmoteSettings>,
    fold: &Fold,
) -> Result<MetricSummary, PipelineError> {
    let x_train = x.select(Axis(0), &fold.train);
    let y_train: Array1<i32> = fold.train.iter().map(|&i| y[i]).collect();

    let (x_fit, y_fit) = match balancing {
        Some(smote_settings) => {
            SmoteNc::new(*smote_settings).fit_resample(&x_train, &y_train, mask)?
        }
        None => (x_train, y_train),
    };

    let mut model = build_model(spec);
    model.fit(&x_fit, &y_fit)?;

    let x_val = x.select(Axis(0), &fold.validation);
    let y_val: Array1<i32> = fold.validation.iter().map(|&i| y[i]).collect();

    let proba = model.predict_proba(&x_val)?;
    if proba.iter().any(|p| !p.is_finite()) {
        return Err(PipelineError::ProbabilityUnsupported {
            family: model.name().to_string(),
        });
    }
    let y_pred = proba.mapv(|p| if p >= 0.5 { 1 } else { 0 });

    Ok(MetricSummary::battery(&y_val, &y_pred, &proba))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GradientBoostingParams, ModelSpec};

    fn toy_problem() -> (Array2<f64>, Array1<i32>, CategoricalMask) {
        // 10 bits + 2 descriptors; the descriptors separate the classes
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..15 {
            let mut row = vec![0.0; 12];
            row[i % 10] = 1.0;
            row[10] = i as f64 * 0.1;
            row[11] = 1.0;
            rows.extend(row);
            y.push(0);
        }
        for i in 0..5 {
            let mut row = vec![0.0; 12];
            row[i % 10] = 1.0;
            row[10] = 10.0 + i as f64;
            row[11] = -1.0;
            rows.extend(row);
            y.push(1);
        }
        (
            Array2::from_shape_vec((20, 12), rows).unwrap(),
            Array1::from_vec(y),
            CategoricalMask::from_layout(10, 2),
        )
    }

    #[test]
    fn cross_validation_produces_bounded_metrics() {
        let (x, y, mask) = toy_problem();
        let spec = ModelSpec::GradientBoosting(GradientBoostingParams {
            max_depth: 3,
            num_boost_round: 5,
            ..GradientBoostingParams::default()
        });

        let cv = cross_validate(
            &x,
            &y,
            &spec,
            &mask,
            &ValidationSettings {
                parallelism: Parallelism::Sequential,
                ..ValidationSettings::default()
            },
        )
        .unwrap();

        assert_eq!(cv.fold_metrics.len(), 5);
        for m in [
            cv.mean.f1,
            cv.mean.roc_auc,
            cv.mean.recall,
            cv.mean.precision,
            cv.mean.average_precision,
        ] {
            assert!((0.0..=1.0).contains(&m), "metric out of range: {}", m);
        }
    }

    #[test]
    fn balanced_and_parallel_runs_match_sequential() {
        let (x, y, mask) = toy_problem();
        let spec = ModelSpec::GradientBoosting(GradientBoostingParams {
            max_depth: 3,
            num_boost_round: 5,
            ..GradientBoostingParams::default()
        });
        let balancing = Some(SmoteSettings {
            k_neighbors: 3,
            seed: 11,
        });

        let sequential = cross_validate(
            &x,
            &y,
            &spec,
            &mask,
            &ValidationSettings {
                balancing,
                parallelism: Parallelism::Sequential,
                ..ValidationSettings::default()
            },
        )
        .unwrap();
        let parallel = cross_validate(
            &x,
            &y,
            &spec,
            &mask,
            &ValidationSettings {
                balancing,
                parallelism: Parallelism::Threads(4),
                ..ValidationSettings::default()
            },
        )
        .unwrap();

        assert_eq!(sequential.fold_metrics, parallel.fold_metrics);
    }

    #[test]
    fn infeasible_stratification_propagates() {
        let (x, _, mask) = toy_problem();
        let mut y = vec![0; 17];
        y.extend(vec![1; 3]);
        let y = Array1::from_vec(y);

        let err = cross_validate(
            &x,
            &y,
            &ModelSpec::default(),
            &mask,
            &ValidationSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InfeasibleStratification { .. }
        ));
    }
}
