use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::{
    GradientBoostingParams, Kernel, MaxFeatures, ModelSpec, RandomForestParams, SvcParams,
};
use crate::data_handling::CategoricalMask;
use crate::error::PipelineError;
use crate::model_selection::split::StratifiedKFold;
use crate::model_selection::validate::{evaluate_fold, Parallelism};
use crate::models::classifier_trait::Classifier;
use crate::models::factory::build_model;
use crate::sampling::{SmoteNc, SmoteSettings};
use crate::stats::MetricSummary;

/// The single named metric a search optimizes.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    F1,
    F1Micro,
    F1Macro,
    RocAuc,
    Recall,
    Precision,
    AveragePrecision,
}

impl Scoring {
    pub fn pick(&self, summary: &MetricSummary) -> f64 {
        match self {
            Scoring::F1 => summary.f1,
            Scoring::F1Micro => summary.f1_micro,
            Scoring::F1Macro => summary.f1_macro,
            Scoring::RocAuc => summary.roc_auc,
            Scoring::Recall => summary.recall,
            Scoring::Precision => summary.precision,
            Scoring::AveragePrecision => summary.average_precision,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scoring::F1 => "f1",
            Scoring::F1Micro => "f1_micro",
            Scoring::F1Macro => "f1_macro",
            Scoring::RocAuc => "roc_auc",
            Scoring::Recall => "recall",
            Scoring::Precision => "precision",
            Scoring::AveragePrecision => "average_precision",
        }
    }
}

impl FromStr for Scoring {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "f1" => Ok(Scoring::F1),
            "f1_micro" => Ok(Scoring::F1Micro),
            "f1_macro" => Ok(Scoring::F1Macro),
            "roc_auc" => Ok(Scoring::RocAuc),
            "recall" => Ok(Scoring::Recall),
            "precision" => Ok(Scoring::Precision),
            "average_precision" => Ok(Scoring::AveragePrecision),
            _ => Err(format!("Unknown scoring metric: {}", s)),
        }
    }
}

/// Settings shared by grid and random search.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub n_splits: usize,
    pub scoring: Scoring,
    /// Fit-only SMOTE-NC composed as the first stage of each fold's fit,
    /// never applied to validation rows.
    pub balancing: Option<SmoteSettings>,
    pub parallelism: Parallelism,
    pub split_seed: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            n_splits: 5,
            scoring: Scoring::F1,
            balancing: None,
            parallelism: Parallelism::All,
            split_seed: 0,
        }
    }
}

/// Mean/std cross-validated score of one candidate configuration.
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub spec: ModelSpec,
    pub mean_score: f64,
    pub std_score: f64,
}

/// Result of a search: the winning configuration, its score, the full
/// per-candidate table, and an estimator refit on the whole training set.
pub struct SearchOutcome {
    pub best_spec: ModelSpec,
    pub best_score: f64,
    pub best_std: f64,
    pub cv_results: Vec<CandidateScore>,
    pub estimator: Box<dyn Classifier>,
}

impl std::fmt::Debug for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOutcome")
            .field("best_spec", &self.best_spec)
            .field("best_score", &self.best_score)
            .field("best_std", &self.best_std)
            .field("cv_results", &self.cv_results)
            .field("estimator", &self.estimator.name())
            .finish()
    }
}

/// Exhaustive search over a candidate list under stratified k-fold CV.
///
/// Ties are broken by first-found highest mean. The candidate list may mix
/// model families.
pub fn grid_search(
    x: &Array2<f64>,
    y: &Array1<i32>,
    mask: &CategoricalMask,
    candidates: &[ModelSpec],
    settings: &SearchSettings,
) -> Result<SearchOutcome, PipelineError> {
    if candidates.is_empty() {
        return Err(PipelineError::EmptyParameterGrid);
    }

    let folds = StratifiedKFold::new(settings.n_splits, settings.split_seed).split(y)?;
    let per_candidate = evaluate_candidates(
        x,
        y,
        mask,
        candidates,
        settings.balancing.as_ref(),
        &folds,
        settings.parallelism,
    )?;

    let mut cv_results = Vec::with_capacity(candidates.len());
    for (spec, fold_metrics) in candidates.iter().zip(&per_candidate) {
        let scores: Vec<f64> = fold_metrics.iter().map(|m| settings.scoring.pick(m)).collect();
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let var =
            scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        cv_results.push(CandidateScore {
            spec: spec.clone(),
            mean_score: mean,
            std_score: var.sqrt(),
        });
    }

    let best_idx = cv_results
        .iter()
        .enumerate()
        .fold(0, |best, (i, c)| {
            if c.mean_score > cv_results[best].mean_score {
                i
            } else {
                best
            }
        });
    let best = &cv_results[best_idx];
    log::debug!(
        "Best {} = {:.3} (+/- {:.3}) for {:?}",
        settings.scoring.as_str(),
        best.mean_score,
        best.std_score,
        best.spec.family()
    );

    let estimator = refit_on_full(x, y, mask, &best.spec, settings.balancing.as_ref())?;

    Ok(SearchOutcome {
        best_spec: best.spec.clone(),
        best_score: best.mean_score,
        best_std: best.std_score,
        cv_results,
        estimator,
    })
}

/// Randomized search: evaluates `n_iter` candidates sampled from `space`
/// without replacement (all of them when the space is smaller).
pub fn random_search(
    x: &Array2<f64>,
    y: &Array1<i32>,
    mask: &CategoricalMask,
    space: &[ModelSpec],
    n_iter: usize,
    sample_seed: u64,
    settings: &SearchSettings,
) -> Result<SearchOutcome, PipelineError> {
    if space.is_empty() || n_iter == 0 {
        return Err(PipelineError::EmptyParameterGrid);
    }

    let mut indices: Vec<usize> = (0..space.len()).collect();
    let mut rng = StdRng::seed_from_u64(sample_seed);
    indices.shuffle(&mut rng);
    indices.truncate(n_iter.min(space.len()));

    let sampled: Vec<ModelSpec> = indices.iter().map(|&i| space[i].clone()).collect();
    log::debug!(
        "Random search sampled {} of {} candidates",
        sampled.len(),
        space.len()
    );
    grid_search(x, y, mask, &sampled, settings)
}

/// Evaluate the candidate × fold product, optionally on a rayon pool.
/// Results are regrouped per candidate in fold order, so scheduling cannot
/// change the outcome.
fn evaluate_candidates(
    x: &Array2<f64>,
    y: &Array1<i32>,
    mask: &CategoricalMask,
    candidates: &[ModelSpec],
    balancing: Option<&SmoteSettings>,
    folds: &[crate::model_selection::split::Fold],
    parallelism: Parallelism,
) -> Result<Vec<Vec<MetricSummary>>, PipelineError> {
    let jobs: Vec<(usize, usize)> = (0..candidates.len())
        .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
        .collect();

    let run = |&(c, f): &(usize, usize)| {
        evaluate_fold(x, y, &candidates[c], mask, balancing, &folds[f]).map(|m| (c, f, m))
    };

    let threads = parallelism.rayon_threads();
    let raw: Vec<Result<(usize, usize, MetricSummary), PipelineError>> = if threads == 1 {
        jobs.iter().map(run).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("failed to build rayon thread pool");
        pool.install(|| jobs.par_iter().map(run).collect())
    };

    let mut per_candidate: Vec<Vec<Option<MetricSummary>>> =
        vec![vec![None; folds.len()]; candidates.len()];
    for result in raw {
        let (c, f, metrics) = result?;
        per_candidate[c][f] = Some(metrics);
    }

    Ok(per_candidate
        .into_iter()
        .map(|fold_metrics| {
            fold_metrics
                .into_iter()
                .map(|m| m.expect("every job reported"))
                .collect()
        })
        .collect())
}

/// Refit the winning configuration on the full training partition,
/// balancing it once when balancing is on.
fn refit_on_full(
    x: &Array2<f64>,
    y: &Array1<i32>,
    mask: &CategoricalMask,
    spec: &ModelSpec,
    balancing: Option<&SmoteSettings>,
) -> Result<Box<dyn Classifier>, PipelineError> {
    let mut estimator = build_model(spec);
    match balancing {
        Some(smote_settings) => {
            let (xb, yb) = SmoteNc::new(*smote_settings).fit_resample(x, y, mask)?;
            estimator.fit(&xb, &yb)?;
        }
        None => estimator.fit(x, y)?,
    }
    Ok(estimator)
}

/// Cartesian-product grid over SVC hyper-parameters.
#[derive(Debug, Clone)]
pub struct SvcGrid {
    pub c: Vec<f64>,
    pub kernel: Vec<Kernel>,
    pub eps: f64,
}

impl SvcGrid {
    pub fn candidates(&self) -> Vec<ModelSpec> {
        let mut specs = Vec::with_capacity(self.c.len() * self.kernel.len());
        for &c in &self.c {
            for kernel in &self.kernel {
                specs.push(ModelSpec::Svc(SvcParams {
                    c,
                    kernel: kernel.clone(),
                    eps: self.eps,
                }));
            }
        }
        specs
    }
}

/// Cartesian-product grid over random-forest hyper-parameters.
#[derive(Debug, Clone)]
pub struct RandomForestGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub max_features: Vec<MaxFeatures>,
    pub min_samples_split: Vec<usize>,
    pub min_samples_leaf: Vec<usize>,
    pub bootstrap: Vec<bool>,
    pub seed: u64,
}

impl RandomForestGrid {
    pub fn candidates(&self) -> Vec<ModelSpec> {
        let mut specs = Vec::new();
        for &n_estimators in &self.n_estimators {
            for &max_depth in &self.max_depth {
                for &max_features in &self.max_features {
                    for &min_samples_split in &self.min_samples_split {
                        for &min_samples_leaf in &self.min_samples_leaf {
                            for &bootstrap in &self.bootstrap {
                                specs.push(ModelSpec::RandomForest(RandomForestParams {
                                    n_estimators,
                                    max_depth,
                                    max_features,
                                    min_samples_split,
                                    min_samples_leaf,
                                    bootstrap,
                                    seed: self.seed,
                                }));
                            }
                        }
                    }
                }
            }
        }
        specs
    }
}

/// Cartesian-product grid over gradient-boosting hyper-parameters.
#[derive(Debug, Clone)]
pub struct GradientBoostingGrid {
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<u32>,
    pub num_boost_round: Vec<usize>,
    pub min_leaf_size: Vec<usize>,
    pub subsample: Vec<f64>,
    pub feature_sample_ratio: Vec<f64>,
}

impl GradientBoostingGrid {
    pub fn candidates(&self) -> Vec<ModelSpec> {
        let mut specs = Vec::new();
        for &learning_rate in &self.learning_rate {
            for &max_depth in &self.max_depth {
                for &num_boost_round in &self.num_boost_round {
                    for &min_leaf_size in &self.min_leaf_size {
                        for &subsample in &self.subsample {
                            for &feature_sample_ratio in &self.feature_sample_ratio {
                                specs.push(ModelSpec::GradientBoosting(GradientBoostingParams {
                                    learning_rate,
                                    max_depth,
                                    num_boost_round,
                                    min_leaf_size,
                                    subsample,
                                    feature_sample_ratio,
                                }));
                            }
                        }
                    }
                }
            }
        }
        specs
    }
}
