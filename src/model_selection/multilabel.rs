use crate::config::ModelSpec;
use crate::data_handling::LabelDatasets;
use crate::error::PipelineError;
use crate::model_selection::search::{grid_search, random_search, SearchSettings};

/// Per-label candidate lists. Grids may differ arbitrarily in size and
/// shape between labels.
#[derive(Debug, Clone, Default)]
pub struct LabelGrids {
    grids: Vec<(String, Vec<ModelSpec>)>,
}

impl LabelGrids {
    pub fn from_pairs(grids: Vec<(String, Vec<ModelSpec>)>) -> Self {
        Self { grids }
    }

    /// The same candidate list for every label.
    pub fn uniform(labels: &[String], grid: Vec<ModelSpec>) -> Self {
        Self {
            grids: labels
                .iter()
                .map(|label| (label.clone(), grid.clone()))
                .collect(),
        }
    }

    pub fn get(&self, label: &str) -> Option<&[ModelSpec]> {
        self.grids
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, grid)| grid.as_slice())
    }
}

/// Winning configuration of one label's search.
#[derive(Debug, Clone)]
pub struct LabelSearchResult {
    pub label: String,
    pub best_spec: ModelSpec,
    pub best_score: f64,
    pub best_std: f64,
}

/// One label's failure, detached from the others' results.
#[derive(Debug)]
pub struct LabelFailure {
    pub label: String,
    pub error: PipelineError,
}

/// Outcome of a multi-label search: results for the labels that succeeded,
/// in label order, plus a manifest of the ones that failed. One label's
/// failure never discards another label's already-computed result.
#[derive(Debug, Default)]
pub struct MultiLabelSearch {
    pub results: Vec<LabelSearchResult>,
    pub failures: Vec<LabelFailure>,
}

impl MultiLabelSearch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The ordered label → best-configuration map consumed by the
    /// reporting engine.
    pub fn best_params(&self) -> BestParamsByLabel {
        BestParamsByLabel {
            params: self
                .results
                .iter()
                .map(|r| (r.label.clone(), r.best_spec.clone()))
                .collect(),
        }
    }
}

/// Ordered mapping from label name to best-found configuration.
#[derive(Debug, Clone, Default)]
pub struct BestParamsByLabel {
    params: Vec<(String, ModelSpec)>,
}

impl BestParamsByLabel {
    pub fn from_pairs(params: Vec<(String, ModelSpec)>) -> Self {
        Self { params }
    }

    pub fn get(&self, label: &str) -> Option<&ModelSpec> {
        self.params
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, spec)| spec)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.params.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelSpec)> {
        self.params
            .iter()
            .map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Run an independent grid search per label, sequentially, collecting a
/// best-configuration map. Labels share nothing: each search sees only its
/// own matrices, mask and grid.
pub fn multi_label_grid_search(
    datasets: &LabelDatasets,
    grids: &LabelGrids,
    settings: &SearchSettings,
) -> MultiLabelSearch {
    run_per_label(datasets, |dataset| {
        let grid = grids
            .get(&dataset.label)
            .ok_or(PipelineError::EmptyParameterGrid)?;
        grid_search(
            dataset.x_train.x(),
            &dataset.y_train,
            &dataset.mask,
            grid,
            settings,
        )
        .map(|outcome| (outcome.best_spec, outcome.best_score, outcome.best_std))
    })
}

/// Randomized counterpart of [`multi_label_grid_search`] with a fixed
/// iteration budget per label.
pub fn multi_label_random_search(
    datasets: &LabelDatasets,
    spaces: &LabelGrids,
    n_iter: usize,
    sample_seed: u64,
    settings: &SearchSettings,
) -> MultiLabelSearch {
    run_per_label(datasets, |dataset| {
        let space = spaces
            .get(&dataset.label)
            .ok_or(PipelineError::EmptyParameterGrid)?;
        random_search(
            dataset.x_train.x(),
            &dataset.y_train,
            &dataset.mask,
            space,
            n_iter,
            sample_seed,
            settings,
        )
        .map(|outcome| (outcome.best_spec, outcome.best_score, outcome.best_std))
    })
}

fn run_per_label<F>(datasets: &LabelDatasets, mut search_one: F) -> MultiLabelSearch
where
    F: FnMut(&crate::data_handling::LabelDataset) -> Result<(ModelSpec, f64, f64), PipelineError>,
{
    let mut outcome = MultiLabelSearch::default();

    for dataset in datasets {
        log::info!("Searching parameters for label '{}'", dataset.label);
        match search_one(dataset) {
            Ok((best_spec, best_score, best_std)) => {
                log::info!(
                    "Label '{}': best {} {:.3} (+/- {:.3})",
                    dataset.label,
                    best_spec.family(),
                    best_score,
                    best_std
                );
                outcome.results.push(LabelSearchResult {
                    label: dataset.label.clone(),
                    best_spec,
                    best_score,
                    best_std,
                });
            }
            Err(error) => {
                log::warn!("Label '{}' search failed: {}", dataset.label, error);
                outcome.failures.push(LabelFailure {
                    label: dataset.label.clone(),
                    error,
                });
            }
        }
    }

    outcome
}
