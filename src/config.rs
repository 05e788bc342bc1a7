use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SVC kernel choice.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf { gamma: Gamma },
    Poly { constant: f64, degree: f64 },
}

/// RBF bandwidth: a fixed value, or scikit-learn's "scale" heuristic
/// `1 / (n_features * var(X))` resolved at fit time.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    Scale,
    Value(f64),
}

/// Feature-subset size sampled per tree of a random forest.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SvcParams {
    pub c: f64,
    pub kernel: Kernel,
    /// Solver stopping tolerance.
    pub eps: f64,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: Kernel::Rbf {
                gamma: Gamma::Scale,
            },
            eps: 1e-3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    /// Seed for bootstrap row sampling and feature subsampling.
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GradientBoostingParams {
    pub learning_rate: f64,
    pub max_depth: u32,
    pub num_boost_round: usize,
    pub min_leaf_size: usize,
    /// Row subsampling ratio per boosting round. Values below 1.0 trade
    /// determinism for regularization (the underlying library draws from a
    /// thread-local RNG).
    pub subsample: f64,
    pub feature_sample_ratio: f64,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_depth: 6,
            num_boost_round: 50,
            min_leaf_size: 1,
            subsample: 1.0,
            feature_sample_ratio: 1.0,
        }
    }
}

/// Member configurations of the soft-voting ensemble, in fixed order
/// (SVC, random forest, gradient boosting).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct VotingParams {
    pub svc: SvcParams,
    pub random_forest: RandomForestParams,
    pub gradient_boosting: GradientBoostingParams,
}

/// A fully specified estimator configuration: one of the supported model
/// families together with its typed hyper-parameter record.
///
/// The parameter grids searched per label are plain `Vec<ModelSpec>` lists,
/// so per-label search spaces may differ arbitrarily in size and shape.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelSpec {
    Svc(SvcParams),
    RandomForest(RandomForestParams),
    GradientBoosting(GradientBoostingParams),
    VotingEnsemble(Box<VotingParams>),
}

impl ModelSpec {
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelSpec::Svc(_) => ModelFamily::Svc,
            ModelSpec::RandomForest(_) => ModelFamily::RandomForest,
            ModelSpec::GradientBoosting(_) => ModelFamily::GradientBoosting,
            ModelSpec::VotingEnsemble(_) => ModelFamily::VotingEnsemble,
        }
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::GradientBoosting(GradientBoostingParams::default())
    }
}

/// Model family tag without hyper-parameters. Used for CLI-style selection;
/// [`ModelFamily::default_spec`] attaches the default parameter record.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    Svc,
    RandomForest,
    GradientBoosting,
    VotingEnsemble,
}

impl ModelFamily {
    pub fn default_spec(&self) -> ModelSpec {
        match self {
            ModelFamily::Svc => ModelSpec::Svc(SvcParams::default()),
            ModelFamily::RandomForest => ModelSpec::RandomForest(RandomForestParams::default()),
            ModelFamily::GradientBoosting => {
                ModelSpec::GradientBoosting(GradientBoostingParams::default())
            }
            ModelFamily::VotingEnsemble => {
                ModelSpec::VotingEnsemble(Box::new(VotingParams::default()))
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Svc => "svc",
            ModelFamily::RandomForest => "random_forest",
            ModelFamily::GradientBoosting => "gradient_boosting",
            ModelFamily::VotingEnsemble => "voting_ensemble",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "svc" | "svm" => Ok(ModelFamily::Svc),
            "rf" | "random_forest" => Ok(ModelFamily::RandomForest),
            "gbt" | "gradient_boosting" => Ok(ModelFamily::GradientBoosting),
            "voting" | "voting_ensemble" => Ok(ModelFamily::VotingEnsemble),
            _ => Err(format!(
                "Unknown model family: {}. Valid options: svc, random_forest, gradient_boosting, voting_ensemble",
                s
            )),
        }
    }
}
