use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;

use crate::config::{MaxFeatures, RandomForestParams};
use crate::error::PipelineError;
use crate::models::classifier_trait::Classifier;

/// Random forest built from bagged CART trees.
///
/// Each tree is trained on a seeded bootstrap sample of the rows (or the
/// full set when `bootstrap` is off) restricted to a random feature subset
/// per `max_features`. The probability of the positive class is the
/// fraction of trees voting for it.
pub struct RandomForestClassifier {
    params: RandomForestParams,
    trees: Vec<TreeMember>,
}

struct TreeMember {
    tree: DecisionTree<f64, usize>,
    features: Vec<usize>,
}

impl RandomForestClassifier {
    pub fn new(params: RandomForestParams) -> Self {
        RandomForestClassifier {
            params,
            trees: Vec::new(),
        }
    }

    fn features_per_tree(&self, n_cols: usize) -> usize {
        let n = match self.params.max_features {
            MaxFeatures::All => n_cols,
            MaxFeatures::Sqrt => (n_cols as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_cols as f64).log2().ceil() as usize,
        };
        n.clamp(1, n_cols)
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<(), PipelineError> {
        let n_rows = x.nrows();
        let n_cols = x.ncols();
        let n_features = self.features_per_tree(n_cols);
        let y_class: Vec<usize> = y.iter().map(|&v| if v == 1 { 1 } else { 0 }).collect();

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        self.trees.clear();

        for _ in 0..self.params.n_estimators {
            let mut features: Vec<usize> = (0..n_cols).collect();
            if n_features < n_cols {
                features.shuffle(&mut rng);
                features.truncate(n_features);
                features.sort_unstable();
            }

            let rows: Vec<usize> = if self.params.bootstrap {
                (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
            } else {
                (0..n_rows).collect()
            };

            let x_sub = x.select(Axis(0), &rows).select(Axis(1), &features);
            let y_sub: Array1<usize> = rows.iter().map(|&r| y_class[r]).collect();
            let dataset = Dataset::new(x_sub, y_sub);

            let tree = DecisionTree::<f64, usize>::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(self.params.max_depth)
                .min_weight_split(self.params.min_samples_split as f32)
                .min_weight_leaf(self.params.min_samples_leaf as f32)
                .fit(&dataset)
                .map_err(|e| PipelineError::FitFailure {
                    family: "random_forest".to_string(),
                    message: e.to_string(),
                })?;

            self.trees.push(TreeMember { tree, features });
        }

        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError> {
        if self.trees.is_empty() {
            return Err(PipelineError::FitFailure {
                family: "random_forest".to_string(),
                message: "predict called before fit".to_string(),
            });
        }

        let mut votes = vec![0usize; x.nrows()];
        for member in &self.trees {
            let x_sub = x.select(Axis(1), &member.features);
            let predicted = member.tree.predict(x_sub);
            for (i, &class) in predicted.targets().iter().enumerate() {
                votes[i] += class;
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(Array1::from_vec(
            votes.into_iter().map(|v| v as f64 / n_trees).collect(),
        ))
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
