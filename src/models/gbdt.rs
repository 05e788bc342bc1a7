use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::{Array1, Array2};

use crate::config::GradientBoostingParams;
use crate::error::PipelineError;
use crate::models::classifier_trait::Classifier;

/// Gradient Boosting Decision Tree (GBDT) classifier.
///
/// Trains with log-likelihood loss on ±1 labels, so predictions come back
/// as probabilities of the positive class.
pub struct GradientBoostingClassifier {
    params: GradientBoostingParams,
    model: Option<GBDT>,
}

impl GradientBoostingClassifier {
    pub fn new(params: GradientBoostingParams) -> Self {
        GradientBoostingClassifier {
            params,
            model: None,
        }
    }
}

impl Classifier for GradientBoostingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<(), PipelineError> {
        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(self.params.learning_rate as f32);
        config.set_max_depth(self.params.max_depth);
        config.set_iterations(self.params.num_boost_round);
        config.set_min_leaf_size(self.params.min_leaf_size);
        config.set_data_sample_ratio(self.params.subsample);
        config.set_feature_sample_ratio(self.params.feature_sample_ratio);
        config.set_loss("LogLikelyhood");
        config.set_debug(false);
        config.set_training_optimization_level(2);

        let mut gbdt = GBDT::new(&config);

        let mut train_x = DataVec::new();
        for (i, row) in x.rows().into_iter().enumerate() {
            let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
            let label = if y[i] == 1 { 1.0 } else { -1.0 };
            train_x.push(Data::new_training_data(features, 1.0, label, None));
        }

        gbdt.fit(&mut train_x);
        self.model = Some(gbdt);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError> {
        let model = self.model.as_ref().ok_or_else(|| PipelineError::FitFailure {
            family: "gradient_boosting".to_string(),
            message: "predict called before fit".to_string(),
        })?;

        let mut test_x = DataVec::new();
        for row in x.rows() {
            let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
            test_x.push(Data::new_training_data(features, 1.0, 0.0, None));
        }

        let predictions = model.predict(&test_x);
        Ok(Array1::from_vec(
            predictions
                .iter()
                .map(|&p| (p as f64).clamp(0.0, 1.0))
                .collect(),
        ))
    }

    fn name(&self) -> &str {
        "gradient_boosting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gbdt_fits_and_predicts_probabilities() {
        let x = Array2::from_shape_vec(
            (10, 5),
            vec![
                0.1, 1.0, 5.0, 0.2, -0.3, //
                0.4, -1.0, 5.0, 0.8, 0.1, //
                0.6, 1.0, 5.0, 1.2, 0.2, //
                0.9, -1.0, 5.0, 1.8, -0.1, //
                1.2, 1.0, 5.0, 2.4, 0.3, //
                1.5, -1.0, 5.0, 3.0, 0.0, //
                1.8, 1.0, 5.0, 3.6, -0.2, //
                2.1, -1.0, 5.0, 4.2, 0.4, //
                2.4, 1.0, 5.0, 4.8, -0.1, //
                2.7, -1.0, 5.0, 5.4, 0.2,
            ],
        )
        .unwrap();
        let y = Array1::from_vec(vec![1, 0, 1, 0, 1, 0, 1, 0, 1, 0]);

        let mut model = GradientBoostingClassifier::new(GradientBoostingParams {
            max_depth: 3,
            num_boost_round: 10,
            ..GradientBoostingParams::default()
        });
        model.fit(&x, &y).unwrap();

        let probs = model.predict_proba(&x).unwrap();
        assert_eq!(probs.len(), 10);
        for p in probs.iter() {
            assert!((0.0..=1.0).contains(p), "probability out of range: {}", p);
        }

        // The second feature separates classes perfectly; the model should
        // rank positives above negatives
        let preds = model.predict(&x).unwrap();
        let correct = preds.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert!(correct >= 8, "only {} of 10 correct", correct);
    }
}
