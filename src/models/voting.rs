use ndarray::{Array1, Array2};

use crate::config::VotingParams;
use crate::error::PipelineError;
use crate::models::classifier_trait::Classifier;
use crate::models::gbdt::GradientBoostingClassifier;
use crate::models::random_forest::RandomForestClassifier;
use crate::models::svc::SvcClassifier;

/// Soft-voting ensemble of the three base families (SVC, random forest,
/// gradient boosting): the predicted probability is the unweighted mean of
/// the members' probabilities.
pub struct VotingClassifier {
    svc: SvcClassifier,
    forest: RandomForestClassifier,
    boosting: GradientBoostingClassifier,
}

impl VotingClassifier {
    pub fn new(params: VotingParams) -> Self {
        VotingClassifier {
            svc: SvcClassifier::new(params.svc),
            forest: RandomForestClassifier::new(params.random_forest),
            boosting: GradientBoostingClassifier::new(params.gradient_boosting),
        }
    }
}

impl Classifier for VotingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<(), PipelineError> {
        self.svc.fit(x, y)?;
        self.forest.fit(x, y)?;
        self.boosting.fit(x, y)?;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError> {
        let a = self.svc.predict_proba(x)?;
        let b = self.forest.predict_proba(x)?;
        let c = self.boosting.predict_proba(x)?;
        Ok((&a + &b + &c) / 3.0)
    }

    fn name(&self) -> &str {
        "voting_ensemble"
    }
}
