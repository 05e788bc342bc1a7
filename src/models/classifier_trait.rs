use ndarray::{Array1, Array2};

use crate::error::PipelineError;

/// Contract shared by all estimator families searched by this crate.
///
/// Targets use 0/1 with `1` as the positive class. All implementations must
/// produce class probabilities: average precision and the precision-recall
/// curves in the reporting engine cannot be computed from hard labels.
pub trait Classifier: Send {
    /// Fit the model on a training matrix and aligned binary targets.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<(), PipelineError>;

    /// Probability of the positive class for each row, in [0, 1].
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError>;

    /// Hard 0/1 predictions; defaults to thresholding probabilities at 0.5.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>, PipelineError> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p >= 0.5 { 1 } else { 0 }))
    }

    /// Human readable model-family name, used in diagnostics.
    fn name(&self) -> &str {
        "classifier"
    }
}
