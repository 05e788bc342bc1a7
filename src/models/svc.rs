use linfa::dataset::Pr;
use linfa::traits::Predict;
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2};

use crate::config::{Gamma, Kernel, SvcParams};
use crate::error::PipelineError;
use crate::models::classifier_trait::Classifier;

/// Support-vector classifier with Platt-scaled probability output.
pub struct SvcClassifier {
    params: SvcParams,
    model: Option<Svm<f64, Pr>>,
}

impl SvcClassifier {
    pub fn new(params: SvcParams) -> Self {
        SvcClassifier {
            params,
            model: None,
        }
    }
}

/// Resolve the RBF bandwidth. `Gamma::Scale` follows scikit-learn:
/// `gamma = 1 / (n_features * var(X))`, with the kernel width being the
/// reciprocal of gamma.
fn rbf_eps(gamma: Gamma, x: &Array2<f64>) -> f64 {
    let g = match gamma {
        Gamma::Value(v) => v,
        Gamma::Scale => {
            let n = x.len() as f64;
            let mean = x.sum() / n;
            let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let denom = x.ncols() as f64 * var;
            if denom > 0.0 {
                1.0 / denom
            } else {
                1.0
            }
        }
    };
    1.0 / g.max(f64::EPSILON)
}

impl Classifier for SvcClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<(), PipelineError> {
        let targets = y.mapv(|v| v == 1);
        let dataset = Dataset::new(x.to_owned(), targets);

        let mut model: SvmParams<f64, Pr> = Svm::<f64, Pr>::params()
            .eps(self.params.eps)
            .pos_neg_weights(self.params.c, self.params.c);

        model = match &self.params.kernel {
            Kernel::Linear => model.linear_kernel(),
            Kernel::Rbf { gamma } => model.gaussian_kernel(rbf_eps(*gamma, x)),
            Kernel::Poly { constant, degree } => model.polynomial_kernel(*constant, *degree),
        };

        let fitted = <SvmParams<f64, Pr> as linfa::traits::Fit<_, _, _>>::fit(&model, &dataset)
            .map_err(|e| PipelineError::FitFailure {
                family: "svc".to_string(),
                message: e.to_string(),
            })?;
        self.model = Some(fitted);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, PipelineError> {
        let model = self.model.as_ref().ok_or_else(|| PipelineError::FitFailure {
            family: "svc".to_string(),
            message: "predict called before fit".to_string(),
        })?;

        let predictions = model.predict(x.to_owned());
        let probs: Vec<f64> = predictions
            .targets()
            .iter()
            .map(|&p| (*p as f64).clamp(0.0, 1.0))
            .collect();
        Ok(Array1::from_vec(probs))
    }

    fn name(&self) -> &str {
        "svc"
    }
}
