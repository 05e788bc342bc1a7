use crate::config::ModelSpec;
use crate::models::classifier_trait::Classifier;
use crate::models::gbdt::GradientBoostingClassifier;
use crate::models::random_forest::RandomForestClassifier;
use crate::models::svc::SvcClassifier;
use crate::models::voting::VotingClassifier;

/// Build a boxed, unfitted classifier from a `ModelSpec`.
///
/// `ModelSpec` is a closed enum, so unsupported families cannot reach this
/// function; every fold and refit constructs a fresh estimator through here.
pub fn build_model(spec: &ModelSpec) -> Box<dyn Classifier> {
    match spec {
        ModelSpec::Svc(params) => Box::new(SvcClassifier::new(params.clone())),
        ModelSpec::RandomForest(params) => Box::new(RandomForestClassifier::new(params.clone())),
        ModelSpec::GradientBoosting(params) => {
            Box::new(GradientBoostingClassifier::new(params.clone()))
        }
        ModelSpec::VotingEnsemble(params) => {
            Box::new(VotingClassifier::new((**params).clone()))
        }
    }
}
