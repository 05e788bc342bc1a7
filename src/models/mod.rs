pub mod classifier_trait;
pub mod factory;
pub mod gbdt;
pub mod random_forest;
pub mod svc;
pub mod voting;

pub use classifier_trait::Classifier;
pub use factory::build_model;
