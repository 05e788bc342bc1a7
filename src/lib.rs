//! sider-classifiers: machine-learning helpers for multi-label side-effect
//! prediction.
//!
//! This crate provides the model-selection and evaluation harness used to
//! benchmark binary side-effect classifiers on molecular fingerprint and
//! descriptor tables: per-label univariate feature selection, SMOTE-NC class
//! balancing, stratified cross-validated grid/random search over a closed set
//! of model families (SVC, random forest, gradient boosting, soft-voting
//! ensemble), and per-label metric reporting.
//!
//! Fingerprint and descriptor computation is out of scope: callers hand in
//! numeric [`data_handling::FeatureFrame`] tables (or a provider closure for
//! the fingerprint-length sweep) and get tabular reports back.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod feature_selection;
pub mod io;
pub mod model_selection;
pub mod models;
pub mod report;
pub mod sampling;
pub mod stats;
pub mod sweep;
