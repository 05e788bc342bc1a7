//! Cross-validated model selection.
//!
//! Stratified fold construction, the cross-validation loop with fit-only
//! class balancing, grid/random hyper-parameter search, and the sequential
//! multi-label orchestration on top of them.
pub mod multilabel;
pub mod search;
pub mod split;
pub mod validate;

pub use multilabel::{
    multi_label_grid_search, multi_label_random_search, BestParamsByLabel, LabelFailure,
    LabelGrids, LabelSearchResult, MultiLabelSearch,
};
pub use search::{
    grid_search, random_search, CandidateScore, Scoring, SearchOutcome, SearchSettings,
};
pub use split::{Fold, StratifiedKFold};
pub use validate::{cross_validate, CrossValidation, Parallelism, ValidationSettings};
