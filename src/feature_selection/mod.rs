//! Feature selection utilities.
//!
//! This module contains univariate selection routines (a la scikit-learn)
//! for scoring and ranking descriptor columns against a binary target.
pub mod univariate_selection;

pub use univariate_selection::{
    f_classif, select_best_descriptors, select_best_descriptors_multi, ScoreFunc, SelectKBest,
};
