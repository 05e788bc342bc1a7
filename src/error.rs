use std::error::Error;
use std::fmt;

/// Errors raised by the selection, balancing, search and reporting stages.
///
/// Configuration problems and statistical infeasibility are surfaced through
/// this type so callers can tell them apart; I/O paths use `anyhow` instead.
#[derive(Debug)]
pub enum PipelineError {
    /// A grid/random search was invoked with no candidate configurations.
    EmptyParameterGrid,
    /// A multi-label operation was invoked with an empty label-name list.
    MissingLabelList,
    /// A named column was requested that the frame does not contain.
    UnknownColumn(String),
    /// Two row-aligned or column-aligned structures disagree in size.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The categorical mask does not match the matrix it is applied to.
    MaskMismatch { mask_len: usize, ncols: usize },
    /// Stratified splitting is impossible: a class has fewer members than
    /// the requested number of folds.
    InfeasibleStratification {
        class: i32,
        count: usize,
        n_splits: usize,
    },
    /// Fewer than two folds requested.
    InvalidFoldCount(usize),
    /// The minority class is too small to synthesize neighbours from.
    TooFewMinoritySamples(usize),
    /// No model configuration was supplied for a label that needs one.
    MissingModelSpec { label: String },
    /// An estimator failed during fit, identified by model family.
    FitFailure { family: String, message: String },
    /// An estimator produced unusable (non-finite) class probabilities.
    ProbabilityUnsupported { family: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::EmptyParameterGrid => {
                write!(f, "Parameter grid is empty, nothing to search")
            }
            PipelineError::MissingLabelList => {
                write!(f, "Label-name list is required and was empty")
            }
            PipelineError::UnknownColumn(name) => {
                write!(f, "Column '{}' not present in frame", name)
            }
            PipelineError::DimensionMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{}: expected {}, got {}", what, expected, actual),
            PipelineError::MaskMismatch { mask_len, ncols } => write!(
                f,
                "Categorical mask has {} entries but matrix has {} columns",
                mask_len, ncols
            ),
            PipelineError::InfeasibleStratification {
                class,
                count,
                n_splits,
            } => write!(
                f,
                "Class {} has {} members, fewer than the {} requested folds",
                class, count, n_splits
            ),
            PipelineError::InvalidFoldCount(n) => {
                write!(f, "Cross-validation requires at least 2 folds, got {}", n)
            }
            PipelineError::TooFewMinoritySamples(count) => write!(
                f,
                "Minority class has {} samples, need at least 2 to synthesize",
                count
            ),
            PipelineError::MissingModelSpec { label } => {
                write!(f, "No model configuration provided for label '{}'", label)
            }
            PipelineError::FitFailure { family, message } => {
                write!(f, "{} estimator failed to fit: {}", family, message)
            }
            PipelineError::ProbabilityUnsupported { family } => write!(
                f,
                "{} estimator did not produce finite class probabilities",
                family
            ),
        }
    }
}

impl Error for PipelineError {}
