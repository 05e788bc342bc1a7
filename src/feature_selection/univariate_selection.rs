//! Univariate feature selection methods following scikit-learn's API.
//!
//! See: https://scikit-learn.org/stable/modules/feature_selection.html#univariate-feature-selection

use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::data_handling::FeatureFrame;
use crate::error::PipelineError;

/// Compute row-wise (squared) Euclidean norms of a 2D array.
pub fn row_norms<S>(x: &ArrayBase<S, Ix2>, squared: bool) -> Array1<f64>
where
    S: Data<Elem = f64>,
{
    let n_samples = x.nrows();
    let mut norms = Array1::zeros(n_samples);

    for (i, row) in x.axis_iter(Axis(0)).enumerate() {
        let sum_of_squares: f64 = row.iter().map(|&val| val.powi(2)).sum();
        norms[i] = if squared {
            sum_of_squares
        } else {
            sum_of_squares.sqrt()
        };
    }

    norms
}

/// Compute Pearson's r for each feature and the target.
///
/// Tests the individual effect of each regressor on the target variable.
/// With `center` both `x` and `y` are mean-centered first; `force_finite`
/// replaces non-finite coefficients (constant columns, zero-variance target)
/// with 0.0.
pub fn r_regression(
    x: &Array2<f64>,
    y: &Array1<f64>,
    center: bool,
    force_finite: bool,
) -> Array1<f64> {
    let n_samples = x.nrows() as f64;
    let n_features = x.ncols();

    let mut y_centered = y.to_owned();
    let mut x_means = Array1::zeros(n_features);
    let x_norms;

    if center {
        let y_mean = y.mean().unwrap_or(0.0);
        y_centered -= y_mean;

        for (i, col) in x.columns().into_iter().enumerate() {
            x_means[i] = col.mean().unwrap_or(0.0);
        }

        // Scaled standard deviations via moments
        let x_squared_norms = row_norms(&x.t(), true);
        x_norms = (&x_squared_norms - n_samples * &x_means.mapv(|m| m.powi(2)))
            .mapv(|v| v.max(0.0).sqrt());
    } else {
        x_norms = row_norms(&x.t(), false);
    }

    let mut correlation_coefficient = Array1::zeros(n_features);
    for (i, col) in x.columns().into_iter().enumerate() {
        let centered_col = if center {
            col.mapv(|v| v - x_means[i])
        } else {
            col.to_owned()
        };
        correlation_coefficient[i] = centered_col.dot(&y_centered);
    }

    let y_norm = y_centered.dot(&y_centered).sqrt();

    correlation_coefficient /= &x_norms;
    correlation_coefficient /= y_norm;

    if force_finite {
        for val in correlation_coefficient.iter_mut() {
            if !val.is_finite() {
                *val = 0.0;
            }
        }
    }

    correlation_coefficient
}

/// Univariate linear regression tests returning F-statistic and p-values.
pub fn f_regression(
    x: &Array2<f64>,
    y: &Array1<f64>,
    center: bool,
    force_finite: bool,
) -> (Array1<f64>, Array1<f64>) {
    let correlation_coefficient = r_regression(x, y, center, force_finite);
    let deg_of_freedom = y.len() as f64 - if center { 2.0 } else { 1.0 };

    let corr_coef_squared = correlation_coefficient.mapv(|v| v.powi(2));

    let mut f_statistic = &corr_coef_squared / (1.0 - &corr_coef_squared) * deg_of_freedom;
    let mut p_values = Array1::zeros(f_statistic.len());

    let f_dist = FisherSnedecor::new(1.0, deg_of_freedom).expect("valid degrees of freedom");
    for (i, &f) in f_statistic.iter().enumerate() {
        p_values[i] = if f.is_finite() { 1.0 - f_dist.cdf(f) } else { 0.0 };
    }

    if force_finite {
        for i in 0..f_statistic.len() {
            if !f_statistic[i].is_finite() {
                if f_statistic[i].is_infinite() {
                    f_statistic[i] = f64::MAX;
                    p_values[i] = 0.0;
                } else {
                    f_statistic[i] = 0.0;
                    p_values[i] = 1.0;
                }
            }
        }
    }

    (f_statistic, p_values)
}

/// One-way ANOVA F-statistic and p-values for each feature against a class
/// target (scikit-learn's `f_classif`).
///
/// Constant columns get an F of 0.0 and a p-value of 1.0.
pub fn f_classif(x: &Array2<f64>, y: &Array1<i32>) -> (Array1<f64>, Array1<f64>) {
    let n_samples = x.nrows();
    let n_features = x.ncols();
    assert_eq!(
        y.len(),
        n_samples,
        "target length must match number of rows"
    );

    // Group row indices per class value
    let mut classes: Vec<i32> = y.iter().copied().collect();
    classes.sort_unstable();
    classes.dedup();
    let groups: Vec<Vec<usize>> = classes
        .iter()
        .map(|&c| {
            y.iter()
                .enumerate()
                .filter_map(|(i, &v)| if v == c { Some(i) } else { None })
                .collect()
        })
        .collect();

    let k = groups.len();
    let mut f_statistic = Array1::zeros(n_features);
    let mut p_values = Array1::ones(n_features);

    if k < 2 || n_samples <= k {
        log::warn!("f_classif: need at least two classes and n > k, returning zeros");
        return (f_statistic, p_values);
    }

    let dfb = (k - 1) as f64;
    let dfw = (n_samples - k) as f64;
    let f_dist = FisherSnedecor::new(dfb, dfw).expect("valid degrees of freedom");

    for (j, col) in x.columns().into_iter().enumerate() {
        let grand_mean = col.mean().unwrap_or(0.0);

        let mut ss_between = 0.0;
        let mut ss_within = 0.0;
        for group in &groups {
            let n_g = group.len() as f64;
            let mean_g = group.iter().map(|&i| col[i]).sum::<f64>() / n_g;
            ss_between += n_g * (mean_g - grand_mean).powi(2);
            ss_within += group.iter().map(|&i| (col[i] - mean_g).powi(2)).sum::<f64>();
        }

        let f = (ss_between / dfb) / (ss_within / dfw);
        if f.is_finite() {
            f_statistic[j] = f;
            p_values[j] = 1.0 - f_dist.cdf(f);
        } else if ss_between > 0.0 {
            // Perfect separation: within-group variance is zero
            f_statistic[j] = f64::MAX;
            p_values[j] = 0.0;
        }
        // Constant column: leave F = 0, p = 1
    }

    (f_statistic, p_values)
}

/// Scoring function used to rank features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFunc {
    /// One-way ANOVA F between class groups (default for classification).
    AnovaF,
    /// Pearson-correlation-based F (linear regression test).
    PearsonF,
}

impl ScoreFunc {
    pub fn scores(&self, x: &Array2<f64>, y: &Array1<i32>) -> Array1<f64> {
        match self {
            ScoreFunc::AnovaF => f_classif(x, y).0,
            ScoreFunc::PearsonF => {
                let y_f = y.mapv(|v| v as f64);
                f_regression(x, &y_f, true, true).0
            }
        }
    }
}

/// Selects the k highest-scoring features against a binary target.
///
/// When `k` exceeds the number of available columns the selection degrades
/// to all columns; callers must tolerate shorter results.
pub struct SelectKBest {
    k: usize,
    score_func: ScoreFunc,
}

impl SelectKBest {
    pub fn new(k: usize, score_func: ScoreFunc) -> Self {
        SelectKBest { k, score_func }
    }

    /// Fit against `(x, y)` and return the selected column indices in
    /// matrix order.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<i32>) -> Vec<usize> {
        let scores = self.score_func.scores(x, y);

        let mut indices: Vec<usize> = (0..scores.len()).collect();
        // Stable sort, highest score first
        indices.sort_by(|&i, &j| {
            scores[j]
                .partial_cmp(&scores[i])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let take = self.k.min(indices.len());
        if take < self.k {
            log::warn!(
                "SelectKBest: requested k={} but only {} columns available",
                self.k,
                indices.len()
            );
        }
        let mut selected: Vec<usize> = indices.into_iter().take(take).collect();
        selected.sort_unstable();
        selected
    }
}

/// Select the `k` best descriptor columns of `frame` for one target,
/// returned as column names in matrix order.
pub fn select_best_descriptors(
    frame: &FeatureFrame,
    y: &Array1<i32>,
    score_func: ScoreFunc,
    k: usize,
) -> Vec<String> {
    let selector = SelectKBest::new(k, score_func);
    selector
        .fit(frame.x(), y)
        .into_iter()
        .map(|idx| frame.names()[idx].clone())
        .collect()
}

/// Per-label selection followed by a union across labels: the deduplicated
/// column names in order of first appearance. Used to build one shared
/// reduced descriptor pool when a single shared model is wanted.
pub fn select_best_descriptors_multi(
    frame: &FeatureFrame,
    targets: &crate::data_handling::LabelFrame,
    out_names: &[String],
    score_func: ScoreFunc,
    k: usize,
) -> Result<Vec<String>, PipelineError> {
    if out_names.is_empty() {
        return Err(PipelineError::MissingLabelList);
    }

    let mut selected: Vec<String> = Vec::new();
    for name in out_names {
        let y = targets.column(name)?;
        for col in select_best_descriptors(frame, &y, score_func, k) {
            if !selected.contains(&col) {
                selected.push(col);
            }
        }
    }
    Ok(selected)
}
