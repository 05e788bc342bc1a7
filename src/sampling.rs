//! SMOTE-NC minority oversampling for mixed categorical/continuous features.
//!
//! Synthetic minority rows are generated by interpolating continuous
//! features between a minority sample and one of its nearest minority
//! neighbours; categorical features (fingerprint bits) are set by majority
//! vote among the neighbours. Distances include the median of the
//! continuous-feature standard deviations for every categorical mismatch,
//! following Chawla et al.'s SMOTE-NC formulation.
//!
//! Balancing must only ever see training data; the search and reporting
//! engines compose it inside the fit phase of each fold.
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::data_handling::CategoricalMask;
use crate::error::PipelineError;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct SmoteSettings {
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for SmoteSettings {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 0,
        }
    }
}

pub struct SmoteNc {
    settings: SmoteSettings,
}

impl SmoteNc {
    pub fn new(settings: SmoteSettings) -> Self {
        Self { settings }
    }

    /// Resample `(x, y)` to a 1:1 class ratio by synthesizing minority rows.
    ///
    /// Original rows are passed through unchanged; synthetic rows are
    /// appended. For a majority count M the result has 2×M rows.
    pub fn fit_resample(
        &self,
        x: &Array2<f64>,
        y: &Array1<i32>,
        mask: &CategoricalMask,
    ) -> Result<(Array2<f64>, Array1<i32>), PipelineError> {
        if x.nrows() != y.len() {
            return Err(PipelineError::DimensionMismatch {
                what: "feature rows vs target length",
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        mask.check_matches(x.ncols())?;

        let positives: Vec<usize> = (0..y.len()).filter(|&i| y[i] == 1).collect();
        let negatives: Vec<usize> = (0..y.len()).filter(|&i| y[i] != 1).collect();

        if positives.len() == negatives.len() {
            log::debug!("SMOTE-NC: classes already balanced, nothing to do");
            return Ok((x.clone(), y.clone()));
        }

        let (minority, minority_class, majority_count) = if positives.len() < negatives.len() {
            (positives, 1, negatives.len())
        } else {
            (negatives, 0, positives.len())
        };

        let m = minority.len();
        if m < 2 {
            return Err(PipelineError::TooFewMinoritySamples(m));
        }

        let mut k = self.settings.k_neighbors;
        if k > m - 1 {
            log::warn!(
                "SMOTE-NC: clamping k_neighbors from {} to {} (minority size {})",
                k,
                m - 1,
                m
            );
            k = m - 1;
        }

        let continuous = mask.continuous_indices();
        let categorical = mask.categorical_indices();
        let med = median_continuous_std(x, &minority, &continuous);

        let neighbors = nearest_neighbors(x, &minority, &continuous, &categorical, med, k);

        let n_synthetic = majority_count - m;
        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        let ncols = x.ncols();

        let mut data: Vec<f64> = Vec::with_capacity((x.nrows() + n_synthetic) * ncols);
        data.extend(x.iter().copied());

        for _ in 0..n_synthetic {
            let base_pos = rng.gen_range(0..m);
            let base = minority[base_pos];
            let nbr = neighbors[base_pos][rng.gen_range(0..k)];
            let gap: f64 = rng.gen();

            let mut row = vec![0.0; ncols];
            for &c in &continuous {
                row[c] = x[(base, c)] + gap * (x[(nbr, c)] - x[(base, c)]);
            }
            for &c in &categorical {
                row[c] = neighborhood_mode(x, &neighbors[base_pos], c);
            }
            data.extend_from_slice(&row);
        }

        let x_balanced = Array2::from_shape_vec((x.nrows() + n_synthetic, ncols), data)
            .expect("row-major shape");
        let mut y_balanced = Vec::with_capacity(y.len() + n_synthetic);
        y_balanced.extend(y.iter().copied());
        y_balanced.extend(std::iter::repeat(minority_class).take(n_synthetic));

        log::debug!(
            "SMOTE-NC: {} -> {} rows ({} synthetic class-{} samples)",
            x.nrows(),
            x.nrows() + n_synthetic,
            n_synthetic,
            minority_class
        );

        Ok((x_balanced, Array1::from_vec(y_balanced)))
    }
}

/// Median of the per-column standard deviations of the continuous features,
/// computed over the minority rows. Falls back to 1.0 when no continuous
/// columns are present so categorical mismatches still separate rows.
fn median_continuous_std(x: &Array2<f64>, minority: &[usize], continuous: &[usize]) -> f64 {
    if continuous.is_empty() {
        return 1.0;
    }
    let sub = x.select(Axis(0), minority);
    let n = sub.nrows() as f64;
    let mut stds: Vec<f64> = continuous
        .iter()
        .map(|&c| {
            let col = sub.column(c);
            let mean = col.sum() / n;
            (col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
        })
        .collect();
    stds.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = stds.len() / 2;
    if stds.len() % 2 == 1 {
        stds[mid]
    } else {
        (stds[mid - 1] + stds[mid]) / 2.0
    }
}

/// For each minority row, the k nearest other minority rows (by squared
/// Euclidean distance over continuous features, plus `med²` for every
/// categorical mismatch).
fn nearest_neighbors(
    x: &Array2<f64>,
    minority: &[usize],
    continuous: &[usize],
    categorical: &[usize],
    med: f64,
    k: usize,
) -> Vec<Vec<usize>> {
    let med_sq = med * med;
    minority
        .iter()
        .map(|&i| {
            let mut dists: Vec<(f64, usize)> = minority
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| {
                    let mut d = 0.0;
                    for &c in continuous {
                        let diff = x[(i, c)] - x[(j, c)];
                        d += diff * diff;
                    }
                    for &c in categorical {
                        if x[(i, c)] != x[(j, c)] {
                            d += med_sq;
                        }
                    }
                    (d, j)
                })
                .collect();
            dists.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

/// Most frequent value of column `c` among the neighbour rows; ties go to
/// the smallest value so the vote is deterministic.
fn neighborhood_mode(x: &Array2<f64>, neighbors: &[usize], c: usize) -> f64 {
    let mut values: Vec<f64> = neighbors.iter().map(|&j| x[(j, c)]).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut best = values[0];
    let mut best_count = 0usize;
    let mut idx = 0;
    while idx < values.len() {
        let v = values[idx];
        let mut count = 0;
        while idx < values.len() && values[idx] == v {
            count += 1;
            idx += 1;
        }
        if count > best_count {
            best = v;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_toy() -> (Array2<f64>, Array1<i32>, CategoricalMask) {
        // 10 fingerprint bits + 2 descriptors, 15 negatives and 5 positives
        let ncols = 12;
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for i in 0..15 {
            let mut row = vec![0.0; ncols];
            row[i % 10] = 1.0;
            row[10] = i as f64;
            row[11] = -(i as f64);
            rows.push(row);
            y.push(0);
        }
        for i in 0..5 {
            let mut row = vec![0.0; ncols];
            row[0] = 1.0;
            row[1] = 1.0;
            row[10] = 100.0 + i as f64;
            row[11] = 50.0 + i as f64;
            rows.push(row);
            y.push(1);
        }
        let data: Vec<f64> = rows.into_iter().flatten().collect();
        let x = Array2::from_shape_vec((20, ncols), data).unwrap();
        (x, Array1::from_vec(y), CategoricalMask::from_layout(10, 2))
    }

    #[test]
    fn resample_reaches_one_to_one_ratio() {
        let (x, y, mask) = imbalanced_toy();
        let smote = SmoteNc::new(SmoteSettings::default());
        let (xb, yb) = smote.fit_resample(&x, &y, &mask).unwrap();

        let pos = yb.iter().filter(|&&v| v == 1).count();
        let neg = yb.iter().filter(|&&v| v == 0).count();
        assert_eq!(pos, 15);
        assert_eq!(neg, 15);
        assert_eq!(xb.nrows(), 30);
        assert_eq!(xb.ncols(), x.ncols());
    }

    #[test]
    fn synthetic_categorical_values_come_from_neighbors() {
        let (x, y, mask) = imbalanced_toy();
        let smote = SmoteNc::new(SmoteSettings::default());
        let (xb, _) = smote.fit_resample(&x, &y, &mask).unwrap();

        // All categorical cells must be valid fingerprint bits
        for row in x.nrows()..xb.nrows() {
            for col in 0..10 {
                let v = xb[(row, col)];
                assert!(v == 0.0 || v == 1.0, "bit column got {}", v);
            }
            // Continuous cells interpolate within the minority range
            assert!(xb[(row, 10)] >= 100.0 && xb[(row, 10)] <= 104.0);
        }
    }

    #[test]
    fn resample_is_deterministic_under_fixed_seed() {
        let (x, y, mask) = imbalanced_toy();
        let smote = SmoteNc::new(SmoteSettings {
            k_neighbors: 3,
            seed: 42,
        });
        let (xa, ya) = smote.fit_resample(&x, &y, &mask).unwrap();
        let (xb, yb) = smote.fit_resample(&x, &y, &mask).unwrap();
        assert_eq!(xa, xb);
        assert_eq!(ya, yb);
    }

    #[test]
    fn mask_mismatch_is_rejected() {
        let (x, y, _) = imbalanced_toy();
        let wrong = CategoricalMask::from_layout(5, 2);
        let smote = SmoteNc::new(SmoteSettings::default());
        assert!(matches!(
            smote.fit_resample(&x, &y, &wrong),
            Err(PipelineError::MaskMismatch { .. })
        ));
    }

    #[test]
    fn singleton_minority_is_rejected() {
        let x = Array2::from_shape_vec((3, 2), vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]).unwrap();
        let y = Array1::from_vec(vec![0, 0, 1]);
        let mask = CategoricalMask::from_layout(0, 2);
        let smote = SmoteNc::new(SmoteSettings::default());
        assert!(matches!(
            smote.fit_resample(&x, &y, &mask),
            Err(PipelineError::TooFewMinoritySamples(1))
        ));
    }
}
