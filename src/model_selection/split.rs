use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;

/// One cross-validation fold: row indices for fitting and validation.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Stratified k-fold splitter: every fold preserves the per-class
/// proportions of the full target vector.
///
/// Splitting fails hard when a class has fewer members than `n_splits`;
/// silently reducing the fold count would change the benchmark.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    pub n_splits: usize,
    pub seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    pub fn split(&self, y: &Array1<i32>) -> Result<Vec<Fold>, PipelineError> {
        if self.n_splits < 2 {
            return Err(PipelineError::InvalidFoldCount(self.n_splits));
        }

        let mut classes: Vec<i32> = y.iter().copied().collect();
        classes.sort_unstable();
        classes.dedup();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut validation_sets: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];

        for &class in &classes {
            let mut indices: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
            if indices.len() < self.n_splits {
                return Err(PipelineError::InfeasibleStratification {
                    class,
                    count: indices.len(),
                    n_splits: self.n_splits,
                });
            }
            indices.shuffle(&mut rng);

            // Chunk sizes differ by at most one; earlier folds absorb the
            // remainder
            let base = indices.len() / self.n_splits;
            let remainder = indices.len() % self.n_splits;
            let mut start = 0;
            for (fold, set) in validation_sets.iter_mut().enumerate() {
                let size = base + usize::from(fold < remainder);
                set.extend_from_slice(&indices[start..start + size]);
                start += size;
            }
        }

        let folds = validation_sets
            .into_iter()
            .map(|mut validation| {
                validation.sort_unstable();
                let train: Vec<usize> = (0..y.len())
                    .filter(|i| validation.binary_search(i).is_err())
                    .collect();
                Fold { train, validation }
            })
            .collect();

        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn imbalanced_target() -> Array1<i32> {
        let mut y = vec![0; 15];
        y.extend(vec![1; 5]);
        Array1::from_vec(y)
    }

    #[test]
    fn folds_preserve_class_proportions() {
        let y = imbalanced_target();
        let folds = StratifiedKFold::new(5, 0).split(&y).unwrap();
        assert_eq!(folds.len(), 5);

        for fold in &folds {
            assert_eq!(fold.validation.len(), 4);
            assert_eq!(fold.train.len(), 16);
            let pos = fold.validation.iter().filter(|&&i| y[i] == 1).count();
            assert_eq!(pos, 1, "each fold should hold exactly one positive");
        }

        // Validation sets partition the rows
        let mut all: Vec<usize> = folds.iter().flat_map(|f| f.validation.clone()).collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_deterministic_under_fixed_seed() {
        let y = imbalanced_target();
        let a = StratifiedKFold::new(5, 9).split(&y).unwrap();
        let b = StratifiedKFold::new(5, 9).split(&y).unwrap();
        for (fa, fb) in a.iter().zip(b.iter()) {
            assert_eq!(fa.validation, fb.validation);
            assert_eq!(fa.train, fb.train);
        }
    }

    #[test]
    fn too_small_class_is_a_hard_error() {
        let mut y = vec![0; 17];
        y.extend(vec![1; 3]);
        let y = Array1::from_vec(y);

        let err = StratifiedKFold::new(5, 0).split(&y).unwrap_err();
        match err {
            PipelineError::InfeasibleStratification {
                class,
                count,
                n_splits,
            } => {
                assert_eq!(class, 1);
                assert_eq!(count, 3);
                assert_eq!(n_splits, 5);
            }
            other => panic!("expected stratification error, got {}", other),
        }
    }

    #[test]
    fn fewer_than_two_folds_is_rejected() {
        let y = imbalanced_target();
        assert!(matches!(
            StratifiedKFold::new(1, 0).split(&y),
            Err(PipelineError::InvalidFoldCount(1))
        ));
    }
}
