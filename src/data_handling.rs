//! Tabular data structures for the classification pipeline.
//!
//! This module defines `FeatureFrame` (a named-column numeric matrix),
//! `LabelFrame` (ordered binary targets), the categorical-feature mask used
//! by the balancer, and the per-label `LabelDataset` record assembled by
//! [`build_label_datasets`].
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;
use crate::feature_selection::univariate_selection::{select_best_descriptors, ScoreFunc};

/// A numeric feature matrix with stable, named columns.
///
/// Rows are compounds, columns are features. Column order is part of the
/// identity of the frame: train and test partitions of the same table must
/// be built with identical name lists.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    names: Vec<String>,
    x: Array2<f64>,
}

impl FeatureFrame {
    pub fn new(names: Vec<String>, x: Array2<f64>) -> Result<Self, PipelineError> {
        if names.len() != x.ncols() {
            return Err(PipelineError::DimensionMismatch {
                what: "column names vs matrix width",
                expected: x.ncols(),
                actual: names.len(),
            });
        }
        Ok(Self { names, x })
    }

    /// Build a frame from row vectors. Every row must have `names.len()`
    /// entries.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, PipelineError> {
        let ncols = names.len();
        let nrows = rows.len();
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in &rows {
            if row.len() != ncols {
                return Err(PipelineError::DimensionMismatch {
                    what: "row length vs column names",
                    expected: ncols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        let x = Array2::from_shape_vec((nrows, ncols), data).expect("row-major shape");
        Self::new(names, x)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Project onto the given columns, in the given order.
    pub fn select_columns(&self, names: &[String]) -> Result<FeatureFrame, PipelineError> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .column_index(name)
                .ok_or_else(|| PipelineError::UnknownColumn(name.clone()))?;
            indices.push(idx);
        }
        let x = self.x.select(Axis(1), &indices);
        Ok(FeatureFrame {
            names: names.to_vec(),
            x,
        })
    }

    pub fn select_rows(&self, indices: &[usize]) -> FeatureFrame {
        FeatureFrame {
            names: self.names.clone(),
            x: self.x.select(Axis(0), indices),
        }
    }

    /// Concatenate columns of `other` to the right of `self`.
    pub fn hstack(&self, other: &FeatureFrame) -> Result<FeatureFrame, PipelineError> {
        if self.nrows() != other.nrows() {
            return Err(PipelineError::DimensionMismatch {
                what: "row counts for hstack",
                expected: self.nrows(),
                actual: other.nrows(),
            });
        }
        let mut names = self.names.clone();
        names.extend(other.names.iter().cloned());
        let x = ndarray::concatenate(Axis(1), &[self.x.view(), other.x.view()])
            .expect("row counts checked above");
        Ok(FeatureFrame { names, x })
    }
}

/// Ordered binary label targets, row-aligned with the feature tables.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelFrame {
    names: Vec<String>,
    y: Array2<i32>,
}

impl LabelFrame {
    pub fn new(names: Vec<String>, y: Array2<i32>) -> Result<Self, PipelineError> {
        if names.len() != y.ncols() {
            return Err(PipelineError::DimensionMismatch {
                what: "label names vs target width",
                expected: y.ncols(),
                actual: names.len(),
            });
        }
        Ok(Self { names, y })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn nrows(&self) -> usize {
        self.y.nrows()
    }

    /// Extract one label's target vector.
    pub fn column(&self, name: &str) -> Result<Array1<i32>, PipelineError> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))?;
        Ok(self.y.column(idx).to_owned())
    }

    pub fn select_rows(&self, indices: &[usize]) -> LabelFrame {
        LabelFrame {
            names: self.names.clone(),
            y: self.y.select(Axis(0), indices),
        }
    }
}

/// Boolean mask marking which feature columns are categorical (fingerprint
/// bits) as opposed to continuous (descriptors).
///
/// The mask is derived from the actual column layout at construction time
/// and checked against every matrix it is applied to; a silent mismatch
/// would corrupt synthetic samples.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalMask {
    mask: Vec<bool>,
}

impl CategoricalMask {
    /// Layout used by the dataset builder: `n_categorical` fingerprint bits
    /// first, `n_continuous` descriptor columns appended.
    pub fn from_layout(n_categorical: usize, n_continuous: usize) -> Self {
        let mut mask = vec![true; n_categorical];
        mask.extend(std::iter::repeat(false).take(n_continuous));
        Self { mask }
    }

    pub fn from_mask(mask: Vec<bool>) -> Self {
        Self { mask }
    }

    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn is_categorical(&self, col: usize) -> bool {
        self.mask[col]
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.mask
    }

    /// Indices of categorical columns, in column order.
    pub fn categorical_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| if c { Some(i) } else { None })
            .collect()
    }

    /// Indices of continuous columns, in column order.
    pub fn continuous_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| if c { None } else { Some(i) })
            .collect()
    }

    pub fn check_matches(&self, ncols: usize) -> Result<(), PipelineError> {
        if self.mask.len() != ncols {
            return Err(PipelineError::MaskMismatch {
                mask_len: self.mask.len(),
                ncols,
            });
        }
        Ok(())
    }
}

/// Row indices of a train/test partition.
#[derive(Debug, Clone)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` with the given seed and reserve `test_fraction` of
/// the rows (rounded down, at least one when `n_rows > 1`) for the test
/// partition.
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut n_test = (n_rows as f64 * test_fraction) as usize;
    if n_test == 0 && n_rows > 1 && test_fraction > 0.0 {
        n_test = 1;
    }
    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    SplitIndices { train, test }
}

/// Everything one label's search and evaluation needs: assembled train/test
/// matrices, aligned targets, the selected descriptor columns, and the
/// categorical mask matching the assembled layout.
///
/// The selected-descriptor list is computed from the training partition only
/// and applied unchanged to the test partition; it is immutable after
/// construction.
#[derive(Debug, Clone)]
pub struct LabelDataset {
    pub label: String,
    pub x_train: FeatureFrame,
    pub x_test: FeatureFrame,
    pub y_train: Array1<i32>,
    pub y_test: Array1<i32>,
    pub selected_descriptors: Vec<String>,
    pub mask: CategoricalMask,
}

/// Ordered collection of per-label datasets (insertion order = label order).
#[derive(Debug, Clone, Default)]
pub struct LabelDatasets {
    datasets: Vec<LabelDataset>,
}

impl LabelDatasets {
    pub fn get(&self, label: &str) -> Option<&LabelDataset> {
        self.datasets.iter().find(|d| d.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelDataset> {
        self.datasets.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl<'a> IntoIterator for &'a LabelDatasets {
    type Item = &'a LabelDataset;
    type IntoIter = std::slice::Iter<'a, LabelDataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.datasets.iter()
    }
}

/// Assemble one train/test matrix pair per label.
///
/// For each label the `k` best descriptor columns are chosen on the training
/// partition, the *same* columns are projected out of the test partition,
/// and both are appended to the fingerprint block. Descriptor selection
/// never sees the test partition.
#[allow(clippy::too_many_arguments)]
pub fn build_label_datasets(
    desc_train: &FeatureFrame,
    desc_test: &FeatureFrame,
    fp_train: &FeatureFrame,
    fp_test: &FeatureFrame,
    y_train: &LabelFrame,
    y_test: &LabelFrame,
    labels: &[String],
    score_func: ScoreFunc,
    k: usize,
) -> Result<LabelDatasets, PipelineError> {
    if labels.is_empty() {
        return Err(PipelineError::MissingLabelList);
    }
    if desc_train.nrows() != fp_train.nrows() {
        return Err(PipelineError::DimensionMismatch {
            what: "descriptor vs fingerprint training rows",
            expected: fp_train.nrows(),
            actual: desc_train.nrows(),
        });
    }
    if desc_test.nrows() != fp_test.nrows() {
        return Err(PipelineError::DimensionMismatch {
            what: "descriptor vs fingerprint test rows",
            expected: fp_test.nrows(),
            actual: desc_test.nrows(),
        });
    }

    let mut datasets = Vec::with_capacity(labels.len());
    for label in labels {
        let y_tr = y_train.column(label)?;
        if y_tr.len() != desc_train.nrows() {
            return Err(PipelineError::DimensionMismatch {
                what: "training targets vs training rows",
                expected: desc_train.nrows(),
                actual: y_tr.len(),
            });
        }
        let y_te = y_test.column(label)?;

        let selected = select_best_descriptors(desc_train, &y_tr, score_func, k);
        log::debug!("Selected descriptors for {}: {:?}", label, selected);

        let desc_tr = desc_train.select_columns(&selected)?;
        let desc_te = desc_test.select_columns(&selected)?;
        let x_train = fp_train.hstack(&desc_tr)?;
        let x_test = fp_test.hstack(&desc_te)?;

        let mask = CategoricalMask::from_layout(fp_train.ncols(), selected.len());
        mask.check_matches(x_train.ncols())?;

        datasets.push(LabelDataset {
            label: label.clone(),
            x_train,
            x_test,
            y_train: y_tr,
            y_test: y_te,
            selected_descriptors: selected,
            mask,
        });
    }

    Ok(LabelDatasets { datasets })
}
