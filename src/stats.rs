//! Binary classification metrics.
//!
//! The fixed battery reported for every label: binary/micro/macro F1,
//! ROC-AUC, recall, precision and average precision, plus the
//! precision-recall curve behind the reporting plots. The positive class is
//! always `1`.
use ndarray::Array1;
use serde::Serialize;

/// Binary confusion counts with `1` as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

pub fn confusion_counts(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> ConfusionCounts {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "prediction length must match target length"
    );
    let mut counts = ConfusionCounts {
        tp: 0,
        fp: 0,
        tn: 0,
        fn_: 0,
    };
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        match (t == 1, p == 1) {
            (true, true) => counts.tp += 1,
            (false, true) => counts.fp += 1,
            (false, false) => counts.tn += 1,
            (true, false) => counts.fn_ += 1,
        }
    }
    counts
}

/// Binary precision; 0.0 when nothing was predicted positive.
pub fn precision_score(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> f64 {
    let c = confusion_counts(y_true, y_pred);
    safe_div(c.tp as f64, (c.tp + c.fp) as f64)
}

/// Binary recall; 0.0 when there are no positives.
pub fn recall_score(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> f64 {
    let c = confusion_counts(y_true, y_pred);
    safe_div(c.tp as f64, (c.tp + c.fn_) as f64)
}

/// Binary F1; 0.0 when precision and recall are both zero.
pub fn f1_score(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> f64 {
    let p = precision_score(y_true, y_pred);
    let r = recall_score(y_true, y_pred);
    safe_div(2.0 * p * r, p + r)
}

/// Micro-averaged F1 over both classes. For a single binary task this
/// equals plain accuracy.
pub fn f1_micro_score(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> f64 {
    let c = confusion_counts(y_true, y_pred);
    safe_div((c.tp + c.tn) as f64, y_true.len() as f64)
}

/// Macro-averaged F1: unweighted mean of the per-class F1 scores.
pub fn f1_macro_score(y_true: &Array1<i32>, y_pred: &Array1<i32>) -> f64 {
    let flipped_true = y_true.mapv(|v| 1 - v);
    let flipped_pred = y_pred.mapv(|v| 1 - v);
    (f1_score(y_true, y_pred) + f1_score(&flipped_true, &flipped_pred)) / 2.0
}

/// Area under the ROC curve from continuous scores, computed as the
/// tie-corrected rank statistic. Returns 0.5 for degenerate single-class
/// targets.
pub fn roc_auc_score(y_true: &Array1<i32>, y_score: &Array1<f64>) -> f64 {
    assert_eq!(
        y_true.len(),
        y_score.len(),
        "score length must match target length"
    );
    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&v| v == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        log::warn!("roc_auc_score: only one class present, returning 0.5");
        return 0.5;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        y_score[a]
            .partial_cmp(&y_score[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Average ranks over tie groups
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let sum_pos_ranks: f64 = (0..n).filter(|&i| y_true[i] == 1).map(|i| ranks[i]).sum();
    let n_pos_f = n_pos as f64;
    (sum_pos_ranks - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64)
}

/// Precision-recall pairs at every distinct score threshold, ordered by
/// descending threshold (recall non-decreasing). The leading point is the
/// `(precision 1, recall 0)` anchor, so `thresholds.len()` is
/// `precision.len() - 1`.
#[derive(Debug, Clone)]
pub struct PrCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f64>,
}

pub fn precision_recall_curve(y_true: &Array1<i32>, y_score: &Array1<f64>) -> PrCurve {
    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&v| v == 1).count();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        y_score[b]
            .partial_cmp(&y_score[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut precision = vec![1.0];
    let mut recall = vec![0.0];
    let mut thresholds = Vec::new();

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < n {
        let threshold = y_score[order[i]];
        // Consume the whole tie group before emitting a point
        while i < n && y_score[order[i]] == threshold {
            if y_true[order[i]] == 1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        precision.push(safe_div(tp as f64, (tp + fp) as f64));
        recall.push(if n_pos == 0 {
            0.0
        } else {
            tp as f64 / n_pos as f64
        });
        thresholds.push(threshold);
    }

    PrCurve {
        precision,
        recall,
        thresholds,
    }
}

/// Average precision: the step-wise integral of the precision-recall curve,
/// `Σ (Rₙ - Rₙ₋₁) · Pₙ` over descending thresholds.
pub fn average_precision_score(y_true: &Array1<i32>, y_score: &Array1<f64>) -> f64 {
    let n_pos = y_true.iter().filter(|&&v| v == 1).count();
    if n_pos == 0 {
        log::warn!("average_precision_score: no positive samples, returning 0.0");
        return 0.0;
    }
    let curve = precision_recall_curve(y_true, y_score);
    let mut ap = 0.0;
    for i in 1..curve.precision.len() {
        ap += (curve.recall[i] - curve.recall[i - 1]) * curve.precision[i];
    }
    ap
}

/// The fixed metric battery computed for every label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    pub f1: f64,
    pub f1_micro: f64,
    pub f1_macro: f64,
    pub roc_auc: f64,
    pub recall: f64,
    pub precision: f64,
    pub average_precision: f64,
}

impl MetricSummary {
    /// Compute the full battery from hard predictions and scores.
    pub fn battery(y_true: &Array1<i32>, y_pred: &Array1<i32>, y_score: &Array1<f64>) -> Self {
        Self {
            f1: f1_score(y_true, y_pred),
            f1_micro: f1_micro_score(y_true, y_pred),
            f1_macro: f1_macro_score(y_true, y_pred),
            roc_auc: roc_auc_score(y_true, y_score),
            recall: recall_score(y_true, y_pred),
            precision: precision_score(y_true, y_pred),
            average_precision: average_precision_score(y_true, y_score),
        }
    }

    fn as_array(&self) -> [f64; 7] {
        [
            self.f1,
            self.f1_micro,
            self.f1_macro,
            self.roc_auc,
            self.recall,
            self.precision,
            self.average_precision,
        ]
    }

    fn from_array(values: [f64; 7]) -> Self {
        Self {
            f1: values[0],
            f1_micro: values[1],
            f1_macro: values[2],
            roc_auc: values[3],
            recall: values[4],
            precision: values[5],
            average_precision: values[6],
        }
    }

    /// Element-wise mean across fold summaries.
    pub fn mean_of(summaries: &[MetricSummary]) -> Self {
        let n = summaries.len().max(1) as f64;
        let mut acc = [0.0; 7];
        for s in summaries {
            for (a, v) in acc.iter_mut().zip(s.as_array()) {
                *a += v;
            }
        }
        for a in acc.iter_mut() {
            *a /= n;
        }
        Self::from_array(acc)
    }

    /// Element-wise population standard deviation across fold summaries.
    pub fn std_of(summaries: &[MetricSummary]) -> Self {
        let mean = Self::mean_of(summaries).as_array();
        let n = summaries.len().max(1) as f64;
        let mut acc = [0.0; 7];
        for s in summaries {
            for ((a, v), m) in acc.iter_mut().zip(s.as_array()).zip(mean) {
                *a += (v - m).powi(2);
            }
        }
        for a in acc.iter_mut() {
            *a = (*a / n).sqrt();
        }
        Self::from_array(acc)
    }
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}
