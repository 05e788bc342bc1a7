//! Integration tests for per-label dataset assembly and descriptor
//! selection.

use ndarray::{Array1, Array2};

use sider_classifiers::data_handling::{build_label_datasets, FeatureFrame, LabelFrame};
use sider_classifiers::feature_selection::{select_best_descriptors_multi, ScoreFunc};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn fingerprint_frame(n_rows: usize, offset: usize) -> FeatureFrame {
    let names: Vec<String> = (0..10).map(|i| format!("fp_{}", i)).collect();
    let rows: Vec<Vec<f64>> = (0..n_rows)
        .map(|r| {
            (0..10)
                .map(|c| if (r + offset) % 10 == c { 1.0 } else { 0.0 })
                .collect()
        })
        .collect();
    FeatureFrame::from_rows(names, rows).unwrap()
}

fn descriptor_frame(n_rows: usize, y: &[i32]) -> FeatureFrame {
    let names: Vec<String> = vec![
        "mol_weight".to_string(),
        "log_p".to_string(),
        "tpsa".to_string(),
        "h_donors".to_string(),
        "h_acceptors".to_string(),
    ];
    // Columns 0 and 2 track the target, the rest are noise/constant
    let rows: Vec<Vec<f64>> = (0..n_rows)
        .map(|r| {
            let signal = y[r] as f64;
            vec![
                200.0 + 50.0 * signal + r as f64 * 0.01,
                (r % 3) as f64,
                10.0 * signal + (r % 2) as f64 * 0.1,
                2.0,
                (r % 5) as f64,
            ]
        })
        .collect();
    FeatureFrame::from_rows(names, rows).unwrap()
}

fn label_frame(y_a: Vec<i32>, y_b: Vec<i32>) -> LabelFrame {
    let n = y_a.len();
    let mut values = Vec::with_capacity(n * 2);
    for i in 0..n {
        values.push(y_a[i]);
        values.push(y_b[i]);
    }
    LabelFrame::new(
        vec!["Hepatobiliary disorders".into(), "Cardiac disorders".into()],
        Array2::from_shape_vec((n, 2), values).unwrap(),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// build_label_datasets
// ---------------------------------------------------------------------------

#[test]
fn selected_columns_are_identical_between_train_and_test() {
    let y_a: Vec<i32> = (0..20).map(|i| i32::from(i >= 15)).collect();
    let y_b: Vec<i32> = (0..20).map(|i| i32::from(i % 2 == 0)).collect();

    let desc_train = descriptor_frame(20, &y_a);
    let fp_train = fingerprint_frame(20, 0);
    // Test partition deliberately carries different values
    let y_a_test: Vec<i32> = vec![0, 1, 0, 1];
    let desc_test = descriptor_frame(4, &y_a_test);
    let fp_test = fingerprint_frame(4, 3);

    let train_labels = label_frame(y_a, y_b);
    let test_labels = label_frame(y_a_test, vec![1, 0, 1, 0]);
    let names = train_labels.names().to_vec();

    let datasets = build_label_datasets(
        &desc_train,
        &desc_test,
        &fp_train,
        &fp_test,
        &train_labels,
        &test_labels,
        &names,
        ScoreFunc::AnovaF,
        3,
    )
    .unwrap();

    assert_eq!(datasets.len(), 2);
    for dataset in &datasets {
        assert_eq!(dataset.selected_descriptors.len(), 3);

        // The assembled matrices share one column layout: fingerprints
        // first, then exactly the selected descriptors, on both partitions
        assert_eq!(dataset.x_train.names(), dataset.x_test.names());
        let tail_train: Vec<String> = dataset.x_train.names()[10..].to_vec();
        assert_eq!(tail_train, dataset.selected_descriptors);

        // Selected names come from the descriptor pool, never fingerprints
        for name in &dataset.selected_descriptors {
            assert!(!name.starts_with("fp_"), "fingerprint column selected: {}", name);
        }

        // Mask matches the assembled layout: 10 categorical + 3 continuous
        assert_eq!(dataset.mask.len(), 13);
        assert_eq!(dataset.mask.categorical_indices().len(), 10);
        assert_eq!(dataset.mask.continuous_indices(), vec![10, 11, 12]);
    }
}

#[test]
fn informative_descriptors_win_selection() {
    let y: Vec<i32> = (0..20).map(|i| i32::from(i >= 15)).collect();
    let desc = descriptor_frame(20, &y);
    let fp = fingerprint_frame(20, 0);
    let labels = label_frame(y.clone(), y.clone());
    let names = vec!["Hepatobiliary disorders".to_string()];

    let datasets = build_label_datasets(
        &desc, &desc, &fp, &fp, &labels, &labels, &names, ScoreFunc::AnovaF, 2,
    )
    .unwrap();

    let dataset = datasets.get("Hepatobiliary disorders").unwrap();
    assert!(dataset
        .selected_descriptors
        .contains(&"mol_weight".to_string()));
    assert!(dataset.selected_descriptors.contains(&"tpsa".to_string()));
}

#[test]
fn empty_label_list_is_rejected() {
    let y: Vec<i32> = (0..20).map(|i| i32::from(i >= 15)).collect();
    let desc = descriptor_frame(20, &y);
    let fp = fingerprint_frame(20, 0);
    let labels = label_frame(y.clone(), y);

    let result = build_label_datasets(
        &desc,
        &desc,
        &fp,
        &fp,
        &labels,
        &labels,
        &[],
        ScoreFunc::AnovaF,
        3,
    );
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Multi-label union selection
// ---------------------------------------------------------------------------

#[test]
fn union_selection_preserves_first_appearance_order() {
    let y_a: Vec<i32> = (0..20).map(|i| i32::from(i >= 15)).collect();
    // Second label tracks log_p instead
    let y_b: Vec<i32> = (0..20).map(|i| i32::from(i % 3 == 0)).collect();

    let desc = descriptor_frame(20, &y_a);
    let labels = label_frame(y_a, y_b);
    let names = labels.names().to_vec();

    let union =
        select_best_descriptors_multi(&desc, &labels, &names, ScoreFunc::AnovaF, 2).unwrap();

    // Deduplicated, at most 4 and at least 2 names, all from the pool
    assert!(union.len() >= 2 && union.len() <= 4);
    let mut seen = std::collections::HashSet::new();
    for name in &union {
        assert!(seen.insert(name.clone()), "duplicate in union: {}", name);
        assert!(desc.names().contains(name));
    }

    // The first label's picks lead the union
    assert_eq!(union[0], "mol_weight");
}

#[test]
fn union_selection_requires_label_names() {
    let y: Vec<i32> = (0..20).map(|i| i32::from(i >= 15)).collect();
    let desc = descriptor_frame(20, &y);
    let labels = label_frame(y.clone(), y);

    assert!(select_best_descriptors_multi(&desc, &labels, &[], ScoreFunc::AnovaF, 2).is_err());
}

// ---------------------------------------------------------------------------
// Target alignment
// ---------------------------------------------------------------------------

#[test]
fn per_label_targets_are_row_aligned() {
    let y_a: Vec<i32> = (0..20).map(|i| i32::from(i >= 15)).collect();
    let y_b: Vec<i32> = (0..20).map(|i| i32::from(i < 5)).collect();

    let desc = descriptor_frame(20, &y_a);
    let fp = fingerprint_frame(20, 0);
    let labels = label_frame(y_a.clone(), y_b.clone());
    let names = labels.names().to_vec();

    let datasets = build_label_datasets(
        &desc, &desc, &fp, &fp, &labels, &labels, &names, ScoreFunc::AnovaF, 3,
    )
    .unwrap();

    assert_eq!(
        datasets.get("Hepatobiliary disorders").unwrap().y_train,
        Array1::from_vec(y_a)
    );
    assert_eq!(
        datasets.get("Cardiac disorders").unwrap().y_train,
        Array1::from_vec(y_b)
    );
}
