//! Integration tests for the search engine and the reporting engines.

use ndarray::{Array1, Array2};

use sider_classifiers::config::{GradientBoostingParams, ModelSpec, RandomForestParams};
use sider_classifiers::data_handling::{CategoricalMask, FeatureFrame, LabelDatasets};
use sider_classifiers::error::PipelineError;
use sider_classifiers::model_selection::{
    grid_search, multi_label_grid_search, random_search, LabelGrids, Parallelism, Scoring,
    SearchSettings,
};
use sider_classifiers::models::build_model;
use sider_classifiers::report::{cv_multi_report, heldout_multi_report, score_report, HeldOutSettings, ModelChoice};
use sider_classifiers::model_selection::ValidationSettings;
use sider_classifiers::models::Classifier;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 15 negatives / 5 positives over 10 fingerprint bits plus 2 separating
/// descriptor columns.
fn toy_problem() -> (Array2<f64>, Array1<i32>, CategoricalMask) {
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for i in 0..15 {
        let mut row = vec![0.0; 12];
        row[i % 10] = 1.0;
        row[10] = i as f64 * 0.1;
        row[11] = 1.0;
        rows.extend(row);
        y.push(0);
    }
    for i in 0..5 {
        let mut row = vec![0.0; 12];
        row[i % 10] = 1.0;
        row[10] = 10.0 + i as f64;
        row[11] = -1.0;
        rows.extend(row);
        y.push(1);
    }
    (
        Array2::from_shape_vec((20, 12), rows).unwrap(),
        Array1::from_vec(y),
        CategoricalMask::from_layout(10, 2),
    )
}

fn two_point_grid() -> Vec<ModelSpec> {
    vec![
        ModelSpec::GradientBoosting(GradientBoostingParams {
            max_depth: 2,
            num_boost_round: 5,
            ..GradientBoostingParams::default()
        }),
        ModelSpec::GradientBoosting(GradientBoostingParams {
            max_depth: 4,
            num_boost_round: 10,
            ..GradientBoostingParams::default()
        }),
    ]
}

fn sequential_settings() -> SearchSettings {
    SearchSettings {
        parallelism: Parallelism::Sequential,
        ..SearchSettings::default()
    }
}

// ---------------------------------------------------------------------------
// Grid search
// ---------------------------------------------------------------------------

#[test]
fn grid_search_picks_a_candidate_with_bounded_score() {
    let (x, y, mask) = toy_problem();
    let grid = two_point_grid();

    let outcome = grid_search(&x, &y, &mask, &grid, &sequential_settings()).unwrap();

    assert!(grid.contains(&outcome.best_spec));
    assert!((0.0..=1.0).contains(&outcome.best_score));
    assert_eq!(outcome.cv_results.len(), 2);

    // The refit estimator is usable immediately
    let probs = outcome.estimator.predict_proba(&x).unwrap();
    assert_eq!(probs.len(), 20);
}

#[test]
fn empty_grid_is_a_configuration_error() {
    let (x, y, mask) = toy_problem();
    assert!(matches!(
        grid_search(&x, &y, &mask, &[], &sequential_settings()),
        Err(PipelineError::EmptyParameterGrid)
    ));
}

#[test]
fn search_is_deterministic_under_fixed_seed() {
    let (x, y, mask) = toy_problem();
    let grid = two_point_grid();
    let settings = SearchSettings {
        split_seed: 17,
        ..sequential_settings()
    };

    let a = grid_search(&x, &y, &mask, &grid, &settings).unwrap();
    let b = grid_search(&x, &y, &mask, &grid, &settings).unwrap();

    assert_eq!(a.best_spec, b.best_spec);
    assert_eq!(a.best_score, b.best_score);
    for (ca, cb) in a.cv_results.iter().zip(b.cv_results.iter()) {
        assert_eq!(ca.mean_score, cb.mean_score);
        assert_eq!(ca.std_score, cb.std_score);
    }
}

#[test]
fn stratification_infeasibility_surfaces_through_search() {
    let (x, _, mask) = toy_problem();
    // Only 3 positives for 5 folds
    let mut y = vec![0; 17];
    y.extend(vec![1; 3]);
    let y = Array1::from_vec(y);

    let err = grid_search(&x, &y, &mask, &two_point_grid(), &sequential_settings()).unwrap_err();
    assert!(matches!(err, PipelineError::InfeasibleStratification { .. }));
}

#[test]
fn balanced_search_also_selects_from_the_grid() {
    let (x, y, mask) = toy_problem();
    let grid = two_point_grid();
    let settings = SearchSettings {
        balancing: Some(sider_classifiers::sampling::SmoteSettings {
            k_neighbors: 3,
            seed: 5,
        }),
        scoring: Scoring::F1,
        ..sequential_settings()
    };

    let outcome = grid_search(&x, &y, &mask, &grid, &settings).unwrap();
    assert!(grid.contains(&outcome.best_spec));
    assert!((0.0..=1.0).contains(&outcome.best_score));
}

// ---------------------------------------------------------------------------
// Random search
// ---------------------------------------------------------------------------

#[test]
fn random_search_samples_within_budget() {
    let (x, y, mask) = toy_problem();
    let grid = two_point_grid();

    let outcome = random_search(&x, &y, &mask, &grid, 1, 3, &sequential_settings()).unwrap();
    assert_eq!(outcome.cv_results.len(), 1);
    assert!(grid.contains(&outcome.best_spec));

    assert!(matches!(
        random_search(&x, &y, &mask, &grid, 0, 3, &sequential_settings()),
        Err(PipelineError::EmptyParameterGrid)
    ));
}

// ---------------------------------------------------------------------------
// Multi-label orchestration
// ---------------------------------------------------------------------------

fn toy_datasets() -> LabelDatasets {
    use sider_classifiers::data_handling::{build_label_datasets, LabelFrame};
    use sider_classifiers::feature_selection::ScoreFunc;

    let (x, y_good, _) = toy_problem();
    let fp_names: Vec<String> = (0..10).map(|i| format!("fp_{}", i)).collect();
    let desc_names = vec!["mol_weight".to_string(), "log_p".to_string()];

    let fp = FeatureFrame::new(
        fp_names,
        x.slice(ndarray::s![.., ..10]).to_owned(),
    )
    .unwrap();
    let desc = FeatureFrame::new(
        desc_names,
        x.slice(ndarray::s![.., 10..]).to_owned(),
    )
    .unwrap();

    // Second label has too few positives for 5-fold stratification
    let mut y_bad = vec![0; 17];
    y_bad.extend(vec![1; 3]);
    let mut values = Vec::new();
    for i in 0..20 {
        values.push(y_good[i]);
        values.push(y_bad[i]);
    }
    let labels = LabelFrame::new(
        vec!["Good label".into(), "Sparse label".into()],
        Array2::from_shape_vec((20, 2), values).unwrap(),
    )
    .unwrap();
    let names = labels.names().to_vec();

    build_label_datasets(
        &desc,
        &desc,
        &fp,
        &fp,
        &labels,
        &labels,
        &names,
        ScoreFunc::AnovaF,
        2,
    )
    .unwrap()
}

#[test]
fn one_label_failure_does_not_lose_the_others() {
    let datasets = toy_datasets();
    let grids = LabelGrids::uniform(
        &["Good label".to_string(), "Sparse label".to_string()],
        two_point_grid(),
    );

    let search = multi_label_grid_search(&datasets, &grids, &sequential_settings());

    assert_eq!(search.results.len(), 1);
    assert_eq!(search.results[0].label, "Good label");
    assert_eq!(search.failures.len(), 1);
    assert_eq!(search.failures[0].label, "Sparse label");
    assert!(matches!(
        search.failures[0].error,
        PipelineError::InfeasibleStratification { .. }
    ));
    assert!(!search.is_complete());

    let best = search.best_params();
    assert!(best.get("Good label").is_some());
    assert!(best.get("Sparse label").is_none());
}

// ---------------------------------------------------------------------------
// Reporting engines
// ---------------------------------------------------------------------------

#[test]
fn cv_report_rows_carry_bounded_means_and_stds() {
    let datasets = toy_datasets();
    let spec = ModelSpec::GradientBoosting(GradientBoostingParams {
        max_depth: 3,
        num_boost_round: 5,
        ..GradientBoostingParams::default()
    });

    let outcome = cv_multi_report(
        &datasets,
        &ModelChoice::Shared(&spec),
        &ValidationSettings {
            parallelism: Parallelism::Sequential,
            ..ValidationSettings::default()
        },
    );

    // The sparse label fails stratification, the good one reports
    assert_eq!(outcome.table.rows.len(), 1);
    assert_eq!(outcome.failures.len(), 1);

    let row = outcome.table.get("Good label").unwrap();
    let std = row.std.as_ref().expect("cv report carries stds");
    for v in [
        row.mean.f1,
        row.mean.f1_micro,
        row.mean.f1_macro,
        row.mean.roc_auc,
        row.mean.recall,
        row.mean.precision,
        row.mean.average_precision,
    ] {
        assert!((0.0..=1.0).contains(&v), "metric out of range: {}", v);
    }
    assert!(std.f1 >= 0.0);
}

#[test]
fn heldout_report_uses_per_label_best_params() {
    let datasets = toy_datasets();
    let grids = LabelGrids::uniform(&["Good label".to_string()], two_point_grid());
    let search = multi_label_grid_search(&datasets, &grids, &sequential_settings());
    let best = search.best_params();

    let outcome = heldout_multi_report(
        &datasets,
        &ModelChoice::PerLabel(&best),
        &HeldOutSettings::default(),
    );

    // "Good label" reports; "Sparse label" has no best params and fails
    assert_eq!(outcome.table.rows.len(), 1);
    let row = outcome.table.get("Good label").unwrap();
    assert!(row.std.is_none());
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(
        outcome.failures[0].error,
        PipelineError::MissingModelSpec { .. }
    ));
}

#[test]
fn score_report_is_idempotent_for_a_fitted_estimator() {
    let (x, y, _) = toy_problem();
    let mut estimator = build_model(&ModelSpec::RandomForest(RandomForestParams {
        n_estimators: 15,
        seed: 3,
        ..RandomForestParams::default()
    }));
    estimator.fit(&x, &y).unwrap();

    let first = score_report(estimator.as_ref(), &x, &y).unwrap();
    let second = score_report(estimator.as_ref(), &x, &y).unwrap();
    assert_eq!(first, second, "metric rows must be bit-identical");
}
