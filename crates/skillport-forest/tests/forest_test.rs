//! Integration tests for random forest fitting and cross-validation.

use approx::assert_relative_eq;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use skillport_forest::{
    EnsembleRegressor, ForestConfig, KFold, MaxFeatures, RandomForest, cross_validate,
};

fn synthetic(n: usize, noise: f64, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let x: Array2<f64> = Array2::from_shape_fn((n, 6), |_| rng.gen_range(0.0f64..1.0));
    let y = x
        .rows()
        .into_iter()
        .map(|r| (r[0] - r[3]).abs() * 2.0 + r[1] * r[2] + noise * rng.gen_range(-1.0..1.0))
        .collect();
    (x, y)
}

fn config() -> ForestConfig {
    ForestConfig {
        n_trees: 40,
        max_depth: Some(10),
        min_samples_leaf: 3,
        ..Default::default()
    }
}

#[test]
fn test_cross_validation_generalizes() {
    let (x, y) = synthetic(400, 0.05, 1);
    let cv = cross_validate::<RandomForest>(x.view(), y.view(), &config(), &KFold::new(5).unwrap())
        .unwrap();

    assert_eq!(cv.fold_scores.len(), 5);
    assert!(cv.mean() > 0.5, "mean CV R² too low: {}", cv.mean());
    assert!(cv.std() >= 0.0);
}

#[test]
fn test_cross_validation_does_not_touch_full_fit() {
    let (x, y) = synthetic(200, 0.1, 2);
    let before = RandomForest::fit(x.view(), y.view(), &config()).unwrap();
    cross_validate::<RandomForest>(x.view(), y.view(), &config(), &KFold::new(4).unwrap()).unwrap();
    let after = RandomForest::fit(x.view(), y.view(), &config()).unwrap();

    assert_eq!(before.predict(x.view()).unwrap(), after.predict(x.view()).unwrap());
}

#[test]
fn test_fit_independent_of_thread_count() {
    let (x, y) = synthetic(250, 0.1, 3);

    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| RandomForest::fit(x.view(), y.view(), &config()).unwrap());
    let multi = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .unwrap()
        .install(|| RandomForest::fit(x.view(), y.view(), &config()).unwrap());

    assert_eq!(
        single.predict(x.view()).unwrap(),
        multi.predict(x.view()).unwrap()
    );
    assert_eq!(single.feature_importances(), multi.feature_importances());
}

#[rstest]
#[case(MaxFeatures::Sqrt)]
#[case(MaxFeatures::All)]
#[case(MaxFeatures::Fraction(0.5))]
fn test_importances_normalized(#[case] max_features: MaxFeatures) {
    let (x, y) = synthetic(150, 0.05, 4);
    let forest = RandomForest::fit(
        x.view(),
        y.view(),
        &ForestConfig {
            max_features,
            ..config()
        },
    )
    .unwrap();

    let importances = forest.feature_importances();
    assert_eq!(importances.len(), 6);
    assert_relative_eq!(importances.sum(), 1.0, epsilon = 1e-12);
    assert!(importances.iter().all(|&v| v >= 0.0));
    // Columns 4 and 5 carry no signal.
    assert!(importances[0] > importances[4]);
    assert!(importances[3] > importances[5]);
}

#[test]
fn test_constant_target() {
    let (x, _) = synthetic(50, 0.0, 5);
    let y = Array1::from_elem(50, 0.25);
    let forest = RandomForest::fit(x.view(), y.view(), &config()).unwrap();

    let predictions = forest.predict(x.view()).unwrap();
    assert!(predictions.iter().all(|&p| (p - 0.25).abs() < 1e-12));
    assert!(forest.feature_importances().iter().all(|&v| v == 0.0));
}
