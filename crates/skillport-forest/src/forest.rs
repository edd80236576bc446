//! Random forest regressor
//!
//! Bootstrap-aggregated regression trees. Each tree is grown on a bootstrap
//! sample of the rows with per-split feature subsampling; predictions are the
//! average over trees.
//!
//! Trees are fitted in parallel. Every tree owns an RNG seeded from the
//! configured seed and its index, and results are gathered in tree order, so
//! a fit is reproducible regardless of thread count.

use crate::config::ForestConfig;
use crate::error::ForestError;
use crate::regressor::{EnsembleRegressor, check_training_data};
use crate::tree::RegressionTree;
use ndarray::parallel::prelude::*;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Derive the seed of tree `index` from the forest seed.
const fn tree_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// A fitted random forest
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    config: ForestConfig,
}

impl RandomForest {
    /// The fitted trees, in index order.
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Configuration used for fitting.
    pub const fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Number of features seen during fitting.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    fn fit_tree(
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
        config: &ForestConfig,
        index: usize,
    ) -> Result<RegressionTree, ForestError> {
        let n = target.len();
        let mut rng = StdRng::seed_from_u64(tree_seed(config.seed, index));
        let samples: Vec<usize> = if config.bootstrap {
            (0..n).map(|_| rng.gen_range(0..n)).collect()
        } else {
            (0..n).collect()
        };
        RegressionTree::fit(features, target, &samples, &config.tree_params(), &mut rng)
    }
}

impl EnsembleRegressor for RandomForest {
    type Params = ForestConfig;

    fn fit(
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
        params: &Self::Params,
    ) -> Result<Self, ForestError> {
        params.validate()?;
        check_training_data(features, target)?;

        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|index| Self::fit_tree(features, target, params, index))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            trees = trees.len(),
            rows = target.len(),
            features = features.ncols(),
            mean_leaves = trees.iter().map(RegressionTree::n_leaves).sum::<usize>() as f64
                / trees.len() as f64,
            "fitted random forest"
        );

        Ok(Self {
            trees,
            n_features: features.ncols(),
            config: params.clone(),
        })
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForestError> {
        if features.ncols() != self.n_features {
            return Err(ForestError::DimensionMismatch {
                expected: self.n_features,
                actual: features.ncols(),
            });
        }

        let n_trees = self.trees.len() as f64;
        let predictions: Vec<f64> = features
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| {
                self.trees
                    .iter()
                    .map(|tree| tree.predict_row(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn feature_importances(&self) -> Array1<f64> {
        let mut total = Array1::<f64>::zeros(self.n_features);
        for tree in &self.trees {
            total += &tree.feature_importances();
        }
        let sum = total.sum();
        if sum > 0.0 { total / sum } else { total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaxFeatures;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn synthetic(n: usize) -> (Array2<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(7);
        let x = Array2::from_shape_fn((n, 4), |_| rng.r#gen::<f64>());
        let y = x
            .rows()
            .into_iter()
            .map(|r| 3.0 * r[0] - 2.0 * r[1] + 0.1 * r[2])
            .collect();
        (x, y)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 20,
            max_depth: Some(8),
            min_samples_leaf: 2,
            max_features: MaxFeatures::All,
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = synthetic(200);
        let config = small_config().with_seed(11);

        let a = RandomForest::fit(x.view(), y.view(), &config).unwrap();
        let b = RandomForest::fit(x.view(), y.view(), &config).unwrap();

        assert_eq!(
            a.predict(x.view()).unwrap(),
            b.predict(x.view()).unwrap()
        );
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_different_seeds_differ() {
        let (x, y) = synthetic(200);
        let a = RandomForest::fit(x.view(), y.view(), &small_config().with_seed(1)).unwrap();
        let b = RandomForest::fit(x.view(), y.view(), &small_config().with_seed(2)).unwrap();
        assert_ne!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    }

    #[test]
    fn test_learns_signal() {
        let (x, y) = synthetic(300);
        let forest = RandomForest::fit(x.view(), y.view(), &small_config()).unwrap();
        let r2 = forest.score(x.view(), y.view()).unwrap();
        assert!(r2 > 0.9, "in-sample R² too low: {r2}");
        assert_eq!(forest.trees().len(), 20);
    }

    #[test]
    fn test_importances_rank_signal_features() {
        let (x, y) = synthetic(300);
        let forest = RandomForest::fit(x.view(), y.view(), &small_config()).unwrap();
        let importances = forest.feature_importances();

        assert_relative_eq!(importances.sum(), 1.0, epsilon = 1e-12);
        assert!(importances[0] > importances[2]);
        assert!(importances[1] > importances[3]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (x, y) = synthetic(10);
        let config = ForestConfig {
            n_trees: 0,
            ..Default::default()
        };
        assert!(matches!(
            RandomForest::fit(x.view(), y.view(), &config),
            Err(ForestError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_predict_dimension_mismatch() {
        let (x, y) = synthetic(30);
        let forest = RandomForest::fit(x.view(), y.view(), &small_config()).unwrap();
        let narrow = Array2::<f64>::zeros((2, 3));
        assert!(forest.predict(narrow.view()).is_err());
    }
}
