//! K-fold cross-validation
//!
//! Folds are contiguous and unshuffled: with n samples and k folds, the first
//! `n % k` folds hold `n / k + 1` samples and the rest hold `n / k`. Each fold
//! trains a fresh model, so cross-validation never touches a deployed model.

use crate::error::ForestError;
use crate::regressor::EnsembleRegressor;
use ndarray::{ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Train/test row indices for one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Rows used for fitting
    pub train: Vec<usize>,
    /// Held-out rows used for scoring
    pub test: Vec<usize>,
}

/// Contiguous k-fold splitter
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    /// Create a splitter with `n_splits` folds (at least 2).
    pub fn new(n_splits: usize) -> Result<Self, ForestError> {
        if n_splits < 2 {
            return Err(ForestError::InvalidParameter(format!(
                "cross-validation needs at least 2 folds, got {n_splits}"
            )));
        }
        Ok(Self { n_splits })
    }

    /// Number of folds.
    pub const fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Partition `0..n_samples` into folds.
    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>, ForestError> {
        if n_samples < self.n_splits {
            return Err(ForestError::InsufficientData {
                required: self.n_splits,
                actual: n_samples,
            });
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;
        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;

        for k in 0..self.n_splits {
            let size = base + usize::from(k < remainder);
            let end = start + size;
            folds.push(Fold {
                train: (0..start).chain(end..n_samples).collect(),
                test: (start..end).collect(),
            });
            start = end;
        }

        Ok(folds)
    }
}

/// Out-of-sample R² for each fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    /// R² on each held-out fold, in fold order
    pub fold_scores: Vec<f64>,
}

impl CrossValidation {
    /// Mean fold R².
    pub fn mean(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return f64::NAN;
        }
        self.fold_scores.iter().sum::<f64>() / self.fold_scores.len() as f64
    }

    /// Population standard deviation of the fold R².
    pub fn std(&self) -> f64 {
        if self.fold_scores.is_empty() {
            return f64::NAN;
        }
        let mean = self.mean();
        let var = self
            .fold_scores
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / self.fold_scores.len() as f64;
        var.sqrt()
    }
}

/// Fit a fresh `M` on each training split and score it on the held-out rows.
///
/// Folds are evaluated in parallel; scores come back in fold order.
pub fn cross_validate<M: EnsembleRegressor>(
    features: ArrayView2<'_, f64>,
    target: ArrayView1<'_, f64>,
    params: &M::Params,
    kfold: &KFold,
) -> Result<CrossValidation, ForestError> {
    if features.nrows() != target.len() {
        return Err(ForestError::ShapeMismatch {
            rows: features.nrows(),
            targets: target.len(),
        });
    }

    let folds = kfold.split(target.len())?;
    let fold_scores = folds
        .par_iter()
        .map(|fold| {
            let x_train = features.select(Axis(0), &fold.train);
            let y_train = target.select(Axis(0), &fold.train);
            let x_test = features.select(Axis(0), &fold.test);
            let y_test = target.select(Axis(0), &fold.test);

            let model = M::fit(x_train.view(), y_train.view(), params)?;
            model.score(x_test.view(), y_test.view())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CrossValidation { fold_scores })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kfold_sizes() {
        let folds = KFold::new(3).unwrap().split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(folds[0].test, vec![0, 1, 2, 3]);
        assert_eq!(folds[1].train, vec![0, 1, 2, 3, 7, 8, 9]);
    }

    #[test]
    fn test_kfold_covers_every_row_once() {
        let folds = KFold::new(5).unwrap().split(23).unwrap();
        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 23);
        }
    }

    #[test]
    fn test_kfold_rejects_bad_inputs() {
        assert!(KFold::new(1).is_err());
        assert!(KFold::new(5).unwrap().split(4).is_err());
    }

    #[test]
    fn test_cross_validation_summary() {
        let cv = CrossValidation {
            fold_scores: vec![0.2, 0.4, 0.6],
        };
        assert_relative_eq!(cv.mean(), 0.4);
        assert_relative_eq!(cv.std(), (0.08f64 / 3.0).sqrt(), epsilon = 1e-12);
    }
}
