//! Capability interface for tree-ensemble regressors.

use crate::error::ForestError;
use crate::metrics::r2_score;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// A regressor that can be fitted on a feature matrix and queried for
/// predictions and per-feature importances.
///
/// Any implementation honoring this contract can back the portability
/// learner. Fitting must be a pure function of its arguments: the same
/// features, target and parameters (including any seed carried in
/// `Params`) produce the same model.
pub trait EnsembleRegressor: Sized + Send + Sync {
    /// Hyperparameters, including the random seed
    type Params: Clone + Send + Sync;

    /// Fit a model on `features` (n x p) against `target` (n).
    fn fit(
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
        params: &Self::Params,
    ) -> Result<Self, ForestError>;

    /// Predict one value per row of `features`.
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForestError>;

    /// Importance of each of the p features, summing to 1 (or all zero).
    fn feature_importances(&self) -> Array1<f64>;

    /// Coefficient of determination of the model's predictions on `features`.
    fn score(
        &self,
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
    ) -> Result<f64, ForestError> {
        let predictions = self.predict(features)?;
        r2_score(target, predictions.view())
    }
}

/// Validate a training set: matching lengths, at least one row, and only
/// finite values.
pub fn check_training_data(
    features: ArrayView2<'_, f64>,
    target: ArrayView1<'_, f64>,
) -> Result<(), ForestError> {
    let (n_rows, _) = features.dim();
    if n_rows != target.len() {
        return Err(ForestError::ShapeMismatch {
            rows: n_rows,
            targets: target.len(),
        });
    }
    if n_rows == 0 {
        return Err(ForestError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if let Some(((row, column), _)) = features.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ForestError::NonFiniteFeature { row, column });
    }
    if let Some(row) = target.iter().position(|v| !v.is_finite()) {
        return Err(ForestError::NonFiniteTarget { row });
    }
    Ok(())
}
