//! Portability learner.
//!
//! Predicts the fixed-effect residual of each pair from skill profiles. For
//! D skill dimensions the feature vector is
//!
//! [origin profile (D) | destination profile (D) | origin - destination (D)]
//!
//! The in-sample prediction is the pair's (unnormalized) skill portability.
//! K-fold cross-validation trains separate models and only reports
//! out-of-sample R²; the deployed model is always fitted on every pair.

use crate::error::ModelError;
use crate::residualizer::Residualized;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use serde::{Deserialize, Serialize};
use skillport_data::{OccupationPair, SkillMatrix};
use skillport_forest::{CrossValidation, EnsembleRegressor, KFold, RandomForest, cross_validate};

/// Importance of one named feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// `origin_<skill>`, `dest_<skill>` or `diff_<skill>`
    pub feature_name: String,
    /// Share of total impurity reduction
    pub importance: f64,
}

/// Feature names for a set of skill dimensions, in column order.
pub fn feature_names(skill_names: &[String]) -> Vec<String> {
    ["origin", "dest", "diff"]
        .iter()
        .flat_map(|prefix| skill_names.iter().map(move |name| format!("{prefix}_{name}")))
        .collect()
}

/// Build the (n_pairs x 3D) feature matrix.
///
/// # Errors
/// [`ModelError::MissingProfile`] when a pair references an occupation
/// without a skill profile.
pub fn build_features(
    pairs: &[OccupationPair],
    skills: &SkillMatrix,
) -> Result<Array2<f64>, ModelError> {
    let d = skills.n_skills();
    let mut features = Array2::<f64>::zeros((pairs.len(), 3 * d));

    for (mut row, pair) in features.rows_mut().into_iter().zip(pairs) {
        let origin = skills
            .profile(pair.origin)
            .ok_or(ModelError::MissingProfile(pair.origin.code()))?;
        let dest = skills
            .profile(pair.dest)
            .ok_or(ModelError::MissingProfile(pair.dest.code()))?;

        row.slice_mut(s![..d]).assign(&origin);
        row.slice_mut(s![d..2 * d]).assign(&dest);
        row.slice_mut(s![2 * d..]).assign(&(&origin - &dest));
    }

    Ok(features)
}

/// Output of the learner stage.
#[derive(Debug, Clone)]
pub struct LearnerOutput<R = RandomForest> {
    model: R,
    predictions: Array1<f64>,
    train_r_squared: f64,
    cross_validation: CrossValidation,
    importances: Vec<FeatureImportance>,
}

impl<R> LearnerOutput<R> {
    /// Model fitted on every pair.
    pub const fn model(&self) -> &R {
        &self.model
    }

    /// In-sample predictions, one per pair, in observation order.
    pub fn predictions(&self) -> ArrayView1<'_, f64> {
        self.predictions.view()
    }

    /// In-sample R² of the deployed model.
    pub const fn train_r_squared(&self) -> f64 {
        self.train_r_squared
    }

    /// Out-of-sample R² per fold.
    pub const fn cross_validation(&self) -> &CrossValidation {
        &self.cross_validation
    }

    /// Feature importances, descending. Ties keep column order.
    pub fn importances(&self) -> &[FeatureImportance] {
        &self.importances
    }
}

/// Fits an [`EnsembleRegressor`] from skill features to residuals.
#[derive(Debug, Clone)]
pub struct PortabilityLearner<R: EnsembleRegressor = RandomForest> {
    params: R::Params,
    kfold: KFold,
}

impl<R: EnsembleRegressor> PortabilityLearner<R> {
    /// Create a learner.
    ///
    /// # Arguments
    /// * `params` - Regressor hyperparameters, including its seed
    /// * `cv_folds` - Number of cross-validation folds (at least 2)
    pub fn new(params: R::Params, cv_folds: usize) -> Result<Self, ModelError> {
        Ok(Self {
            params,
            kfold: KFold::new(cv_folds)?,
        })
    }

    /// Regressor hyperparameters.
    pub const fn params(&self) -> &R::Params {
        &self.params
    }

    /// Fit on residualized pairs, building features from `skills`.
    pub fn fit(
        &self,
        residualized: &Residualized,
        skills: &SkillMatrix,
    ) -> Result<LearnerOutput<R>, ModelError> {
        let features = build_features(residualized.pairs(), skills)?;
        let names = feature_names(skills.skill_names());
        self.fit_features(features.view(), residualized.residuals(), &names)
    }

    /// Fit on a prepared feature matrix.
    ///
    /// # Errors
    /// Fails on a shape mismatch, non-finite features or targets, invalid
    /// hyperparameters, fewer rows than folds, or non-finite predictions.
    pub fn fit_features(
        &self,
        features: ArrayView2<'_, f64>,
        target: ArrayView1<'_, f64>,
        names: &[String],
    ) -> Result<LearnerOutput<R>, ModelError> {
        if features.nrows() != target.len() {
            return Err(ModelError::ShapeMismatch {
                rows: features.nrows(),
                targets: target.len(),
            });
        }
        if features.ncols() != names.len() {
            return Err(ModelError::InvalidConfig(format!(
                "{} feature names for {} feature columns",
                names.len(),
                features.ncols()
            )));
        }
        if target.is_empty() {
            return Err(ModelError::Empty);
        }
        if let Some(((row, _), _)) = features.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ModelError::NonFinite {
                stage: "feature",
                row,
            });
        }

        let model = R::fit(features, target, &self.params)?;
        let predictions = model.predict(features)?;
        if let Some(row) = predictions.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite {
                stage: "prediction",
                row,
            });
        }
        let train_r_squared = skillport_forest::r2_score(target, predictions.view())?;

        let cross_validation = cross_validate::<R>(features, target, &self.params, &self.kfold)?;

        let raw_importances = model.feature_importances();
        let mut importances: Vec<FeatureImportance> = names
            .iter()
            .zip(raw_importances.iter().copied())
            .map(|(name, importance)| FeatureImportance {
                feature_name: name.clone(),
                importance,
            })
            .collect();
        importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        tracing::info!(
            pairs = target.len(),
            features = names.len(),
            train_r_squared,
            cv_r_squared = cross_validation.mean(),
            cv_std = cross_validation.std(),
            "fitted portability learner"
        );

        Ok(LearnerOutput {
            model,
            predictions,
            train_r_squared,
            cross_validation,
            importances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use skillport_data::OccupationId;
    use skillport_forest::{ForestConfig, MaxFeatures};

    fn skills() -> SkillMatrix {
        SkillMatrix::new(
            vec![OccupationId::new(1), OccupationId::new(2)],
            vec!["Reading".to_string(), "Writing".to_string()],
            array![[0.9, 0.2], [0.4, 0.6]],
        )
        .unwrap()
    }

    #[test]
    fn test_feature_names() {
        let names = feature_names(&["Reading".to_string(), "Writing".to_string()]);
        assert_eq!(
            names,
            vec![
                "origin_Reading",
                "origin_Writing",
                "dest_Reading",
                "dest_Writing",
                "diff_Reading",
                "diff_Writing"
            ]
        );
    }

    #[test]
    fn test_build_features() {
        let pairs = vec![OccupationPair::new(OccupationId::new(1), OccupationId::new(2))];
        let x = build_features(&pairs, &skills()).unwrap();
        assert_eq!(x.dim(), (1, 6));
        let expected = [0.9, 0.2, 0.4, 0.6, 0.5, -0.4];
        for (got, want) in x.row(0).iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_missing_profile() {
        let pairs = vec![OccupationPair::new(OccupationId::new(1), OccupationId::new(7))];
        assert!(matches!(
            build_features(&pairs, &skills()),
            Err(ModelError::MissingProfile(7))
        ));
    }

    #[test]
    fn test_shape_and_finiteness_checks() {
        let learner = PortabilityLearner::<RandomForest>::new(ForestConfig::default(), 2).unwrap();
        let names = vec!["a".to_string()];

        let x = Array2::<f64>::zeros((3, 1));
        let y = Array1::<f64>::zeros(2);
        assert!(matches!(
            learner.fit_features(x.view(), y.view(), &names),
            Err(ModelError::ShapeMismatch { rows: 3, targets: 2 })
        ));

        let mut x = Array2::<f64>::zeros((3, 1));
        x[[1, 0]] = f64::INFINITY;
        let y = Array1::<f64>::zeros(3);
        assert!(matches!(
            learner.fit_features(x.view(), y.view(), &names),
            Err(ModelError::NonFinite { row: 1, .. })
        ));
    }

    #[test]
    fn test_too_few_rows_for_folds() {
        let config = ForestConfig {
            n_trees: 3,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            ..Default::default()
        };
        let learner = PortabilityLearner::<RandomForest>::new(config, 5).unwrap();
        let x = array![[0.1], [0.2], [0.3]];
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            learner.fit_features(x.view(), y.view(), &["a".to_string()]),
            Err(ModelError::Forest(_))
        ));
    }

    #[test]
    fn test_rejects_single_fold() {
        assert!(PortabilityLearner::<RandomForest>::new(ForestConfig::default(), 1).is_err());
    }
}
