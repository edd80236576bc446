//! Pipeline configuration.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use skillport_forest::ForestConfig;

/// Residualizer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidualizerConfig {
    /// Stop once the largest per-row change in a sweep falls below this
    /// (default: 1e-10)
    pub tolerance: f64,

    /// Maximum number of alternating sweeps (default: 50)
    pub max_iterations: usize,
}

impl Default for ResidualizerConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 50,
        }
    }
}

impl ResidualizerConfig {
    /// Check that the tolerance is positive and at least one sweep is allowed.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "residualizer tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(ModelError::InvalidConfig(
                "residualizer max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a full estimation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of cross-validation folds (default: 5)
    pub cv_folds: usize,

    /// Fixed-effect removal
    pub residualizer: ResidualizerConfig,

    /// Random forest hyperparameters
    pub forest: ForestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cv_folds: 5,
            residualizer: ResidualizerConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.residualizer.validate()?;
        self.forest.validate()?;
        if self.cv_folds < 2 {
            return Err(ModelError::InvalidConfig(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use skillport_forest::MaxFeatures;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.residualizer.tolerance, 1e-10);
        assert_eq!(config.residualizer.max_iterations, 50);
        assert_eq!(config.forest.n_trees, 200);
        assert_eq!(config.forest.max_depth, Some(20));
        assert_eq!(config.forest.min_samples_leaf, 10);
        assert_eq!(config.forest.max_features, MaxFeatures::Sqrt);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.cv_folds, 5);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(0.0, 50, 5)]
    #[case(f64::NAN, 50, 5)]
    #[case(1e-10, 0, 5)]
    #[case(1e-10, 50, 1)]
    fn test_invalid(#[case] tolerance: f64, #[case] max_iterations: usize, #[case] cv_folds: usize) {
        let config = PipelineConfig {
            residualizer: ResidualizerConfig {
                tolerance,
                max_iterations,
            },
            cv_folds,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_forest_is_reported() {
        let mut config = PipelineConfig::default();
        config.forest.n_trees = 0;
        assert!(matches!(config.validate(), Err(ModelError::Forest(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"cv_folds": 3, "forest": {"n_trees": 10}}"#).unwrap();
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.forest.n_trees, 10);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.residualizer.max_iterations, 50);
    }
}
