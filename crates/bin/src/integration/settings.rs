//! Pipeline configuration from TOML files and command-line flags.
//!
//! Precedence, lowest to highest: built-in defaults, the `--config` file,
//! individual flags. Keys missing from the file keep their defaults.

use clap::Args;
use skillport::forest::MaxFeatures;
use skillport::{ModelError, PipelineConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for a pipeline configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be rendered as TOML
    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    /// Values are out of range
    #[error(transparent)]
    Invalid(#[from] ModelError),
}

/// Flags overriding individual configuration values.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct ConfigOverrides {
    /// Number of trees in the forest
    #[arg(long)]
    pub(crate) trees: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    pub(crate) max_depth: Option<usize>,

    /// Minimum samples per leaf
    #[arg(long)]
    pub(crate) min_leaf: Option<usize>,

    /// Candidate features per split: "sqrt", "all" or a fraction in (0, 1]
    #[arg(long)]
    pub(crate) max_features: Option<MaxFeatures>,

    /// Random seed
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Residualizer convergence tolerance
    #[arg(long)]
    pub(crate) tolerance: Option<f64>,

    /// Residualizer iteration cap
    #[arg(long)]
    pub(crate) max_iterations: Option<usize>,

    /// Cross-validation folds
    #[arg(long)]
    pub(crate) cv_folds: Option<usize>,
}

impl ConfigOverrides {
    /// Apply every flag that was given.
    pub(crate) fn apply(&self, config: &mut PipelineConfig) {
        if let Some(trees) = self.trees {
            config.forest.n_trees = trees;
        }
        if let Some(depth) = self.max_depth {
            config.forest.max_depth = Some(depth);
        }
        if let Some(min_leaf) = self.min_leaf {
            config.forest.min_samples_leaf = min_leaf;
        }
        if let Some(max_features) = self.max_features {
            config.forest.max_features = max_features;
        }
        if let Some(seed) = self.seed {
            config.forest.seed = seed;
        }
        if let Some(tolerance) = self.tolerance {
            config.residualizer.tolerance = tolerance;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.residualizer.max_iterations = max_iterations;
        }
        if let Some(cv_folds) = self.cv_folds {
            config.cv_folds = cv_folds;
        }
    }
}

/// Parse a TOML configuration document.
pub(crate) fn parse_config(content: &str) -> Result<PipelineConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Render a configuration as TOML.
pub(crate) fn render_config(config: &PipelineConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Build the effective configuration and validate it.
pub(crate) fn resolve_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<PipelineConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::debug!(path = %path.display(), "loaded config file");
            parse_config(&content)?
        }
        None => PipelineConfig::default(),
    };

    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}
