//! Hyperparameters for trees and forests.

use crate::error::ForestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of candidate features drawn at each split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`
    #[default]
    Sqrt,
    /// Every feature
    All,
    /// `floor(fraction * n_features)`, with fraction in (0, 1]
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns (at least 1).
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match *self {
            Self::Sqrt => (n_features as f64).sqrt().floor() as usize,
            Self::All => n_features,
            Self::Fraction(f) => (f * n_features as f64).floor() as usize,
        };
        k.clamp(1, n_features.max(1))
    }

    fn validate(&self) -> Result<(), ForestError> {
        match *self {
            Self::Fraction(f) if !(f > 0.0 && f <= 1.0) => Err(ForestError::InvalidParameter(
                format!("max_features fraction {f} must be in (0, 1]"),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for MaxFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqrt => write!(f, "sqrt"),
            Self::All => write!(f, "all"),
            Self::Fraction(x) => write!(f, "{x}"),
        }
    }
}

impl FromStr for MaxFeatures {
    type Err = ForestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqrt" => Ok(Self::Sqrt),
            "all" | "none" => Ok(Self::All),
            other => {
                let fraction: f64 = other.parse().map_err(|_| {
                    ForestError::InvalidParameter(format!(
                        "max_features must be 'sqrt', 'all' or a fraction, got '{s}'"
                    ))
                })?;
                let parsed = Self::Fraction(fraction);
                parsed.validate()?;
                Ok(parsed)
            }
        }
    }
}

/// Parameters controlling how a single regression tree grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Minimum number of samples in each leaf
    pub min_samples_leaf: usize,
    /// Candidate features per split
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

/// Random forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees (default: 200)
    pub n_trees: usize,

    /// Maximum tree depth (default: 20)
    pub max_depth: Option<usize>,

    /// Minimum samples per leaf (default: 10)
    pub min_samples_leaf: usize,

    /// Candidate features per split (default: sqrt)
    pub max_features: MaxFeatures,

    /// Draw a bootstrap sample for each tree (default: true)
    pub bootstrap: bool,

    /// Seed for every random draw (default: 42)
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: Some(20),
            min_samples_leaf: 10,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Same configuration with a different seed.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Per-tree growth parameters.
    pub const fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }

    /// Check that every hyperparameter is usable.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.n_trees == 0 {
            return Err(ForestError::InvalidParameter(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ForestError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForestError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        self.max_features.validate()
    }
}
