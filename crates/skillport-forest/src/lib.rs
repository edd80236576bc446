#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/skillport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod forest;
pub mod metrics;
pub mod regressor;
pub mod tree;
pub mod validation;

// Re-export main types
pub use config::{ForestConfig, MaxFeatures, TreeParams};
pub use error::ForestError;
pub use forest::RandomForest;
pub use metrics::r2_score;
pub use regressor::{EnsembleRegressor, check_training_data};
pub use tree::RegressionTree;
pub use validation::{CrossValidation, Fold, KFold, cross_validate};
