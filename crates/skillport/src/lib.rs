#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/skillport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod aggregator;
pub mod builder;
pub mod config;
pub mod error;
pub mod learner;
pub mod pipeline;
pub mod residualizer;

// Re-export main types from sub-crates
pub use skillport_data as data;
pub use skillport_forest as forest;
pub use skillport_output as output;

pub use aggregator::{
    AggregateResult, NormalizationBounds, OccupationAggregate, aggregate, normalize,
};
pub use builder::{BuildSummary, MobilityObservation, RegressionData, build_regression_data};
pub use config::{PipelineConfig, ResidualizerConfig};
pub use error::{ModelError, PipelineError, Result};
pub use learner::{FeatureImportance, LearnerOutput, PortabilityLearner, build_features, feature_names};
pub use pipeline::{OutputFiles, Pipeline, PipelineRun, Stage};
pub use residualizer::{ConvergenceWarning, FixedEffectsFit, Residualized, Residualizer};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
