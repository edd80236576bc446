//! Error types for the estimation pipeline.

use skillport_data::DataError;
use skillport_forest::ForestError;
use skillport_output::{ExportError, ReportError};
use thiserror::Error;

/// Errors raised by the residualizer, learner and aggregator.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Feature rows and targets disagree in length
    #[error("Shape mismatch: {rows} feature rows but {targets} targets")]
    ShapeMismatch {
        /// Number of feature rows
        rows: usize,
        /// Number of targets
        targets: usize,
    },

    /// A NaN or infinite value appeared where a finite one is required
    #[error("Non-finite {stage} value at row {row}")]
    NonFinite {
        /// Stage that produced or received the value
        stage: &'static str,
        /// Offending row
        row: usize,
    },

    /// An occupation referenced by a pair has no skill profile
    #[error("Occupation {0} has no skill profile")]
    MissingProfile(u32),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Nothing to estimate
    #[error("No observations to estimate from")]
    Empty,

    /// Regressor error
    #[error("Regressor error: {0}")]
    Forest(#[from] ForestError),
}

/// Umbrella error for a full pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input tables are invalid or could not be joined
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Estimation failed
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Output tables could not be written
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Run metadata could not be written
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
