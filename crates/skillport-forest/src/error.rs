//! Errors raised while fitting or evaluating tree ensembles.

use thiserror::Error;

/// Errors that can occur during ensemble fitting, prediction or validation
#[derive(Debug, Error)]
pub enum ForestError {
    /// Feature rows and target length disagree
    #[error("Shape mismatch: {rows} feature rows but {targets} targets")]
    ShapeMismatch {
        /// Number of feature rows
        rows: usize,
        /// Number of target values
        targets: usize,
    },

    /// Prediction input has the wrong number of columns
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch {
        /// Features seen during fitting
        expected: usize,
        /// Features supplied
        actual: usize,
    },

    /// A feature value is NaN or infinite
    #[error("Non-finite feature at row {row}, column {column}")]
    NonFiniteFeature {
        /// Row of the offending value
        row: usize,
        /// Column of the offending value
        column: usize,
    },

    /// A target value is NaN or infinite
    #[error("Non-finite target at row {row}")]
    NonFiniteTarget {
        /// Row of the offending value
        row: usize,
    },

    /// Nothing to train on
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData {
        /// Required number of samples
        required: usize,
        /// Actual number of samples
        actual: usize,
    },

    /// Invalid hyperparameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
