//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading, validating or joining input tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// A required column is absent from an input table
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn {
        /// Table being read
        table: &'static str,
        /// Name of the missing column
        column: String,
    },

    /// A cell holds a value outside the table's contract
    #[error("Invalid value in '{table}' row {row}, column '{column}': {reason}")]
    InvalidValue {
        /// Table being read
        table: &'static str,
        /// Zero-based data row
        row: usize,
        /// Offending column
        column: String,
        /// Why the value was rejected
        reason: String,
    },

    /// An occupation appears more than once in a table keyed by occupation
    #[error("Duplicate occupation {occupation} in '{table}'")]
    DuplicateOccupation {
        /// Table being read
        table: &'static str,
        /// Repeated occupation code
        occupation: u32,
    },

    /// The table has no usable shape (no rows, no skill dimensions, ...)
    #[error("Malformed table '{table}': {reason}")]
    Malformed {
        /// Table being read
        table: &'static str,
        /// Description of the problem
        reason: String,
    },

    /// Switching occupations and skill-profile occupations do not overlap
    #[error("No occupations in common between the switching matrix and the skill matrix")]
    EmptyIntersection,

    /// Every joined row was removed by self-pair or finiteness filtering
    #[error("No valid observations survived filtering ({joined} joined rows)")]
    NoObservations {
        /// Rows present after the join, before filtering
        joined: usize,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for an [`DataError::InvalidValue`].
    pub fn invalid(
        table: &'static str,
        row: usize,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            table,
            row,
            column: column.into(),
            reason: reason.into(),
        }
    }
}
