//! Occupation-to-occupation mobility tables.
//!
//! The switching matrix holds weighted counts of employed workers moving from
//! an origin occupation to a destination occupation; stayer counts hold the
//! weighted number of workers remaining in each origin occupation.

use crate::error::{DataError, Result};
use crate::occupation::{OccupationId, OccupationPair};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub(crate) const SWITCHING_TABLE: &str = "switching_matrix";
pub(crate) const STAYER_TABLE: &str = "stayer_counts";

/// Reject negative or non-finite counts.
pub(crate) fn check_count(table: &'static str, row: usize, column: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(DataError::invalid(table, row, column, "value is not finite"));
    }
    if value < 0.0 {
        return Err(DataError::invalid(
            table,
            row,
            column,
            format!("value {value} is negative"),
        ));
    }
    Ok(value)
}

/// One row of the switching matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwitchRecord {
    /// Directional occupation pair
    pub pair: OccupationPair,
    /// Weighted count of workers switching from origin to destination
    pub weighted_switches: f64,
}

impl SwitchRecord {
    /// Create a switch record from raw occupation codes.
    pub const fn new(origin: u32, dest: u32, weighted_switches: f64) -> Self {
        Self {
            pair: OccupationPair::new(OccupationId::new(origin), OccupationId::new(dest)),
            weighted_switches,
        }
    }
}

/// Directional switch counts between occupations.
#[derive(Debug, Clone, Default)]
pub struct SwitchingMatrix {
    records: Vec<SwitchRecord>,
}

impl SwitchingMatrix {
    /// Build a switching matrix, validating that every count is finite and
    /// non-negative.
    pub fn new(records: Vec<SwitchRecord>) -> Result<Self> {
        for (row, record) in records.iter().enumerate() {
            check_count(SWITCHING_TABLE, row, "weighted_switches", record.weighted_switches)?;
        }
        Ok(Self { records })
    }

    /// All rows in input order.
    pub fn records(&self) -> &[SwitchRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Weighted stayer counts keyed by origin occupation.
#[derive(Debug, Clone, Default)]
pub struct StayerCounts {
    counts: HashMap<OccupationId, f64>,
}

impl StayerCounts {
    /// Build from `(occupation, weighted_stayers)` rows.
    ///
    /// # Errors
    /// Returns an error on duplicate occupations or negative/non-finite counts.
    pub fn new(rows: impl IntoIterator<Item = (OccupationId, f64)>) -> Result<Self> {
        let mut counts = HashMap::new();
        for (row, (occ, stayers)) in rows.into_iter().enumerate() {
            let stayers = check_count(STAYER_TABLE, row, "weighted_stayers", stayers)?;
            if counts.insert(occ, stayers).is_some() {
                return Err(DataError::DuplicateOccupation {
                    table: STAYER_TABLE,
                    occupation: occ.code(),
                });
            }
        }
        Ok(Self { counts })
    }

    /// Stayers for an occupation, if present.
    pub fn get(&self, occupation: OccupationId) -> Option<f64> {
        self.counts.get(&occupation).copied()
    }

    /// Number of occupations with a stayer count.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no stayer counts are present.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
