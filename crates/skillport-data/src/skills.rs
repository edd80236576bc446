//! Occupation skill-requirement profiles.
//!
//! Each occupation has a vector of D skill dimensions, each normalized to
//! `[0, 1]`. Profiles are stored row-major in an `(n_occupations x D)` matrix
//! with a lookup from occupation code to row.

use crate::error::{DataError, Result};
use crate::occupation::OccupationId;
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;

pub(crate) const SKILL_TABLE: &str = "skill_matrix";

/// Skill profiles for a set of occupations.
#[derive(Debug, Clone)]
pub struct SkillMatrix {
    occupations: Vec<OccupationId>,
    skill_names: Vec<String>,
    values: Array2<f64>,
    index: HashMap<OccupationId, usize>,
}

impl SkillMatrix {
    /// Build a skill matrix.
    ///
    /// # Arguments
    /// * `occupations` - Occupation for each row of `values`
    /// * `skill_names` - Name for each column of `values`
    /// * `values` - Skill levels (n_occupations x n_skills), each in `[0, 1]`
    ///
    /// # Errors
    /// Returns an error if the shapes disagree, there are no skill
    /// dimensions, an occupation repeats, or a value is outside `[0, 1]`.
    pub fn new(
        occupations: Vec<OccupationId>,
        skill_names: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self> {
        let (n_rows, n_cols) = values.dim();

        if n_rows != occupations.len() {
            return Err(DataError::Malformed {
                table: SKILL_TABLE,
                reason: format!(
                    "{} occupations for {} profile rows",
                    occupations.len(),
                    n_rows
                ),
            });
        }
        if n_cols == 0 {
            return Err(DataError::Malformed {
                table: SKILL_TABLE,
                reason: "no skill dimensions".to_string(),
            });
        }
        if n_cols != skill_names.len() {
            return Err(DataError::Malformed {
                table: SKILL_TABLE,
                reason: format!("{} skill names for {} columns", skill_names.len(), n_cols),
            });
        }

        for ((row, col), &v) in values.indexed_iter() {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(DataError::invalid(
                    SKILL_TABLE,
                    row,
                    skill_names[col].clone(),
                    format!("skill level {v} outside [0, 1]"),
                ));
            }
        }

        let mut index = HashMap::with_capacity(n_rows);
        for (row, &occ) in occupations.iter().enumerate() {
            if index.insert(occ, row).is_some() {
                return Err(DataError::DuplicateOccupation {
                    table: SKILL_TABLE,
                    occupation: occ.code(),
                });
            }
        }

        Ok(Self {
            occupations,
            skill_names,
            values,
            index,
        })
    }

    /// Skill profile for an occupation, if known.
    pub fn profile(&self, occupation: OccupationId) -> Option<ArrayView1<'_, f64>> {
        self.index.get(&occupation).map(|&row| self.values.row(row))
    }

    /// Whether the occupation has a skill profile.
    pub fn contains(&self, occupation: OccupationId) -> bool {
        self.index.contains_key(&occupation)
    }

    /// Occupations in row order.
    pub fn occupations(&self) -> &[OccupationId] {
        &self.occupations
    }

    /// Skill dimension names in column order.
    pub fn skill_names(&self) -> &[String] {
        &self.skill_names
    }

    /// Number of skill dimensions (D).
    pub fn n_skills(&self) -> usize {
        self.skill_names.len()
    }

    /// Number of occupations with a profile.
    pub fn n_occupations(&self) -> usize {
        self.occupations.len()
    }
}
