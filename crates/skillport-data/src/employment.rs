//! Destination-side occupation attributes: pre-period employment and titles.

use crate::error::{DataError, Result};
use crate::mobility::check_count;
use crate::occupation::OccupationId;
use std::collections::HashMap;

pub(crate) const EMPLOYMENT_TABLE: &str = "employment_changes";
pub(crate) const TITLES_TABLE: &str = "occupation_titles";

/// Pre-period employment by occupation.
#[derive(Debug, Clone, Default)]
pub struct EmploymentTable {
    emp_pre: HashMap<OccupationId, f64>,
}

impl EmploymentTable {
    /// Build from `(occupation, emp_pre)` rows.
    ///
    /// # Errors
    /// Returns an error on duplicate occupations or negative/non-finite values.
    pub fn new(rows: impl IntoIterator<Item = (OccupationId, f64)>) -> Result<Self> {
        let mut emp_pre = HashMap::new();
        for (row, (occ, emp)) in rows.into_iter().enumerate() {
            let emp = check_count(EMPLOYMENT_TABLE, row, "emp_pre", emp)?;
            if emp_pre.insert(occ, emp).is_some() {
                return Err(DataError::DuplicateOccupation {
                    table: EMPLOYMENT_TABLE,
                    occupation: occ.code(),
                });
            }
        }
        Ok(Self { emp_pre })
    }

    /// Pre-period employment for an occupation, if known.
    pub fn emp_pre(&self, occupation: OccupationId) -> Option<f64> {
        self.emp_pre.get(&occupation).copied()
    }

    /// Number of occupations with employment data.
    pub fn len(&self) -> usize {
        self.emp_pre.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.emp_pre.is_empty()
    }
}

/// Human-readable occupation titles.
#[derive(Debug, Clone, Default)]
pub struct OccupationTitles {
    titles: HashMap<OccupationId, String>,
}

impl OccupationTitles {
    /// Build from `(occupation, title)` rows. Later rows win on duplicates.
    pub fn new(rows: impl IntoIterator<Item = (OccupationId, String)>) -> Self {
        Self {
            titles: rows.into_iter().collect(),
        }
    }

    /// Title for an occupation, if known.
    pub fn title(&self, occupation: OccupationId) -> Option<&str> {
        self.titles.get(&occupation).map(String::as_str)
    }

    /// Number of titled occupations.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Whether no titles are present.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employment_lookup() {
        let emp = EmploymentTable::new([
            (OccupationId::new(2), 5000.0),
            (OccupationId::new(3), 1000.0),
        ])
        .unwrap();
        assert_eq!(emp.emp_pre(OccupationId::new(2)), Some(5000.0));
        assert_eq!(emp.emp_pre(OccupationId::new(9)), None);
    }

    #[test]
    fn test_negative_employment_rejected() {
        assert!(EmploymentTable::new([(OccupationId::new(2), -5.0)]).is_err());
    }

    #[test]
    fn test_titles() {
        let titles = OccupationTitles::new([(OccupationId::new(10), "Chief executives".to_string())]);
        assert_eq!(titles.title(OccupationId::new(10)), Some("Chief executives"));
        assert_eq!(titles.title(OccupationId::new(11)), None);
    }
}
