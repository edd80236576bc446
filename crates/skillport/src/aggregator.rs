//! Occupation-level aggregation.
//!
//! Pairwise predictions are min-max normalized to [0, 1] across all pairs.
//! Each origin occupation then gets
//!
//! - a weighted aggregate: Σ_d norm(o,d)·emp(d) / Σ_d emp(d) over
//!   destinations with known pre-period employment, and
//! - an unweighted aggregate: the mean of norm(o,·) over all destinations.
//!
//! Origins without usable destination employment keep their unweighted
//! aggregate and are listed as excluded from the weighted one.

use crate::error::ModelError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use skillport_data::{EmploymentTable, OccupationId, OccupationPair};
use std::collections::BTreeMap;

/// Min and max used for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationBounds {
    /// Smallest raw score
    pub min: f64,
    /// Largest raw score
    pub max: f64,
}

impl NormalizationBounds {
    /// Bounds of a non-empty set of finite values.
    pub fn from_values(values: ArrayView1<'_, f64>) -> Result<Self, ModelError> {
        if values.is_empty() {
            return Err(ModelError::Empty);
        }
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite {
                stage: "prediction",
                row,
            });
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Ok(Self { min, max })
    }

    /// Whether every value is the same.
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Map a raw score into [0, 1]. Everything maps to 0 when the range is
    /// degenerate.
    pub fn apply(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }
}

/// Min-max normalize `values`, returning the scaled values and their bounds.
pub fn normalize(values: ArrayView1<'_, f64>) -> Result<(Array1<f64>, NormalizationBounds), ModelError> {
    let bounds = NormalizationBounds::from_values(values)?;
    if bounds.is_degenerate() {
        tracing::warn!(
            value = bounds.min,
            "degenerate portability range; all normalized scores set to 0"
        );
    }
    Ok((values.mapv(|v| bounds.apply(v)), bounds))
}

/// Aggregates for one origin occupation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupationAggregate {
    /// Origin occupation
    pub occupation: OccupationId,
    /// Employment-weighted mean normalized portability
    pub aggregate_portability: Option<f64>,
    /// Unweighted mean normalized portability
    pub mean_pairwise_portability: f64,
    /// Destinations observed for this origin
    pub n_destinations: usize,
}

/// Output of the aggregator stage.
#[derive(Debug, Clone)]
pub struct AggregateResult {
    normalized: Array1<f64>,
    bounds: NormalizationBounds,
    occupations: Vec<OccupationAggregate>,
    excluded: Vec<OccupationId>,
}

impl AggregateResult {
    /// Normalized pairwise scores, in observation order.
    pub fn normalized(&self) -> ArrayView1<'_, f64> {
        self.normalized.view()
    }

    /// Normalization bounds.
    pub const fn bounds(&self) -> &NormalizationBounds {
        &self.bounds
    }

    /// Whether the raw scores had a zero range.
    pub fn degenerate_range(&self) -> bool {
        self.bounds.is_degenerate()
    }

    /// Per-origin aggregates, by weighted aggregate descending (missing
    /// last), ties broken by occupation.
    pub fn occupations(&self) -> &[OccupationAggregate] {
        &self.occupations
    }

    /// Origins left out of the weighted aggregate, ascending.
    pub fn excluded(&self) -> &[OccupationId] {
        &self.excluded
    }
}

#[derive(Default)]
struct Accumulator {
    weighted_sum: f64,
    weight_total: f64,
    sum: f64,
    count: usize,
}

/// Normalize pairwise predictions and aggregate them by origin.
///
/// # Errors
/// Fails when `pairs` and `predictions` differ in length, are empty, or a
/// prediction is not finite.
pub fn aggregate(
    pairs: &[OccupationPair],
    predictions: ArrayView1<'_, f64>,
    employment: &EmploymentTable,
) -> Result<AggregateResult, ModelError> {
    if pairs.len() != predictions.len() {
        return Err(ModelError::ShapeMismatch {
            rows: pairs.len(),
            targets: predictions.len(),
        });
    }

    let (normalized, bounds) = normalize(predictions)?;

    let mut by_origin: BTreeMap<OccupationId, Accumulator> = BTreeMap::new();
    for (pair, &score) in pairs.iter().zip(normalized.iter()) {
        let acc = by_origin.entry(pair.origin).or_default();
        acc.sum += score;
        acc.count += 1;
        if let Some(emp) = employment.emp_pre(pair.dest) {
            acc.weighted_sum += score * emp;
            acc.weight_total += emp;
        }
    }

    let mut excluded = Vec::new();
    let mut occupations: Vec<OccupationAggregate> = by_origin
        .into_iter()
        .map(|(occupation, acc)| {
            let aggregate_portability = if acc.weight_total > 0.0 {
                Some(acc.weighted_sum / acc.weight_total)
            } else {
                excluded.push(occupation);
                None
            };
            OccupationAggregate {
                occupation,
                aggregate_portability,
                mean_pairwise_portability: acc.sum / acc.count as f64,
                n_destinations: acc.count,
            }
        })
        .collect();

    occupations.sort_by(|a, b| {
        match (a.aggregate_portability, b.aggregate_portability) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then(a.occupation.cmp(&b.occupation))
    });

    if !excluded.is_empty() {
        tracing::warn!(
            count = excluded.len(),
            "occupations without destination employment excluded from weighted aggregate"
        );
    }
    tracing::info!(
        occupations = occupations.len(),
        min = bounds.min,
        max = bounds.max,
        "aggregated portability"
    );

    Ok(AggregateResult {
        normalized,
        bounds,
        occupations,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn pair(o: u32, d: u32) -> OccupationPair {
        OccupationPair::new(OccupationId::new(o), OccupationId::new(d))
    }

    fn employment(rows: &[(u32, f64)]) -> EmploymentTable {
        EmploymentTable::new(rows.iter().map(|&(o, e)| (OccupationId::new(o), e))).unwrap()
    }

    #[test]
    fn test_normalize_range() {
        let (norm, bounds) = normalize(array![2.0, -1.0, 0.5].view()).unwrap();
        assert_eq!(bounds, NormalizationBounds { min: -1.0, max: 2.0 });
        assert_relative_eq!(norm[0], 1.0);
        assert_relative_eq!(norm[1], 0.0);
        assert_relative_eq!(norm[2], 0.5);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let (once, _) = normalize(array![0.3, -0.7, 1.9, 0.0].view()).unwrap();
        let (twice, bounds) = normalize(once.view()).unwrap();
        assert_eq!(bounds, NormalizationBounds { min: 0.0, max: 1.0 });
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_degenerate_range_maps_to_zero() {
        let (norm, bounds) = normalize(array![0.4, 0.4, 0.4].view()).unwrap();
        assert!(bounds.is_degenerate());
        assert!(norm.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_weighted_aggregate() {
        // Origin 1 has raw scores 1.0 (->2) and 0.0 (->3); destination 2 has
        // five times the employment of destination 3.
        let pairs = vec![pair(1, 2), pair(1, 3), pair(2, 3)];
        let predictions = array![1.0, 0.0, 0.5];
        let emp = employment(&[(2, 5000.0), (3, 1000.0)]);

        let result = aggregate(&pairs, predictions.view(), &emp).unwrap();
        let one = result
            .occupations()
            .iter()
            .find(|a| a.occupation == OccupationId::new(1))
            .unwrap();

        assert_relative_eq!(one.aggregate_portability.unwrap(), 5.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(one.mean_pairwise_portability, 0.5);
        assert_eq!(one.n_destinations, 2);
        assert!(result.excluded().is_empty());
    }

    #[test]
    fn test_weighted_mean_within_origin_range() {
        let pairs = vec![pair(1, 2), pair(1, 3), pair(1, 4), pair(2, 1), pair(2, 4)];
        let predictions = array![0.9, -0.2, 0.4, 1.3, 0.1];
        let emp = employment(&[(1, 10.0), (2, 300.0), (3, 45.0), (4, 7.0)]);

        let result = aggregate(&pairs, predictions.view(), &emp).unwrap();
        let normalized = result.normalized();
        for agg in result.occupations() {
            let scores: Vec<f64> = pairs
                .iter()
                .zip(normalized.iter())
                .filter(|(p, _)| p.origin == agg.occupation)
                .map(|(_, &s)| s)
                .collect();
            let lo = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let weighted = agg.aggregate_portability.unwrap();
            assert!(weighted >= lo - 1e-12 && weighted <= hi + 1e-12);
        }
    }

    #[test]
    fn test_missing_employment_is_excluded_and_sorted_last() {
        let pairs = vec![pair(1, 2), pair(2, 9), pair(3, 2)];
        let predictions = array![0.1, 0.8, 0.6];
        let emp = employment(&[(2, 100.0)]);

        let result = aggregate(&pairs, predictions.view(), &emp).unwrap();
        assert_eq!(result.excluded(), &[OccupationId::new(2)]);

        let order: Vec<u32> = result
            .occupations()
            .iter()
            .map(|a| a.occupation.code())
            .collect();
        assert_eq!(order, vec![3, 1, 2]);

        let two = &result.occupations()[2];
        assert_eq!(two.aggregate_portability, None);
        assert_relative_eq!(two.mean_pairwise_portability, 1.0);
    }

    #[test]
    fn test_zero_employment_total_is_excluded() {
        let pairs = vec![pair(1, 2)];
        let result = aggregate(&pairs, array![0.3].view(), &employment(&[(2, 0.0)])).unwrap();
        assert_eq!(result.excluded(), &[OccupationId::new(1)]);
        assert!(result.degenerate_range());
    }

    #[test]
    fn test_length_mismatch() {
        let result = aggregate(&[pair(1, 2)], array![0.1, 0.2].view(), &employment(&[]));
        assert!(matches!(result, Err(ModelError::ShapeMismatch { .. })));
    }
}
