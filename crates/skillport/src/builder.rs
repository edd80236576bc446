//! Feature/target construction.
//!
//! Joins switch counts to origin stayer counts and to the skill-profile
//! occupations, then derives the dependent variable
//! `log_switch_share = ln(weighted_switches / weighted_stayers_origin)`.
//!
//! A zero switch count would give `ln(0) = -inf`. Such rows instead use the
//! smallest positive switch count among all joined rows as their numerator.
//! One floor value is shared by every pair.

use serde::{Deserialize, Serialize};
use skillport_data::{
    DataError, OccupationId, OccupationPair, SkillMatrix, StayerCounts, SwitchingMatrix,
};
use std::collections::BTreeSet;

/// One valid directional observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MobilityObservation {
    /// Origin and destination
    pub pair: OccupationPair,
    /// Observed weighted switches (before flooring)
    pub weighted_switches: f64,
    /// Weighted stayers in the origin occupation
    pub weighted_stayers: f64,
    /// Switch share after flooring
    pub switch_share: f64,
    /// Natural log of the switch share
    pub log_switch_share: f64,
    /// Whether the switch count was floored
    pub imputed: bool,
}

/// Counts describing what the builder kept and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Rows surviving the join with stayers and skills
    pub joined_rows: usize,
    /// Observations kept
    pub n_pairs: usize,
    /// Distinct origins among kept observations
    pub n_origins: usize,
    /// Distinct destinations among kept observations
    pub n_destinations: usize,
    /// Smallest kept log switch share
    pub min_log_switch_share: f64,
    /// Largest kept log switch share
    pub max_log_switch_share: f64,
    /// Floor applied to zero switch counts, if any positive count exists
    pub switch_floor: Option<f64>,
    /// Kept observations whose switch count was floored
    pub n_imputed: usize,
    /// Rows dropped because origin equals destination
    pub dropped_self_pairs: usize,
    /// Rows dropped because the log share was not finite
    pub dropped_non_finite: usize,
}

/// Observations ready for residualization.
#[derive(Debug, Clone)]
pub struct RegressionData {
    observations: Vec<MobilityObservation>,
    summary: BuildSummary,
}

impl RegressionData {
    /// Kept observations, in switching-matrix order.
    pub fn observations(&self) -> &[MobilityObservation] {
        &self.observations
    }

    /// Build statistics.
    pub const fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether there are no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Directional pairs in observation order.
    pub fn pairs(&self) -> Vec<OccupationPair> {
        self.observations.iter().map(|o| o.pair).collect()
    }

    /// Dependent variable in observation order.
    pub fn log_switch_shares(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.log_switch_share).collect()
    }
}

struct Joined {
    pair: OccupationPair,
    switches: f64,
    stayers: f64,
}

/// Build the regression observations.
///
/// # Errors
/// [`DataError::EmptyIntersection`] when no switching row joins to both the
/// stayer counts and the skill matrix, [`DataError::NoObservations`] when
/// every joined row is filtered out.
pub fn build_regression_data(
    switching: &SwitchingMatrix,
    stayers: &StayerCounts,
    skills: &SkillMatrix,
) -> Result<RegressionData, DataError> {
    let joined: Vec<Joined> = switching
        .records()
        .iter()
        .filter(|r| skills.contains(r.pair.origin) && skills.contains(r.pair.dest))
        .filter_map(|r| {
            stayers.get(r.pair.origin).map(|s| Joined {
                pair: r.pair,
                switches: r.weighted_switches,
                stayers: s,
            })
        })
        .collect();

    if joined.is_empty() {
        return Err(DataError::EmptyIntersection);
    }

    let switch_floor = joined
        .iter()
        .map(|j| j.switches)
        .filter(|&s| s > 0.0)
        .min_by(f64::total_cmp);

    let mut observations = Vec::with_capacity(joined.len());
    let mut dropped_self_pairs = 0;
    let mut dropped_non_finite = 0;

    for row in &joined {
        if row.pair.is_self_pair() {
            dropped_self_pairs += 1;
            continue;
        }

        let imputed = row.switches == 0.0;
        let numerator = if imputed {
            switch_floor.unwrap_or(0.0)
        } else {
            row.switches
        };
        let switch_share = numerator / row.stayers;
        let log_switch_share = switch_share.ln();

        if !log_switch_share.is_finite() {
            dropped_non_finite += 1;
            continue;
        }

        observations.push(MobilityObservation {
            pair: row.pair,
            weighted_switches: row.switches,
            weighted_stayers: row.stayers,
            switch_share,
            log_switch_share,
            imputed,
        });
    }

    if observations.is_empty() {
        return Err(DataError::NoObservations {
            joined: joined.len(),
        });
    }

    let origins: BTreeSet<OccupationId> = observations.iter().map(|o| o.pair.origin).collect();
    let destinations: BTreeSet<OccupationId> = observations.iter().map(|o| o.pair.dest).collect();
    let (min_log, max_log) = observations.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), o| (lo.min(o.log_switch_share), hi.max(o.log_switch_share)),
    );

    let summary = BuildSummary {
        joined_rows: joined.len(),
        n_pairs: observations.len(),
        n_origins: origins.len(),
        n_destinations: destinations.len(),
        min_log_switch_share: min_log,
        max_log_switch_share: max_log,
        switch_floor,
        n_imputed: observations.iter().filter(|o| o.imputed).count(),
        dropped_self_pairs,
        dropped_non_finite,
    };

    tracing::info!(
        pairs = summary.n_pairs,
        origins = summary.n_origins,
        destinations = summary.n_destinations,
        imputed = summary.n_imputed,
        dropped_self_pairs,
        dropped_non_finite,
        "built regression data"
    );

    Ok(RegressionData {
        observations,
        summary,
    })
}
