//! Two-way fixed-effect residualization.
//!
//! Removes an additive origin effect α_o and destination effect λ_d from the
//! log switch share:
//!
//! ln(s_od) = α_o + λ_d + ε_od
//!
//! Each sweep subtracts the current per-origin mean residual from every row,
//! then the per-destination mean of the updated residual. This is a
//! Gauss-Seidel projection onto the two fixed-effect subspaces; at
//! convergence every origin group and every destination group has a mean
//! residual of zero.
//!
//! Fit is reported as R² = 1 - Σε² / Σ(y - ȳ)².

use crate::builder::RegressionData;
use crate::config::ResidualizerConfig;
use crate::error::ModelError;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use skillport_data::{OccupationId, OccupationPair};
use std::collections::HashMap;
use std::fmt;

/// The iteration cap was reached before the tolerance was met.
///
/// Residuals are still returned; group means are then only approximately
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceWarning {
    /// Sweeps performed
    pub iterations: usize,
    /// Largest per-row change in the final sweep
    pub max_change: f64,
    /// Tolerance that was not met
    pub tolerance: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fixed-effect residualization did not converge after {} iterations \
             (max change {:.3e} >= tolerance {:.3e})",
            self.iterations, self.max_change, self.tolerance
        )
    }
}

/// Fit statistics of the fixed-effects model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedEffectsFit {
    /// 1 - SS_residual / SS_total, or 0 when SS_total is 0
    pub r_squared: f64,
    /// Sweeps performed
    pub iterations: usize,
    /// Largest per-row change in the final sweep
    pub max_change: f64,
    /// Population standard deviation of the residuals
    pub residual_std: f64,
    /// Whether the tolerance was met
    pub converged: bool,
    /// Present when the iteration cap was hit
    pub warning: Option<ConvergenceWarning>,
}

/// Residualized observations.
#[derive(Debug, Clone)]
pub struct Residualized {
    pairs: Vec<OccupationPair>,
    log_switch_shares: Array1<f64>,
    residuals: Array1<f64>,
    fit: FixedEffectsFit,
}

impl Residualized {
    /// Pairs in observation order.
    pub fn pairs(&self) -> &[OccupationPair] {
        &self.pairs
    }

    /// Dependent variable in observation order.
    pub fn log_switch_shares(&self) -> ArrayView1<'_, f64> {
        self.log_switch_shares.view()
    }

    /// Residuals in observation order.
    pub fn residuals(&self) -> ArrayView1<'_, f64> {
        self.residuals.view()
    }

    /// Fit statistics.
    pub const fn fit(&self) -> &FixedEffectsFit {
        &self.fit
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no observations.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Dense group index for each row.
fn group_index(keys: impl Iterator<Item = OccupationId>) -> (Vec<usize>, usize) {
    let mut lookup: HashMap<OccupationId, usize> = HashMap::new();
    let index = keys
        .map(|key| {
            let next = lookup.len();
            *lookup.entry(key).or_insert(next)
        })
        .collect();
    (index, lookup.len())
}

/// Subtract each group's mean residual from its rows.
fn demean_groups(residuals: &mut Array1<f64>, groups: &[usize], n_groups: usize) {
    let mut sums = vec![0.0; n_groups];
    let mut counts = vec![0usize; n_groups];
    for (&g, &r) in groups.iter().zip(residuals.iter()) {
        sums[g] += r;
        counts[g] += 1;
    }
    let means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| s / c as f64)
        .collect();
    for (&g, r) in groups.iter().zip(residuals.iter_mut()) {
        *r -= means[g];
    }
}

/// Fixed-effect residualizer
#[derive(Debug, Clone, Copy)]
pub struct Residualizer {
    config: ResidualizerConfig,
}

impl Residualizer {
    /// Create a residualizer with the given tolerance and iteration cap.
    pub fn new(config: ResidualizerConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &ResidualizerConfig {
        &self.config
    }

    /// Residualize the builder's observations.
    pub fn fit(&self, data: &RegressionData) -> Result<Residualized, ModelError> {
        let pairs = data.pairs();
        let y = Array1::from_vec(data.log_switch_shares());
        let (residuals, fit) = self.residualize(&pairs, y.view())?;

        Ok(Residualized {
            pairs,
            log_switch_shares: y,
            residuals,
            fit,
        })
    }

    /// Remove origin and destination effects from `y`.
    ///
    /// # Errors
    /// Fails on a length mismatch, empty input, or a non-finite value in `y`
    /// or in the resulting residuals.
    pub fn residualize(
        &self,
        pairs: &[OccupationPair],
        y: ArrayView1<'_, f64>,
    ) -> Result<(Array1<f64>, FixedEffectsFit), ModelError> {
        if pairs.len() != y.len() {
            return Err(ModelError::ShapeMismatch {
                rows: pairs.len(),
                targets: y.len(),
            });
        }
        if y.is_empty() {
            return Err(ModelError::Empty);
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite {
                stage: "log switch share",
                row,
            });
        }

        let (origins, n_origins) = group_index(pairs.iter().map(|p| p.origin));
        let (dests, n_dests) = group_index(pairs.iter().map(|p| p.dest));

        let mut residuals = y.to_owned();
        let mut iterations = 0;
        let mut max_change = f64::INFINITY;

        while iterations < self.config.max_iterations {
            let previous = residuals.clone();
            demean_groups(&mut residuals, &origins, n_origins);
            demean_groups(&mut residuals, &dests, n_dests);
            iterations += 1;

            max_change = residuals
                .iter()
                .zip(previous.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);

            if max_change < self.config.tolerance {
                break;
            }
        }

        if let Some(row) = residuals.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite {
                stage: "residual",
                row,
            });
        }

        let converged = max_change < self.config.tolerance;
        let warning = (!converged).then_some(ConvergenceWarning {
            iterations,
            max_change,
            tolerance: self.config.tolerance,
        });
        if let Some(warning) = &warning {
            tracing::warn!(
                iterations,
                max_change,
                tolerance = self.config.tolerance,
                "{warning}"
            );
        }

        let n = y.len() as f64;
        let y_mean = y.sum() / n;
        let ss_total: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
        let ss_residual: f64 = residuals.iter().map(|r| r * r).sum();
        let r_squared = if ss_total > 0.0 {
            1.0 - ss_residual / ss_total
        } else {
            tracing::warn!("dependent variable has zero variance; reporting R² = 0");
            0.0
        };

        let residual_mean = residuals.sum() / n;
        let residual_std = (residuals
            .iter()
            .map(|r| (r - residual_mean).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();

        tracing::info!(
            r_squared,
            iterations,
            converged,
            residual_std,
            origins = n_origins,
            destinations = n_dests,
            "removed fixed effects"
        );

        Ok((
            residuals,
            FixedEffectsFit {
                r_squared,
                iterations,
                max_change,
                residual_std,
                converged,
                warning,
            },
        ))
    }
}
