//! Plain-text summary of an estimation run.
//!
//! Renders the fit statistics of both estimation stages, the most important
//! learner features, and the most and least portable occupations.

use crate::export::{AggregatePortabilityRecord, FeatureImportanceRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Headline fit statistics of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FitStatistics {
    /// Directional pairs used for estimation.
    pub n_pairs: usize,

    /// R² of the origin/destination fixed-effects model.
    pub fixed_effects_r_squared: f64,

    /// Alternating-projection sweeps performed.
    pub fixed_effects_iterations: usize,

    /// Whether the residualizer met its tolerance.
    pub fixed_effects_converged: bool,

    /// In-sample R² of the learner.
    pub train_r_squared: f64,

    /// Mean cross-validated R².
    pub cv_r_squared_mean: f64,

    /// Standard deviation of the cross-validated R².
    pub cv_r_squared_std: f64,
}

/// Printable run summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Fit statistics.
    pub statistics: FitStatistics,

    /// Feature importances, descending.
    pub importances: Vec<FeatureImportanceRecord>,

    /// Occupations with a weighted aggregate, descending.
    pub ranked: Vec<AggregatePortabilityRecord>,

    /// Number of rows printed in each ranking.
    pub top_n: usize,
}

impl RunSummary {
    /// Create a summary. Occupations without a weighted aggregate are left
    /// out of the ranking.
    pub fn new(
        statistics: FitStatistics,
        importances: &[FeatureImportanceRecord],
        aggregates: &[AggregatePortabilityRecord],
        top_n: usize,
    ) -> Self {
        let mut ranked: Vec<AggregatePortabilityRecord> = aggregates
            .iter()
            .filter(|r| r.aggregate_portability.is_some())
            .cloned()
            .collect();
        ranked.sort_by(|a, b| {
            b.aggregate_portability
                .unwrap_or_default()
                .total_cmp(&a.aggregate_portability.unwrap_or_default())
                .then(a.occ2010.cmp(&b.occ2010))
        });

        let mut importances = importances.to_vec();
        importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        Self {
            statistics,
            importances,
            ranked,
            top_n,
        }
    }

    fn push_occupations<'a>(
        output: &mut String,
        heading: &str,
        rows: impl Iterator<Item = &'a AggregatePortabilityRecord>,
    ) {
        output.push_str(&format!("\n{heading}:\n"));
        output.push_str(&"-".repeat(80));
        output.push('\n');
        for row in rows {
            let title: String = if row.title.is_empty() {
                format!("OCC {}", row.occ2010)
            } else {
                row.title.chars().take(50).collect()
            };
            output.push_str(&format!(
                "{:<6} {:<50} {:>10.4}\n",
                row.occ2010,
                title,
                row.aggregate_portability.unwrap_or_default()
            ));
        }
    }

    /// Render as an ASCII report.
    pub fn to_ascii_table(&self) -> String {
        let stats = &self.statistics;
        let mut output = String::new();

        output.push_str("\nSkill Portability Estimation\n");
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("\nFit Statistics:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Directional pairs:        {}\n",
            stats.n_pairs
        ));
        output.push_str(&format!(
            "  Fixed-effects R²:         {:.4} ({} sweeps{})\n",
            stats.fixed_effects_r_squared,
            stats.fixed_effects_iterations,
            if stats.fixed_effects_converged {
                ""
            } else {
                ", NOT converged"
            }
        ));
        output.push_str(&format!(
            "  Learner training R²:      {:.4}\n",
            stats.train_r_squared
        ));
        output.push_str(&format!(
            "  Learner CV R²:            {:.4} (+/- {:.4})\n",
            stats.cv_r_squared_mean, stats.cv_r_squared_std
        ));

        if !self.importances.is_empty() {
            output.push_str(&format!(
                "\nTop {} Features:\n",
                self.top_n.min(self.importances.len())
            ));
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for feature in self.importances.iter().take(self.top_n) {
                output.push_str(&format!(
                    "  {:<60} {:>10.4}\n",
                    feature.feature_name, feature.importance
                ));
            }
        }

        if !self.ranked.is_empty() {
            let n = self.top_n.min(self.ranked.len());
            Self::push_occupations(
                &mut output,
                &format!("Top {n} Most Portable Occupations"),
                self.ranked.iter().take(n),
            );
            Self::push_occupations(
                &mut output,
                &format!("Bottom {n} Least Portable Occupations"),
                self.ranked.iter().skip(self.ranked.len() - n),
            );
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii_table())
    }
}
