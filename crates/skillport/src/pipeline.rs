//! End-to-end estimation.
//!
//! Runs Builder → Residualizer → Learner → Aggregator over loaded input
//! tables. Each stage runs inside its own `info` span and hands an owned
//! artifact to the next.

use crate::aggregator::{AggregateResult, aggregate};
use crate::builder::{RegressionData, build_regression_data};
use crate::config::PipelineConfig;
use crate::error::{ModelError, Result};
use crate::learner::{LearnerOutput, PortabilityLearner};
use crate::residualizer::{Residualized, Residualizer};
use serde_json::json;
use skillport_data::{InputTables, OccupationTitles};
use skillport_forest::RandomForest;
use skillport_output::{
    AggregatePortabilityRecord, ExportFormat, FeatureImportanceRecord, FitStatistics,
    PairwisePortabilityRecord, ReportError, RunReport, RunReportBuilder, RunSummary, write_table,
};
use std::fmt;
use std::path::{Path, PathBuf};

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Joining tables and building the dependent variable
    Build,
    /// Removing fixed effects
    Residualize,
    /// Fitting the learner and cross-validating
    Learn,
    /// Normalizing and aggregating
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => write!(f, "building observations"),
            Self::Residualize => write!(f, "removing fixed effects"),
            Self::Learn => write!(f, "fitting random forest"),
            Self::Aggregate => write!(f, "aggregating portability"),
        }
    }
}

/// Configured estimation pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    residualizer: Residualizer,
    learner: PortabilityLearner<RandomForest>,
}

impl Pipeline {
    /// Create a pipeline, validating the configuration.
    pub fn new(config: PipelineConfig) -> std::result::Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            residualizer: Residualizer::new(config.residualizer)?,
            learner: PortabilityLearner::new(config.forest.clone(), config.cv_folds)?,
            config,
        })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage on `inputs`.
    ///
    /// # Errors
    /// Any stage failure; data problems surface before the learner runs.
    pub fn run(&self, inputs: &InputTables) -> Result<PipelineRun> {
        self.run_with(inputs, |_| {})
    }

    /// Run every stage, calling `on_stage` as each one starts.
    pub fn run_with(
        &self,
        inputs: &InputTables,
        mut on_stage: impl FnMut(Stage),
    ) -> Result<PipelineRun> {
        on_stage(Stage::Build);
        let regression = {
            let _span = tracing::info_span!("builder").entered();
            build_regression_data(&inputs.switching, &inputs.stayers, &inputs.skills)?
        };

        on_stage(Stage::Residualize);
        let residualized = {
            let _span = tracing::info_span!("residualizer").entered();
            self.residualizer.fit(&regression)?
        };

        on_stage(Stage::Learn);
        let learner = {
            let _span = tracing::info_span!("learner", trees = self.config.forest.n_trees).entered();
            self.learner.fit(&residualized, &inputs.skills)?
        };

        on_stage(Stage::Aggregate);
        let aggregates = {
            let _span = tracing::info_span!("aggregator").entered();
            aggregate(
                residualized.pairs(),
                learner.predictions(),
                &inputs.employment,
            )?
        };

        Ok(PipelineRun {
            config: self.config.clone(),
            regression,
            residualized,
            learner,
            aggregates,
            titles: inputs.titles.clone(),
        })
    }
}

/// Paths written by [`PipelineRun::write_outputs`].
#[derive(Debug, Clone)]
pub struct OutputFiles {
    /// Pairwise portability table
    pub pairwise: PathBuf,
    /// Occupation-level table
    pub aggregate: PathBuf,
    /// Feature importance table
    pub importances: PathBuf,
    /// Run metadata
    pub metadata: PathBuf,
}

/// Every artifact of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    config: PipelineConfig,
    regression: RegressionData,
    residualized: Residualized,
    learner: LearnerOutput<RandomForest>,
    aggregates: AggregateResult,
    titles: Option<OccupationTitles>,
}

impl PipelineRun {
    /// Configuration the run used.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builder output.
    pub const fn regression(&self) -> &RegressionData {
        &self.regression
    }

    /// Residualizer output.
    pub const fn residualized(&self) -> &Residualized {
        &self.residualized
    }

    /// Learner output.
    pub const fn learner(&self) -> &LearnerOutput<RandomForest> {
        &self.learner
    }

    /// Aggregator output.
    pub const fn aggregates(&self) -> &AggregateResult {
        &self.aggregates
    }

    /// Non-fatal conditions raised during the run.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(warning) = &self.residualized.fit().warning {
            warnings.push(warning.to_string());
        }
        if self.aggregates.degenerate_range() {
            warnings.push(format!(
                "predicted portability has zero range (all {}); normalized scores set to 0",
                self.aggregates.bounds().min
            ));
        }
        if !self.aggregates.excluded().is_empty() {
            warnings.push(format!(
                "{} occupations have no destination employment and no weighted aggregate",
                self.aggregates.excluded().len()
            ));
        }
        warnings
    }

    /// Rows of `pairwise_skill_portability`, in observation order.
    pub fn pairwise_records(&self) -> Vec<PairwisePortabilityRecord> {
        self.residualized
            .pairs()
            .iter()
            .zip(self.residualized.log_switch_shares())
            .zip(self.residualized.residuals())
            .zip(self.learner.predictions())
            .map(
                |(((pair, &log_switch_share), &residual), &predicted)| PairwisePortabilityRecord {
                    occ_origin: pair.origin.code(),
                    occ_dest: pair.dest.code(),
                    log_switch_share,
                    residual,
                    predicted_skill_portability: predicted,
                },
            )
            .collect()
    }

    /// Rows of `aggregate_skill_portability`, by weighted aggregate descending.
    pub fn aggregate_records(&self) -> Vec<AggregatePortabilityRecord> {
        self.aggregates
            .occupations()
            .iter()
            .map(|agg| AggregatePortabilityRecord {
                occ2010: agg.occupation.code(),
                aggregate_portability: agg.aggregate_portability,
                mean_pairwise_portability: agg.mean_pairwise_portability,
                title: self
                    .titles
                    .as_ref()
                    .and_then(|t| t.title(agg.occupation))
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect()
    }

    /// Rows of `feature_importances`, descending.
    pub fn importance_records(&self) -> Vec<FeatureImportanceRecord> {
        self.learner
            .importances()
            .iter()
            .map(|f| FeatureImportanceRecord {
                feature_name: f.feature_name.clone(),
                importance: f.importance,
            })
            .collect()
    }

    /// Headline statistics of both estimation stages.
    pub fn fit_statistics(&self) -> FitStatistics {
        let fe = self.residualized.fit();
        let cv = self.learner.cross_validation();
        FitStatistics {
            n_pairs: self.regression.len(),
            fixed_effects_r_squared: fe.r_squared,
            fixed_effects_iterations: fe.iterations,
            fixed_effects_converged: fe.converged,
            train_r_squared: self.learner.train_r_squared(),
            cv_r_squared_mean: cv.mean(),
            cv_r_squared_std: cv.std(),
        }
    }

    /// Printable summary with `top_n` rows per ranking.
    pub fn summary(&self, top_n: usize) -> RunSummary {
        RunSummary::new(
            self.fit_statistics(),
            &self.importance_records(),
            &self.aggregate_records(),
            top_n,
        )
    }

    /// Run metadata document.
    pub fn report(&self) -> std::result::Result<RunReport, ReportError> {
        let fe = self.residualized.fit();
        let cv = self.learner.cross_validation();
        let bounds = self.aggregates.bounds();
        let excluded: Vec<u32> = self
            .aggregates
            .excluded()
            .iter()
            .map(|o| o.code())
            .collect();

        let builder = RunReportBuilder::new()
            .version(crate::VERSION)
            .section("config", &self.config)?
            .section("build", self.regression.summary())?
            .section("residualizer", fe)?
            .section(
                "learner",
                &json!({
                    "train_r_squared": self.learner.train_r_squared(),
                    "cv_fold_scores": cv.fold_scores,
                    "cv_r_squared_mean": cv.mean(),
                    "cv_r_squared_std": cv.std(),
                }),
            )?
            .section(
                "normalization",
                &json!({
                    "min": bounds.min,
                    "max": bounds.max,
                    "degenerate_range": bounds.is_degenerate(),
                }),
            )?
            .section("excluded_occupations", &excluded)?;

        Ok(self
            .warnings()
            .into_iter()
            .fold(builder, |b, w| b.warning(w))
            .build())
    }

    /// Write the three output tables as CSV and the run metadata into `dir`,
    /// creating it if needed.
    pub fn write_outputs(&self, dir: &Path) -> Result<OutputFiles> {
        std::fs::create_dir_all(dir)?;

        let files = OutputFiles {
            pairwise: write_table(&self.pairwise_records(), dir, ExportFormat::Csv)?,
            aggregate: write_table(&self.aggregate_records(), dir, ExportFormat::Csv)?,
            importances: write_table(&self.importance_records(), dir, ExportFormat::Csv)?,
            metadata: self.report()?.write_to_dir(dir)?,
        };

        tracing::info!(dir = %dir.display(), "wrote outputs");
        Ok(files)
    }
}
