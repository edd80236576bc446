//! Run metadata report.
//!
//! A run report is a timestamped JSON document of named sections
//! (configuration, build summary, fit statistics, warnings, ...). It travels
//! next to the output tables so non-fatal conditions such as a residualizer
//! that hit its iteration cap stay visible to consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// File name of the report inside an output directory.
pub const REPORT_FILE: &str = "run_metadata.json";

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata describing one estimation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Version of the tool that produced the run.
    pub version: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Human-readable warnings raised during the run.
    pub warnings: Vec<String>,

    /// Named report sections.
    pub sections: serde_json::Map<String, serde_json::Value>,
}

impl RunReport {
    /// Create an empty report stamped with the current time.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            timestamp: Utc::now(),
            warnings: Vec::new(),
            sections: serde_json::Map::new(),
        }
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&serde_json::Value> {
        self.sections.get(name)
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as `run_metadata.json` inside `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> Result<std::path::PathBuf, ReportError> {
        let path = dir.join(REPORT_FILE);
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}

/// Builder for creating run reports.
#[derive(Debug, Default)]
pub struct RunReportBuilder {
    version: Option<String>,
    warnings: Vec<String>,
    sections: serde_json::Map<String, serde_json::Value>,
}

impl RunReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tool version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add a serializable section. A section with the same name is replaced.
    pub fn section<T: Serialize>(mut self, name: &str, value: &T) -> Result<Self, ReportError> {
        self.sections
            .insert(name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Record a warning.
    pub fn warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Build the report.
    pub fn build(self) -> RunReport {
        let mut report = RunReport::new(self.version.unwrap_or_default());
        report.warnings = self.warnings;
        report.sections = self.sections;
        report
    }
}
