//! Export functionality for skillport output tables.
//!
//! Each output table is a slice of one record type. Records serialize with
//! the exact column names downstream consumers expect, in CSV or JSON.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// A row type of an output table.
pub trait TableRecord: Serialize {
    /// Table name, also used as the default file stem.
    const TABLE_NAME: &'static str;

    /// Column names in serialization order.
    const HEADERS: &'static [&'static str];
}

/// Portability estimates for one directional occupation pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairwisePortabilityRecord {
    /// Origin occupation code.
    pub occ_origin: u32,

    /// Destination occupation code.
    pub occ_dest: u32,

    /// ln(switches / stayers), after zero-switch flooring.
    pub log_switch_share: f64,

    /// Residual after removing origin and destination fixed effects.
    pub residual: f64,

    /// Skill-predicted residual (unnormalized portability).
    pub predicted_skill_portability: f64,
}

impl TableRecord for PairwisePortabilityRecord {
    const TABLE_NAME: &'static str = "pairwise_skill_portability";
    const HEADERS: &'static [&'static str] = &[
        "occ_origin",
        "occ_dest",
        "log_switch_share",
        "residual",
        "predicted_skill_portability",
    ];
}

/// Occupation-level portability summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatePortabilityRecord {
    /// Occupation code.
    pub occ2010: u32,

    /// Employment-weighted mean normalized portability; empty when no
    /// destination has employment data.
    pub aggregate_portability: Option<f64>,

    /// Unweighted mean normalized portability over all destinations.
    pub mean_pairwise_portability: f64,

    /// Occupation title, empty when unknown.
    pub title: String,
}

impl TableRecord for AggregatePortabilityRecord {
    const TABLE_NAME: &'static str = "aggregate_skill_portability";
    const HEADERS: &'static [&'static str] = &[
        "occ2010",
        "aggregate_portability",
        "mean_pairwise_portability",
        "title",
    ];
}

/// Importance of one learner feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportanceRecord {
    /// Feature name, e.g. `origin_Reading`, `dest_Writing`, `diff_Speaking`.
    pub feature_name: String,

    /// Share of total impurity reduction.
    pub importance: f64,
}

impl TableRecord for FeatureImportanceRecord {
    const TABLE_NAME: &'static str = "feature_importances";
    const HEADERS: &'static [&'static str] = &["feature_name", "importance"];
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<T: TableRecord>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    if records.is_empty() {
        wtr.write_record(T::HEADERS)?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl<T: TableRecord> Exporter for [T] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Write a table into `dir` as `<TABLE_NAME>.<ext>` and return the path.
pub fn write_table<T: TableRecord>(
    records: &[T],
    dir: &Path,
    format: ExportFormat,
) -> Result<std::path::PathBuf, ExportError> {
    let path = dir.join(format!("{}.{}", T::TABLE_NAME, format.extension()));
    records.export_to_file(&path, format)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairwise() -> Vec<PairwisePortabilityRecord> {
        vec![
            PairwisePortabilityRecord {
                occ_origin: 1,
                occ_dest: 2,
                log_switch_share: -2.302585,
                residual: 0.25,
                predicted_skill_portability: 0.2,
            },
            PairwisePortabilityRecord {
                occ_origin: 1,
                occ_dest: 3,
                log_switch_share: -2.995732,
                residual: -0.25,
                predicted_skill_portability: -0.1,
            },
        ]
    }

    #[test]
    fn test_pairwise_csv_header() {
        let csv = pairwise().export_to_string(ExportFormat::Csv).unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(
            header,
            "occ_origin,occ_dest,log_switch_share,residual,predicted_skill_portability"
        );
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("1,3,-2.995732,-0.25,-0.1"));
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let empty: Vec<FeatureImportanceRecord> = Vec::new();
        let csv = empty.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv.trim_end(), "feature_name,importance");
    }

    #[test]
    fn test_aggregate_missing_weighted_value_is_empty_cell() {
        let records = vec![AggregatePortabilityRecord {
            occ2010: 10,
            aggregate_portability: None,
            mean_pairwise_portability: 0.5,
            title: "Chief executives".to_string(),
        }];
        let csv = records.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.contains("10,,0.5,Chief executives"));
    }

    #[test]
    fn test_feature_importances_json() {
        let records = vec![FeatureImportanceRecord {
            feature_name: "diff_Reading".to_string(),
            importance: 0.4,
        }];
        let json = records.export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"feature_name\":\"diff_Reading\""));

        let pretty = records.export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("  ")); // Indentation indicates pretty format
    }

    #[test]
    fn test_write_table() {
        let dir = std::env::temp_dir().join("skillport_export_test");
        std::fs::create_dir_all(&dir).unwrap();

        let path = write_table(&pairwise(), &dir, ExportFormat::Csv).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "pairwise_skill_portability.csv"
        );
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("occ_origin,"));

        // Clean up
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
