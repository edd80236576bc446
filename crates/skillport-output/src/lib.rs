#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/skillport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;

pub use export::{
    AggregatePortabilityRecord, ExportError, ExportFormat, Exporter, FeatureImportanceRecord,
    PairwisePortabilityRecord, TableRecord, write_table,
};
pub use report::{REPORT_FILE, ReportError, RunReport, RunReportBuilder};
pub use summary::{FitStatistics, RunSummary};
