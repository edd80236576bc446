#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/skillport/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod employment;
pub mod error;
pub mod loader;
pub mod mobility;
pub mod occupation;
pub mod skills;

pub use employment::{EmploymentTable, OccupationTitles};
pub use error::{DataError, Result};
pub use loader::{InputPaths, InputTables};
pub use mobility::{StayerCounts, SwitchRecord, SwitchingMatrix};
pub use occupation::{OccupationId, OccupationPair};
pub use skills::SkillMatrix;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
