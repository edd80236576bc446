//! CSV loading for the input tables.
//!
//! Files are read into polars `DataFrame`s, required columns are cast to the
//! contract dtype, and rows are converted into the typed tables of this crate.
//! Extra columns are ignored.

use crate::employment::{EMPLOYMENT_TABLE, EmploymentTable, OccupationTitles, TITLES_TABLE};
use crate::error::{DataError, Result};
use crate::mobility::{STAYER_TABLE, SWITCHING_TABLE, StayerCounts, SwitchRecord, SwitchingMatrix};
use crate::occupation::{OccupationId, OccupationPair};
use crate::skills::{SKILL_TABLE, SkillMatrix};
use ndarray::Array2;
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Default file name of the switching matrix.
pub const SWITCHING_FILE: &str = "cps_switching_matrix.csv";
/// Default file name of the stayer counts.
pub const STAYER_FILE: &str = "cps_stayer_counts.csv";
/// Default file name of the skill matrix.
pub const SKILL_FILE: &str = "skill_matrix_by_occ2010.csv";
/// Default file name of the employment changes.
pub const EMPLOYMENT_FILE: &str = "cps_employment_changes.csv";
/// Default file name of the occupation titles.
pub const TITLES_FILE: &str = "occ2010_titles.csv";

/// Locations of the input tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    /// Switching matrix CSV
    pub switching: PathBuf,
    /// Stayer counts CSV
    pub stayers: PathBuf,
    /// Skill matrix CSV
    pub skills: PathBuf,
    /// Employment changes CSV
    pub employment: PathBuf,
    /// Optional occupation titles CSV
    pub titles: Option<PathBuf>,
}

impl InputPaths {
    /// Resolve the default file names inside `dir`.
    ///
    /// The titles table is only used when the file exists.
    pub fn from_dir(dir: &Path) -> Self {
        let titles = dir.join(TITLES_FILE);
        Self {
            switching: dir.join(SWITCHING_FILE),
            stayers: dir.join(STAYER_FILE),
            skills: dir.join(SKILL_FILE),
            employment: dir.join(EMPLOYMENT_FILE),
            titles: titles.exists().then_some(titles),
        }
    }
}

/// Read a CSV file with a header row.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(DataError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )));
    }

    // Scan every row for types: a float column may start with whole numbers.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    tracing::debug!(path = %path.display(), rows = df.height(), "read table");
    Ok(df)
}

fn required_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Series> {
    let column = df.column(name).map_err(|_| DataError::MissingColumn {
        table,
        column: name.to_string(),
    })?;
    Ok(column.as_materialized_series().clone())
}

fn occupation_values(series: &Series, table: &'static str) -> Result<Vec<OccupationId>> {
    let name = series.name().to_string();
    let cast = series.cast(&DataType::Int64)?;
    cast.i64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let code = value
                .ok_or_else(|| DataError::invalid(table, row, &name, "missing occupation code"))?;
            u32::try_from(code).map(OccupationId::new).map_err(|_| {
                DataError::invalid(table, row, &name, format!("invalid occupation code {code}"))
            })
        })
        .collect()
}

fn float_values(series: &Series, table: &'static str) -> Result<Vec<f64>> {
    let name = series.name().to_string();
    let cast = series.cast(&DataType::Float64)?;
    cast.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| DataError::invalid(table, row, &name, "missing numeric value"))
        })
        .collect()
}

fn occupation_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Vec<OccupationId>> {
    occupation_values(&required_column(df, table, name)?, table)
}

fn float_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Vec<f64>> {
    float_values(&required_column(df, table, name)?, table)
}

/// Convert a frame with `occ_origin`, `occ_dest`, `weighted_switches`.
pub fn switching_from_frame(df: &DataFrame) -> Result<SwitchingMatrix> {
    let origins = occupation_column(df, SWITCHING_TABLE, "occ_origin")?;
    let dests = occupation_column(df, SWITCHING_TABLE, "occ_dest")?;
    let switches = float_column(df, SWITCHING_TABLE, "weighted_switches")?;

    let records = origins
        .into_iter()
        .zip(dests)
        .zip(switches)
        .map(|((origin, dest), weighted_switches)| SwitchRecord {
            pair: OccupationPair::new(origin, dest),
            weighted_switches,
        })
        .collect();

    SwitchingMatrix::new(records)
}

/// Convert a frame with `occ`, `weighted_stayers`.
pub fn stayers_from_frame(df: &DataFrame) -> Result<StayerCounts> {
    let occs = occupation_column(df, STAYER_TABLE, "occ")?;
    let stayers = float_column(df, STAYER_TABLE, "weighted_stayers")?;
    StayerCounts::new(occs.into_iter().zip(stayers))
}

/// Convert a skill frame: the first column holds the occupation code
/// (whatever its header), every remaining column is a skill dimension.
pub fn skills_from_frame(df: &DataFrame) -> Result<SkillMatrix> {
    let columns = df.get_columns();
    let Some((id_column, skill_columns)) = columns.split_first() else {
        return Err(DataError::Malformed {
            table: SKILL_TABLE,
            reason: "no columns".to_string(),
        });
    };

    let occupations = occupation_values(id_column.as_materialized_series(), SKILL_TABLE)?;
    let skill_names: Vec<String> = skill_columns.iter().map(|c| c.name().to_string()).collect();

    let mut values = Array2::<f64>::zeros((df.height(), skill_columns.len()));
    for (j, column) in skill_columns.iter().enumerate() {
        let levels = float_values(column.as_materialized_series(), SKILL_TABLE)?;
        for (i, level) in levels.into_iter().enumerate() {
            values[[i, j]] = level;
        }
    }

    SkillMatrix::new(occupations, skill_names, values)
}

/// Convert a frame with `occ`, `emp_pre` (other columns ignored).
pub fn employment_from_frame(df: &DataFrame) -> Result<EmploymentTable> {
    let occs = occupation_column(df, EMPLOYMENT_TABLE, "occ")?;
    let emp_pre = float_column(df, EMPLOYMENT_TABLE, "emp_pre")?;
    EmploymentTable::new(occs.into_iter().zip(emp_pre))
}

/// Convert a frame with `occ2010`, `title`.
pub fn titles_from_frame(df: &DataFrame) -> Result<OccupationTitles> {
    let occs = occupation_column(df, TITLES_TABLE, "occ2010")?;
    let titles = required_column(df, TITLES_TABLE, "title")?.cast(&DataType::String)?;
    let titles = titles
        .str()?
        .into_iter()
        .map(|t| t.unwrap_or_default().to_string());
    Ok(OccupationTitles::new(occs.into_iter().zip(titles)))
}

/// Load the switching matrix CSV.
pub fn load_switching_matrix(path: &Path) -> Result<SwitchingMatrix> {
    switching_from_frame(&read_frame(path)?)
}

/// Load the stayer counts CSV.
pub fn load_stayer_counts(path: &Path) -> Result<StayerCounts> {
    stayers_from_frame(&read_frame(path)?)
}

/// Load the skill matrix CSV.
pub fn load_skill_matrix(path: &Path) -> Result<SkillMatrix> {
    skills_from_frame(&read_frame(path)?)
}

/// Load the employment changes CSV.
pub fn load_employment(path: &Path) -> Result<EmploymentTable> {
    employment_from_frame(&read_frame(path)?)
}

/// Load the occupation titles CSV.
pub fn load_titles(path: &Path) -> Result<OccupationTitles> {
    titles_from_frame(&read_frame(path)?)
}

/// All input tables, loaded and validated.
#[derive(Debug, Clone)]
pub struct InputTables {
    /// Directional switch counts
    pub switching: SwitchingMatrix,
    /// Stayer counts by origin
    pub stayers: StayerCounts,
    /// Skill profiles
    pub skills: SkillMatrix,
    /// Pre-period employment
    pub employment: EmploymentTable,
    /// Occupation titles, when supplied
    pub titles: Option<OccupationTitles>,
}

impl InputTables {
    /// Load every table named in `paths`.
    pub fn load(paths: &InputPaths) -> Result<Self> {
        let switching = load_switching_matrix(&paths.switching)?;
        let stayers = load_stayer_counts(&paths.stayers)?;
        let skills = load_skill_matrix(&paths.skills)?;
        let employment = load_employment(&paths.employment)?;
        let titles = paths.titles.as_deref().map(load_titles).transpose()?;

        tracing::info!(
            switch_rows = switching.len(),
            stayer_occupations = stayers.len(),
            skill_occupations = skills.n_occupations(),
            skill_dimensions = skills.n_skills(),
            employment_occupations = employment.len(),
            "loaded input tables"
        );

        Ok(Self {
            switching,
            stayers,
            skills,
            employment,
            titles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switching_from_frame() {
        let df = df!(
            "occ_origin" => [1i64, 1],
            "occ_dest" => [2i64, 3],
            "weighted_switches" => [100.0, 0.0],
        )
        .unwrap();

        let matrix = switching_from_frame(&df).unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.records()[0].pair.dest, OccupationId::new(2));
        assert_eq!(matrix.records()[1].weighted_switches, 0.0);
    }

    #[test]
    fn test_missing_column_reported() {
        let df = df!("occ" => [1i64]).unwrap();
        let err = stayers_from_frame(&df).unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingColumn { column, .. } if column == "weighted_stayers"
        ));
    }

    #[test]
    fn test_float_codes_are_accepted() {
        let df = df!("occ" => [10.0, 20.0], "emp_pre" => [5.0, 6.0]).unwrap();
        let emp = employment_from_frame(&df).unwrap();
        assert_eq!(emp.emp_pre(OccupationId::new(20)), Some(6.0));
    }

    #[test]
    fn test_skills_first_column_is_id() {
        let df = df!(
            "occ2010" => [10i64, 20],
            "Reading" => [0.2, 0.4],
            "Writing" => [0.6, 0.8],
        )
        .unwrap();

        let skills = skills_from_frame(&df).unwrap();
        assert_eq!(skills.skill_names(), &["Reading".to_string(), "Writing".to_string()]);
        assert_eq!(
            skills.profile(OccupationId::new(20)).unwrap().to_vec(),
            vec![0.4, 0.8]
        );
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("skillport_definitely_missing.csv");
        assert!(matches!(read_frame(&path), Err(DataError::Io(_))));
    }
}
