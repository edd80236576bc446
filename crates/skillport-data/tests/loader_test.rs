//! Integration tests for loading input tables from CSV files.

use approx::assert_relative_eq;
use skillport_data::loader::{
    EMPLOYMENT_FILE, SKILL_FILE, STAYER_FILE, SWITCHING_FILE, TITLES_FILE, load_skill_matrix,
    load_switching_matrix,
};
use skillport_data::{DataError, InputPaths, InputTables, OccupationId};
use std::path::PathBuf;

fn fixture_dir(name: &str, with_titles: bool) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("skillport_loader_{name}"));
    std::fs::create_dir_all(&dir).unwrap();

    std::fs::write(
        dir.join(SWITCHING_FILE),
        "occ_origin,occ_dest,weighted_switches\n10,20,100.0\n10,30,50\n20,10,0.0\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(STAYER_FILE),
        "occ,weighted_stayers\n10,1000.0\n20,800.5\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(SKILL_FILE),
        "occ2010,Reading,Writing,Mathematics\n10,0.9,0.8,0.1\n20,0.2,0.3,0.7\n30,0.5,0.5,0.5\n",
    )
    .unwrap();
    std::fs::write(
        dir.join(EMPLOYMENT_FILE),
        "occ,emp_pre,emp_post,pct_change\n20,5000.0,5100.0,0.02\n30,1000.0,900.0,-0.1\n",
    )
    .unwrap();

    let titles = dir.join(TITLES_FILE);
    if with_titles {
        std::fs::write(
            &titles,
            "occ2010,title\n10,\"Managers, all other\"\n20,Accountants and auditors\n",
        )
        .unwrap();
    } else {
        std::fs::remove_file(&titles).ok();
    }

    dir
}

#[test]
fn test_load_input_tables() {
    let dir = fixture_dir("full", true);
    let tables = InputTables::load(&InputPaths::from_dir(&dir)).unwrap();

    assert_eq!(tables.switching.len(), 3);
    assert_relative_eq!(tables.switching.records()[1].weighted_switches, 50.0);
    assert_relative_eq!(tables.switching.records()[2].weighted_switches, 0.0);

    assert_eq!(tables.stayers.get(OccupationId::new(20)), Some(800.5));
    assert_eq!(tables.stayers.get(OccupationId::new(30)), None);

    assert_eq!(tables.skills.n_occupations(), 3);
    assert_eq!(tables.skills.skill_names(), &["Reading", "Writing", "Mathematics"]);
    let profile = tables.skills.profile(OccupationId::new(20)).unwrap();
    assert_relative_eq!(profile[2], 0.7);

    assert_eq!(tables.employment.emp_pre(OccupationId::new(30)), Some(1000.0));
    assert_eq!(tables.employment.emp_pre(OccupationId::new(10)), None);

    let titles = tables.titles.unwrap();
    assert_eq!(titles.title(OccupationId::new(10)), Some("Managers, all other"));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_titles_are_optional() {
    let dir = fixture_dir("no_titles", false);
    let paths = InputPaths::from_dir(&dir);
    assert!(paths.titles.is_none());

    let tables = InputTables::load(&paths).unwrap();
    assert!(tables.titles.is_none());

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_missing_file() {
    let dir = std::env::temp_dir().join("skillport_loader_missing");
    let result = InputTables::load(&InputPaths::from_dir(&dir));
    assert!(matches!(result, Err(DataError::Io(_))));
}

#[test]
fn test_missing_column() {
    let dir = std::env::temp_dir().join("skillport_loader_bad_columns");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("switching.csv");
    std::fs::write(&path, "origin,dest,weighted_switches\n1,2,3.0\n").unwrap();

    let result = load_switching_matrix(&path);
    assert!(matches!(
        result,
        Err(DataError::MissingColumn { column, .. }) if column == "occ_origin"
    ));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_negative_switches_rejected() {
    let dir = std::env::temp_dir().join("skillport_loader_negative");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("switching.csv");
    std::fs::write(
        &path,
        "occ_origin,occ_dest,weighted_switches\n1,2,3.0\n2,1,-4.0\n",
    )
    .unwrap();

    let result = load_switching_matrix(&path);
    assert!(matches!(result, Err(DataError::InvalidValue { row: 1, .. })));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_fractional_value_after_whole_numbers() {
    let dir = std::env::temp_dir().join("skillport_loader_late_fraction");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("switching.csv");
    let mut contents = String::from("occ_origin,occ_dest,weighted_switches\n");
    for i in 0..150 {
        contents.push_str(&format!("{},{},{}\n", i + 1, i + 2, i * 3));
    }
    contents.push_str("500,501,12.75\n");
    std::fs::write(&path, contents).unwrap();

    let matrix = load_switching_matrix(&path).unwrap();
    assert_eq!(matrix.len(), 151);
    assert_relative_eq!(matrix.records()[149].weighted_switches, 447.0);
    assert_relative_eq!(matrix.records()[150].weighted_switches, 12.75);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_skill_out_of_range_rejected() {
    let dir = std::env::temp_dir().join("skillport_loader_skill_range");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("skills.csv");
    std::fs::write(&path, "occ2010,Reading\n1,0.4\n2,1.5\n").unwrap();

    let result = load_skill_matrix(&path);
    assert!(matches!(result, Err(DataError::InvalidValue { row: 1, .. })));

    std::fs::remove_dir_all(dir).ok();
}
