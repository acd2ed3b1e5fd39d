#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads the campus catalog, school records, and enrolled-student records
//! from CSV files.
//!
//! Source spreadsheets arrive with inconsistent column headings, so every
//! field is resolved through a case-insensitive alias list (e.g.
//! `student_count`, `total students`, `students`). Loading applies the
//! documented per-record defaults -- blank coordinates become `None`,
//! blank or unparseable student counts fall back to
//! [`DEFAULT_STUDENT_COUNT`] -- and reports how many rows were affected.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use campus_map_campus_models::{CatalogCampus, School, SchoolSiteId, StudentRecord};
use campus_map_geo::Coordinate;
use thiserror::Error;

/// Student count substituted when a school row has no usable value.
pub const DEFAULT_STUDENT_COUNT: u32 = 500;

/// Errors that can occur while loading input files.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Could not open or read an input file.
    #[error("failed to read {file}: {source}")]
    Io {
        /// The file being read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing failed.
    #[error("failed to parse {file}: {source}")]
    Csv {
        /// The file being parsed.
        file: String,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A required column is missing from the header row.
    #[error("{file} has no '{column}' column (or a known alias)")]
    MissingColumn {
        /// The file being parsed.
        file: String,
        /// The canonical column name.
        column: &'static str,
    },

    /// The school file parsed but contained no rows.
    #[error("no schools loaded from {file}")]
    EmptySchools {
        /// The file being parsed.
        file: String,
    },
}

/// School records plus load-time data-quality counts.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolLoad {
    /// Loaded school records, one per source row.
    pub schools: Vec<School>,
    /// Rows whose student count fell back to [`DEFAULT_STUDENT_COUNT`].
    pub defaulted_students: usize,
    /// Rows with no usable coordinate.
    pub missing_coordinates: usize,
}

/// Accepted header spellings per canonical column, compared
/// case-insensitively after trimming.
mod aliases {
    pub const CAMPUS_CODE: &[&str] = &["code", "campus code", "campus_code", "campuscode"];
    pub const CAMPUS_NAME: &[&str] = &["name", "campus name", "campus_name", "campusname"];
    pub const LAT: &[&str] = &["lat", "latitude"];
    pub const LON: &[&str] = &["lon", "lng", "longitude"];
    pub const ROOMS: &[&str] = &["rooms", "room count", "room_count", "classrooms"];
    pub const SCHOOL_NAME: &[&str] = &["name", "school name", "school_name", "schoolname"];
    pub const STUDENTS: &[&str] = &[
        "students",
        "student count",
        "student_count",
        "total students",
        "total_students",
    ];
    pub const STUDY_CAMPUS: &[&str] = &["studycampuscode", "study campus code", "campus code"];
}

/// Loads the campus catalog.
///
/// An empty catalog is not an error here: the registry can still build a
/// working set from ad-hoc additions, and aborts itself if nothing
/// resolves.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid CSV, or
/// lacks a required column.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogCampus>, IngestError> {
    let file = open(path)?;
    let catalog = parse_catalog(file, &path.display().to_string())?;

    if catalog.is_empty() {
        log::warn!("Campus catalog {} contains no rows", path.display());
    } else {
        log::info!("Loaded {} campus(es) from {}", catalog.len(), path.display());
    }

    Ok(catalog)
}

/// Parses campus catalog rows from any reader. Exposed for tests.
///
/// # Errors
///
/// Returns an error on CSV failures or a missing required column.
pub fn parse_catalog<R: Read>(reader: R, file: &str) -> Result<Vec<CatalogCampus>, IngestError> {
    let mut csv = reader_for(reader);
    let headers = headers(&mut csv, file)?;

    let code_col = require(&headers, aliases::CAMPUS_CODE, "code", file)?;
    let name_col = require(&headers, aliases::CAMPUS_NAME, "name", file)?;
    let lat_col = require(&headers, aliases::LAT, "lat", file)?;
    let lon_col = require(&headers, aliases::LON, "lon", file)?;
    let rooms_col = find(&headers, aliases::ROOMS);

    if rooms_col.is_none() {
        log::warn!("{file} has no rooms column; every campus will use the default room count");
    }

    let mut catalog = Vec::new();
    for row in csv.records() {
        let row = row.map_err(|source| IngestError::Csv {
            file: file.to_owned(),
            source,
        })?;

        let code = field(&row, code_col).to_owned();
        if code.is_empty() {
            continue;
        }

        catalog.push(CatalogCampus {
            code,
            name: field(&row, name_col).to_owned(),
            coord: parse_coord(field(&row, lat_col), field(&row, lon_col)),
            rooms: rooms_col.and_then(|col| field(&row, col).parse().ok()),
        });
    }

    Ok(catalog)
}

/// Loads school records.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid CSV, lacks a
/// required column, or contains no rows (schools are a required input).
pub fn load_schools(path: &Path) -> Result<SchoolLoad, IngestError> {
    let file = open(path)?;
    let load = parse_schools(file, &path.display().to_string())?;

    log::info!(
        "Loaded {} school(s) from {} ({} defaulted student counts, {} missing coordinates)",
        load.schools.len(),
        path.display(),
        load.defaulted_students,
        load.missing_coordinates,
    );

    Ok(load)
}

/// Parses school rows from any reader. Exposed for tests.
///
/// # Errors
///
/// Returns an error on CSV failures, a missing required column, or an
/// empty file.
pub fn parse_schools<R: Read>(reader: R, file: &str) -> Result<SchoolLoad, IngestError> {
    let mut csv = reader_for(reader);
    let headers = headers(&mut csv, file)?;

    let name_col = require(&headers, aliases::SCHOOL_NAME, "name", file)?;
    let lat_col = require(&headers, aliases::LAT, "lat", file)?;
    let lon_col = require(&headers, aliases::LON, "lon", file)?;
    let students_col = find(&headers, aliases::STUDENTS);

    if students_col.is_none() {
        log::warn!(
            "{file} has no student-count column; every school defaults to {DEFAULT_STUDENT_COUNT}"
        );
    }

    let mut schools = Vec::new();
    let mut defaulted_students = 0;
    let mut missing_coordinates = 0;

    for (index, row) in csv.records().enumerate() {
        let row = row.map_err(|source| IngestError::Csv {
            file: file.to_owned(),
            source,
        })?;

        let coord = parse_coord(field(&row, lat_col), field(&row, lon_col));
        if coord.is_none() {
            missing_coordinates += 1;
        }

        // Zeroed counts mark schools that were never surveyed; they take
        // the default alongside blank and unparseable values.
        let students = match students_col
            .and_then(|col| field(&row, col).replace(',', "").parse::<u32>().ok())
        {
            Some(count) if count > 0 => count,
            _ => {
                defaulted_students += 1;
                DEFAULT_STUDENT_COUNT
            }
        };

        schools.push(School {
            site_id: SchoolSiteId(index),
            name: field(&row, name_col).to_owned(),
            coord,
            students,
        });
    }

    if schools.is_empty() {
        return Err(IngestError::EmptySchools {
            file: file.to_owned(),
        });
    }

    Ok(SchoolLoad {
        schools,
        defaulted_students,
        missing_coordinates,
    })
}

/// Loads enrolled-student records.
///
/// Only the campus code column is consumed; it feeds the enrolled-student
/// cross-check against the resolved working set.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid CSV, or
/// lacks the campus code column.
pub fn load_students(path: &Path) -> Result<Vec<StudentRecord>, IngestError> {
    let file = open(path)?;
    let students = parse_students(file, &path.display().to_string())?;
    log::info!("Loaded {} student record(s) from {}", students.len(), path.display());
    Ok(students)
}

/// Parses enrolled-student rows from any reader. Exposed for tests.
///
/// # Errors
///
/// Returns an error on CSV failures or a missing campus code column.
pub fn parse_students<R: Read>(reader: R, file: &str) -> Result<Vec<StudentRecord>, IngestError> {
    let mut csv = reader_for(reader);
    let headers = headers(&mut csv, file)?;

    let code_col = require(&headers, aliases::STUDY_CAMPUS, "studycampuscode", file)?;

    let mut students = Vec::new();
    for row in csv.records() {
        let row = row.map_err(|source| IngestError::Csv {
            file: file.to_owned(),
            source,
        })?;

        let code = field(&row, code_col);
        if !code.is_empty() {
            students.push(StudentRecord {
                study_campus_code: code.to_owned(),
            });
        }
    }

    Ok(students)
}

fn open(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| IngestError::Io {
        file: path.display().to_string(),
        source,
    })
}

fn reader_for<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}

fn headers<R: Read>(csv: &mut csv::Reader<R>, file: &str) -> Result<Vec<String>, IngestError> {
    Ok(csv
        .headers()
        .map_err(|source| IngestError::Csv {
            file: file.to_owned(),
            source,
        })?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect())
}

/// Finds the index of the first header matching any alias.
fn find(headers: &[String], aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|h| aliases.contains(&h.as_str()))
}

fn require(
    headers: &[String],
    aliases: &[&str],
    column: &'static str,
    file: &str,
) -> Result<usize, IngestError> {
    find(headers, aliases).ok_or_else(|| IngestError::MissingColumn {
        file: file.to_owned(),
        column,
    })
}

fn field<'r>(row: &'r csv::StringRecord, col: usize) -> &'r str {
    row.get(col).unwrap_or("").trim()
}

fn parse_coord(lat: &str, lon: &str) -> Option<Coordinate> {
    let lat: f64 = lat.parse().ok()?;
    let lon: f64 = lon.parse().ok()?;
    Coordinate::parse(lat, lon)
}
