#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Campus working-set resolution.
//!
//! Turns the loaded campus catalog plus the run configuration into the
//! list of campuses one analysis run operates on: a selected subset of
//! the catalog, optionally extended with ad-hoc campus records. Per-item
//! problems (unknown codes, incomplete records, duplicates) are collected
//! and reported, never fatal; only an empty working set aborts the run.

use campus_map_campus_models::{
    AnalysisConfig, Campus, CampusSource, CatalogCampus, NewCampus, RegistryReport,
};
use campus_map_geo::Coordinate;
use thiserror::Error;

/// Room count assumed when the catalog column is blank.
pub const DEFAULT_ROOMS: u32 = 8;

/// Errors that can abort working-set resolution.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Selection and additions produced no campuses at all.
    #[error("no campuses resolved: selection matched nothing and no valid additions were given")]
    NoCampuses,
}

/// Resolves the campus working set for one run.
///
/// With selection disabled the whole catalog is used. With selection
/// enabled, the working set is the selected catalog codes (unknown codes
/// skipped and reported) plus the valid ad-hoc additions (incomplete
/// records skipped and reported). A code can only enter the set once;
/// later duplicates are skipped and reported.
///
/// Capacity is `rooms * students_per_room`, with blank room counts
/// defaulting to [`DEFAULT_ROOMS`].
///
/// # Errors
///
/// Returns [`RegistryError::NoCampuses`] when the resulting set is empty.
pub fn resolve(
    catalog: &[CatalogCampus],
    config: &AnalysisConfig,
) -> Result<(Vec<Campus>, RegistryReport), RegistryError> {
    let mut report = RegistryReport::default();
    let mut campuses: Vec<Campus> = Vec::new();

    if config.use_campus_selection {
        for code in &config.selected_campus_codes {
            let code = code.trim();

            if campuses.iter().any(|c| c.code == code) {
                log::warn!("Campus {code} selected more than once, keeping first");
                report.duplicate_codes.push(code.to_owned());
                continue;
            }

            match catalog.iter().find(|c| c.code == code) {
                Some(entry) => campuses.push(from_catalog(entry, config.students_per_room)),
                None => {
                    log::warn!("Selected campus {code} not found in catalog, skipping");
                    report.missing_codes.push(code.to_owned());
                }
            }
        }

        for record in &config.new_campuses {
            match validate_new(record) {
                Ok((code, name, coord, rooms)) => {
                    if campuses.iter().any(|c| c.code == code) {
                        log::warn!("Added campus {code} collides with an existing code, keeping first");
                        report.duplicate_codes.push(code);
                        continue;
                    }
                    log::info!("Added campus {code} ({name}) at ({}, {})", coord.lat, coord.lon);
                    campuses.push(Campus {
                        capacity: rooms * config.students_per_room,
                        code,
                        name,
                        coord: Some(coord),
                        rooms,
                        source: CampusSource::Added,
                    });
                }
                Err(reason) => {
                    log::warn!("Skipping invalid campus record: {reason}");
                    report.invalid_new.push(reason);
                }
            }
        }
    } else {
        for entry in catalog {
            if campuses.iter().any(|c| c.code == entry.code) {
                report.duplicate_codes.push(entry.code.clone());
                continue;
            }
            campuses.push(from_catalog(entry, config.students_per_room));
        }
    }

    if campuses.is_empty() {
        return Err(RegistryError::NoCampuses);
    }

    log::info!(
        "Resolved {} campus(es) ({} issue(s) skipped)",
        campuses.len(),
        report.issue_count()
    );

    Ok((campuses, report))
}

/// Builds a working-set campus from a catalog row.
fn from_catalog(entry: &CatalogCampus, students_per_room: u32) -> Campus {
    let rooms = entry.rooms.unwrap_or(DEFAULT_ROOMS);
    Campus {
        code: entry.code.clone(),
        name: entry.name.clone(),
        coord: entry.coord,
        rooms,
        capacity: rooms * students_per_room,
        source: CampusSource::Catalog,
    }
}

/// Validates an ad-hoc campus record, returning its resolved fields or a
/// human-readable rejection reason.
fn validate_new(record: &NewCampus) -> Result<(String, String, Coordinate, u32), String> {
    let mut missing = Vec::new();
    if record.code.is_none() {
        missing.push("code");
    }
    if record.name.is_none() {
        missing.push("name");
    }
    if record.lat.is_none() {
        missing.push("lat");
    }
    if record.lon.is_none() {
        missing.push("lon");
    }
    if record.rooms.is_none() {
        missing.push("rooms");
    }

    if !missing.is_empty() {
        let label = record.code.as_deref().unwrap_or("<unnamed>");
        return Err(format!("{label}: missing {}", missing.join(", ")));
    }

    let code = record.code.as_deref().unwrap_or_default().trim().to_owned();
    let name = record.name.clone().unwrap_or_default();
    let (lat, lon) = (record.lat.unwrap_or_default(), record.lon.unwrap_or_default());

    let Some(coord) = Coordinate::parse(lat, lon) else {
        return Err(format!("{code}: unusable coordinate ({lat}, {lon})"));
    };

    Ok((code, name, coord, record.rooms.unwrap_or_default()))
}
