#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Campus and school record types shared across the workspace.
//!
//! These are the immutable inputs of one analysis run: the campus catalog,
//! the resolved working set of campuses, public school records, and the
//! run configuration. Derived analytics types live in
//! `campus_map_analytics_models`.

use campus_map_geo::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Where a working-set campus came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum CampusSource {
    /// Selected from the source catalog.
    Catalog,
    /// Supplied ad hoc through the run configuration.
    Added,
}

/// A raw campus catalog row, as loaded from the campus spreadsheet.
///
/// `rooms` stays optional here; the registry applies the default when it
/// builds the working set, so the report can distinguish "8 rooms" from
/// "rooms column was blank".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCampus {
    /// Unique campus code (e.g. "HCM_GR").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Campus location, `None` when the row was never geocoded.
    pub coord: Option<Coordinate>,
    /// Room count, `None` when the column was blank or unparseable.
    pub rooms: Option<u32>,
}

/// An ad-hoc campus record supplied through [`AnalysisConfig`].
///
/// Every field is optional so the registry can report exactly which
/// required fields a rejected record was missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCampus {
    /// Campus code; required.
    pub code: Option<String>,
    /// Display name; required.
    pub name: Option<String>,
    /// Latitude in decimal degrees; required.
    pub lat: Option<f64>,
    /// Longitude in decimal degrees; required.
    pub lon: Option<f64>,
    /// Room count; required.
    pub rooms: Option<u32>,
}

/// A campus in the resolved working set for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campus {
    /// Unique campus code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Campus location.
    pub coord: Option<Coordinate>,
    /// Room count after defaulting.
    pub rooms: u32,
    /// Enrollment capacity: `rooms * students_per_room`.
    pub capacity: u32,
    /// Catalog row or ad-hoc addition.
    pub source: CampusSource,
}

/// Synthetic identifier for a school row.
///
/// School display names are not unique in the source data, so every
/// derived structure keys schools by their source row index and treats
/// the name as a presentation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchoolSiteId(pub usize);

impl std::fmt::Display for SchoolSiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Serialized as a string so the id can key JSON maps.
impl Serialize for SchoolSiteId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SchoolSiteId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<usize>()
            .map(SchoolSiteId)
            .map_err(|_| serde::de::Error::custom(format!("invalid school site id '{raw}'")))
    }
}

/// A public school record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    /// Source row index; the de-facto unique key.
    pub site_id: SchoolSiteId,
    /// Display name; may collide across distinct rows.
    pub name: String,
    /// School location, `None` when the row was never geocoded.
    pub coord: Option<Coordinate>,
    /// Student count, after the missing-value default was applied.
    pub students: u32,
}

/// An enrolled-student record.
///
/// Only the campus code is consumed, for the optional cross-check of
/// enrolled students against the resolved working set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Code of the campus the student is enrolled at.
    pub study_campus_code: String,
}

/// Per-item issues produced while resolving the campus working set.
///
/// All issues here are non-fatal: the offending item is skipped and the
/// run continues unless the resulting working set is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryReport {
    /// Selected codes that were not present in the catalog.
    pub missing_codes: Vec<String>,
    /// Rejection reasons for invalid ad-hoc campus records.
    pub invalid_new: Vec<String>,
    /// Codes that appeared more than once across selection and additions.
    pub duplicate_codes: Vec<String>,
}

impl RegistryReport {
    /// Total number of skipped items.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.missing_codes.len() + self.invalid_new.len() + self.duplicate_codes.len()
    }
}

/// Configuration for one analysis run.
///
/// Plain values with defaults matching the original business assumptions;
/// the TAM arithmetic itself is fixed, only these inputs vary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Multiplier converting addressable market into TAM.
    pub penetration_rate: f64,
    /// Coverage radius in kilometers; the boundary is inclusive.
    pub coverage_radius_km: f64,
    /// Weight on contested students in the addressable market.
    pub overlap_share: f64,
    /// Capacity per room: `capacity = rooms * students_per_room`.
    pub students_per_room: u32,
    /// When `true`, restrict the working set to `selected_campus_codes`
    /// plus `new_campuses`; when `false`, use the entire catalog.
    pub use_campus_selection: bool,
    /// Catalog codes to keep when selection is enabled.
    pub selected_campus_codes: Vec<String>,
    /// Ad-hoc campuses to append when selection is enabled.
    pub new_campuses: Vec<NewCampus>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            penetration_rate: 0.0162,
            coverage_radius_km: 3.0,
            overlap_share: 0.5,
            students_per_room: 100,
            use_campus_selection: true,
            selected_campus_codes: Vec::new(),
            new_campuses: Vec::new(),
        }
    }
}
