#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Renders an analysis run into its deliverables: an interactive map
//! (GeoJSON data layer plus a self-contained Leaflet page) and a
//! multi-sheet spreadsheet report (one CSV file per sheet).
//!
//! Renderers are pure consumers: they read the run's structures and never
//! recompute coverage, classification, or market sizing.

pub mod map;
pub mod report;

use std::path::{Path, PathBuf};

use campus_map_analytics_models::AnalysisRun;
use thiserror::Error;

/// Errors that can occur while writing outputs.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Filesystem operation failed.
    #[error("output I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV sheet writing failed.
    #[error("CSV writing failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Paths of everything one rendering pass wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    /// Serialized [`AnalysisRun`] (the round-trippable mapping form).
    pub run_json: PathBuf,
    /// GeoJSON data layer.
    pub geojson: PathBuf,
    /// Self-contained interactive map page.
    pub map_html: PathBuf,
    /// Directory holding the report sheets.
    pub report_dir: PathBuf,
}

/// Writes every deliverable for a run under `out_dir`.
///
/// # Errors
///
/// Returns an error if directory creation or any file write fails.
pub fn write_all(run: &AnalysisRun, out_dir: &Path) -> Result<Outputs, GenerateError> {
    std::fs::create_dir_all(out_dir)?;

    let run_json = out_dir.join("run.json");
    let file = std::io::BufWriter::new(std::fs::File::create(&run_json)?);
    serde_json::to_writer_pretty(file, run)?;
    log::info!("Wrote {}", run_json.display());

    let geojson = out_dir.join("coverage.geojson");
    map::write_geojson(run, &geojson)?;

    let map_html = out_dir.join("coverage_map.html");
    map::write_map_html(run, &map_html)?;

    let report_dir = out_dir.join("report");
    report::write_report(run, &report_dir)?;

    Ok(Outputs {
        run_json,
        geojson,
        map_html,
        report_dir,
    })
}
