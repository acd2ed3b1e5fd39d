//! Non-interactive pipeline execution.
//!
//! Resolves the run configuration from an optional JSON file plus flag
//! overrides, loads the input spreadsheets, runs the pipeline with a
//! stage progress bar, and writes every output.

use std::path::{Path, PathBuf};
use std::time::Instant;

use campus_map_campus_models::AnalysisConfig;
use campus_map_cli_utils::{IndicatifProgress, MultiProgress};
use clap::Args;

/// Arguments for `campus-map analyze`.
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Directory containing campuses.csv, schools.csv, and optionally
    /// students.csv
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    /// Directory the map and report outputs are written to
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// JSON file with an analysis configuration; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Coverage radius in kilometers
    #[arg(long)]
    pub radius_km: Option<f64>,

    /// Penetration rate applied to the addressable market
    #[arg(long)]
    pub penetration_rate: Option<f64>,

    /// Weight on contested students in the addressable market
    #[arg(long)]
    pub overlap_share: Option<f64>,

    /// Capacity per room
    #[arg(long)]
    pub students_per_room: Option<u32>,

    /// Comma-separated campus codes to analyze (enables selection mode)
    #[arg(long, conflicts_with = "all")]
    pub campuses: Option<String>,

    /// Analyze the entire catalog instead of a selection
    #[arg(long)]
    pub all: bool,
}

/// Runs `campus-map analyze`.
///
/// # Errors
///
/// Returns an error if configuration loading, input loading, the
/// pipeline, or output writing fails.
pub fn run(args: &AnalyzeArgs, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<AnalysisConfig>(&raw)?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(radius) = args.radius_km {
        config.coverage_radius_km = radius;
    }
    if let Some(rate) = args.penetration_rate {
        config.penetration_rate = rate;
    }
    if let Some(share) = args.overlap_share {
        config.overlap_share = share;
    }
    if let Some(per_room) = args.students_per_room {
        config.students_per_room = per_room;
    }
    if let Some(codes) = &args.campuses {
        config.use_campus_selection = true;
        config.selected_campus_codes = codes
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(ToOwned::to_owned)
            .collect();
    }
    if args.all {
        config.use_campus_selection = false;
    }

    execute(&args.input_dir, &args.output_dir, &config, multi)
}

/// Loads inputs, runs the pipeline, and writes outputs. Shared by the
/// non-interactive and interactive entry points.
///
/// # Errors
///
/// Returns an error if input loading, the pipeline, or output writing
/// fails.
pub fn execute(
    input_dir: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    log::info!(
        "Configuration: radius {} km, penetration {:.2}%, overlap share {:.0}%, {} students/room",
        config.coverage_radius_km,
        config.penetration_rate * 100.0,
        config.overlap_share * 100.0,
        config.students_per_room,
    );

    let catalog = campus_map_ingest::load_catalog(&input_dir.join("campuses.csv"))?;
    let school_load = campus_map_ingest::load_schools(&input_dir.join("schools.csv"))?;

    // Student records only feed the enrollment cross-check; a missing
    // file is not an error.
    let students_path = input_dir.join("students.csv");
    let students = if students_path.exists() {
        campus_map_ingest::load_students(&students_path)?
    } else {
        log::warn!(
            "No {} found; skipping the enrolled-student cross-check",
            students_path.display()
        );
        Vec::new()
    };

    let progress = IndicatifProgress::stages_bar(multi, "Analyzing");
    let run = campus_map_analytics::pipeline::run(
        &catalog,
        &students,
        &school_load.schools,
        school_load.defaulted_students,
        config,
        Some(progress),
    )?;

    for tam in run.tam.values() {
        log::info!(
            "{}: {} schools, TAM {} of capacity {} ({:.1}% utilization, gap {}, overflow {})",
            tam.campus_code,
            run.coverage.campuses[&tam.campus_code].school_count,
            tam.tam,
            tam.capacity,
            tam.utilization * 100.0,
            tam.gap,
            tam.overflow,
        );
    }

    let outputs = campus_map_generate::write_all(&run, output_dir)?;
    log::info!(
        "Outputs: {}, {}, {}",
        outputs.map_html.display(),
        outputs.geojson.display(),
        outputs.report_dir.display(),
    );

    log::info!("Analysis complete in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
