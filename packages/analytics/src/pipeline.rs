//! Single-pass batch pipeline: registry -> coverage -> classification ->
//! overlap -> market sizing.
//!
//! Each stage's output is a fresh structure handed to the next stage;
//! nothing is mutated across stage boundaries, so a consumer can never
//! observe a partially updated run. Progress is coarse: one tick per
//! stage.

use std::sync::Arc;

use campus_map_analytics_models::{AnalysisRun, DataQualityReport};
use campus_map_campus_models::{AnalysisConfig, CatalogCampus, School, StudentRecord};

use crate::progress::ProgressCallback;
use crate::{AnalyticsError, classify, coverage, overlap, tam};

/// Number of coarse pipeline stages reported through progress.
pub const STAGE_COUNT: u64 = 6;

/// Runs the full analysis pipeline over already-loaded inputs.
///
/// `defaulted_student_counts` is the loader's count of school rows whose
/// student count fell back to the default; it is carried into the run's
/// data-quality report.
///
/// # Errors
///
/// Returns an error when no campuses resolve from the catalog and
/// configuration, or when `schools` is empty. Per-record issues never
/// abort the run; they are collected into the quality report.
pub fn run(
    catalog: &[CatalogCampus],
    students: &[StudentRecord],
    schools: &[School],
    defaulted_student_counts: usize,
    config: &AnalysisConfig,
    progress: Option<Arc<dyn ProgressCallback>>,
) -> Result<AnalysisRun, AnalyticsError> {
    if schools.is_empty() {
        return Err(AnalyticsError::NoSchools);
    }

    let tick = |msg: &str| {
        if let Some(p) = &progress {
            p.set_message(msg.to_owned());
            p.inc(1);
        }
    };
    if let Some(p) = &progress {
        p.set_total(STAGE_COUNT);
    }

    // -- 1. Campus working set --
    let (campuses, registry_report) = campus_map_registry::resolve(catalog, config)?;
    tick("Resolved campuses");

    // -- 2. Coverage --
    let coverage = coverage::build_coverage(&campuses, schools, config.coverage_radius_km);
    tick("Computed coverage");

    // -- 3. Classification --
    let mut classification = classify::classify(&coverage);
    tick("Classified schools");

    // -- 4. Audit: re-derive and compare, then enforce the type
    //    invariant before any consumer sees the classification. Both are
    //    expected to be no-ops; a non-zero count is an upstream bug
    //    surfaced loudly rather than masked.
    let fresh = classify::classify(&coverage);
    let reconcile = classify::reconcile(&classification, &fresh);

    let corrections = classification.enforce_invariant();
    if corrections > 0 {
        log::error!("Corrected {corrections} inconsistent classification entr(ies)");
    }
    tick("Audited classification");

    // -- 5. Overlap --
    let overlap = overlap::build_overlap(&coverage, &classification);
    tick("Built overlap matrix");

    // -- 6. Market sizing --
    let (tam, summary) = tam::compute_tam(&coverage, &classification, &campuses, config);
    tick("Sized markets");

    // Enrolled-student cross-check: how much of the student file belongs
    // to the campuses under analysis.
    let enrolled_matched = students
        .iter()
        .filter(|s| campuses.iter().any(|c| c.code == s.study_campus_code))
        .count() as u64;
    let enrolled_total = students.len() as u64;
    if enrolled_total > 0 {
        log::info!(
            "{enrolled_matched}/{enrolled_total} enrolled student(s) belong to the selected campuses"
        );
    }

    let quality = DataQualityReport {
        schools_missing_coordinates: schools.iter().filter(|s| s.coord.is_none()).count(),
        campuses_missing_coordinates: campuses.iter().filter(|c| c.coord.is_none()).count(),
        defaulted_student_counts,
        registry: registry_report,
    };

    if let Some(p) = &progress {
        p.finish(format!(
            "Analyzed {} campus(es), {} school(s)",
            campuses.len(),
            classification.schools.len()
        ));
    }

    Ok(AnalysisRun {
        generated_at: chrono::Utc::now().to_rfc3339(),
        config: config.clone(),
        campuses,
        coverage,
        classification,
        overlap,
        tam,
        summary,
        quality,
        reconcile,
        enrolled_matched,
        enrolled_total,
    })
}
