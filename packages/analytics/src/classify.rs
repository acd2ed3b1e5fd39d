//! School classifier: exclusive vs. shared, derived from coverage.
//!
//! Classification is a pure function of the coverage relation, which is
//! itself recomputed from coordinates on every run. There is exactly one
//! code path that assigns a [`SchoolType`]; no consumer ever trusts a
//! cached label. [`reconcile`] audits an older classification against a
//! fresh one and reports any drift, which would indicate an upstream bug.

use campus_map_analytics_models::{
    ClassifiedSchool, CoverageSet, ReconcileStats, SchoolClassification, SchoolType,
};

/// Classifies every covered school by its covering-campus set.
///
/// Schools covered by no campus get no entry; one campus means
/// exclusive; two or more mean shared. Campus codes in each entry are
/// sorted. Idempotent: classifying the same coverage twice yields
/// identical output.
#[must_use]
pub fn classify(coverage: &CoverageSet) -> SchoolClassification {
    let mut classification = SchoolClassification::default();

    for (code, campus_coverage) in &coverage.campuses {
        for school in &campus_coverage.schools {
            let entry = classification
                .schools
                .entry(school.site_id)
                .or_insert_with(|| ClassifiedSchool {
                    name: school.name.clone(),
                    coord: school.coord,
                    students: school.students,
                    campuses: Vec::new(),
                    school_type: SchoolType::Exclusive,
                });

            if !entry.campuses.contains(code) {
                entry.campuses.push(code.clone());
            }
        }
    }

    for school in classification.schools.values_mut() {
        school.campuses.sort();
        // Non-empty by construction: every entry came from a coverage row.
        if let Some(school_type) = SchoolType::from_campus_count(school.campuses.len()) {
            school.school_type = school_type;
        }
    }

    log::info!(
        "Classified {} school(s): {} exclusive, {} shared",
        classification.schools.len(),
        classification.exclusive_count(),
        classification.shared_count(),
    );

    classification
}

/// Audits a previously computed classification against a fresh one.
///
/// Counts entries the fresh classification removed, reclassified, or
/// kept unchanged, logging each divergence. Divergence means an upstream
/// stage handed a consumer stale derived state; the fresh classification
/// is authoritative either way.
#[must_use]
pub fn reconcile(
    previous: &SchoolClassification,
    current: &SchoolClassification,
) -> ReconcileStats {
    let mut stats = ReconcileStats::default();

    for (site_id, old) in &previous.schools {
        match current.schools.get(site_id) {
            None => {
                log::warn!("{} ({site_id}): no longer within any radius, removed", old.name);
                stats.removed += 1;
            }
            Some(new) if new.school_type != old.school_type || new.campuses != old.campuses => {
                log::warn!(
                    "{} ({site_id}): reclassified {} -> {} (campuses {:?} -> {:?})",
                    old.name,
                    old.school_type,
                    new.school_type,
                    old.campuses,
                    new.campuses,
                );
                stats.reclassified += 1;
            }
            Some(_) => stats.unchanged += 1,
        }
    }

    if !stats.is_clean() {
        log::error!(
            "Classification drift detected: {} removed, {} reclassified, {} unchanged",
            stats.removed,
            stats.reclassified,
            stats.unchanged,
        );
    }

    stats
}
