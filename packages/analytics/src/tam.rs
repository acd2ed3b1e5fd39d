//! Market sizing: addressable market and TAM per campus.
//!
//! The formula and its default constants are preserved business
//! assumptions, not derived quantities; only their inputs are
//! configurable. Rounding policy: `addressable_market`, `tam`, `gap`,
//! and `overflow` are truncated to whole students, and `gap`/`overflow`
//! are computed against the truncated TAM so the three reported integers
//! stay consistent; `utilization` keeps the untruncated ratio.

use std::collections::BTreeMap;

use campus_map_analytics_models::{
    CoverageSet, SchoolClassification, SchoolType, TamResult, TamSummary,
};
use campus_map_campus_models::{AnalysisConfig, Campus};

/// Computes market sizing for every working-set campus.
///
/// Per campus: `competition = max(0, total - exclusive)`,
/// `addressable_market = exclusive + overlap_share * competition`,
/// `tam = addressable_market * penetration_rate`, with capacity gap and
/// overflow derived from the truncated TAM. A campus with no coverage
/// yields all zeros and `gap = capacity`.
#[must_use]
pub fn compute_tam(
    coverage: &CoverageSet,
    classification: &SchoolClassification,
    campuses: &[Campus],
    config: &AnalysisConfig,
) -> (BTreeMap<String, TamResult>, TamSummary) {
    let mut results = BTreeMap::new();

    for campus in campuses {
        let total_students = coverage.total_students(&campus.code);

        let mut exclusive_students = 0_u64;
        let mut exclusive_schools = 0_usize;
        let mut shared_schools = 0_usize;

        for school in classification.schools.values() {
            if !school.campuses.contains(&campus.code) {
                continue;
            }
            match school.school_type {
                SchoolType::Exclusive => {
                    exclusive_students += u64::from(school.students);
                    exclusive_schools += 1;
                }
                SchoolType::Shared => shared_schools += 1,
            }
        }

        let competition_students = total_students.saturating_sub(exclusive_students);

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (addressable_market, tam, utilization) = {
            let market = exclusive_students as f64
                + config.overlap_share * competition_students as f64;
            let tam_raw = market * config.penetration_rate;
            let utilization = if campus.capacity > 0 {
                tam_raw / f64::from(campus.capacity)
            } else {
                0.0
            };
            (market as u64, tam_raw as u64, utilization)
        };

        let gap = u64::from(campus.capacity).saturating_sub(tam);
        let overflow = tam.saturating_sub(u64::from(campus.capacity));

        log::debug!(
            "{}: exclusive {exclusive_students}, competition {competition_students}, \
             TAM {tam}, utilization {:.1}%",
            campus.code,
            utilization * 100.0,
        );

        results.insert(
            campus.code.clone(),
            TamResult {
                campus_code: campus.code.clone(),
                campus_name: campus.name.clone(),
                total_students,
                exclusive_students,
                competition_students,
                exclusive_schools,
                shared_schools,
                addressable_market,
                tam,
                capacity: campus.capacity,
                utilization,
                gap,
                overflow,
            },
        );
    }

    let total_tam: u64 = results.values().map(|r| r.tam).sum();
    let total_capacity: u64 = results.values().map(|r| u64::from(r.capacity)).sum();

    #[allow(clippy::cast_precision_loss)]
    let overall_utilization = if total_capacity > 0 {
        total_tam as f64 / total_capacity as f64
    } else {
        0.0
    };

    let summary = TamSummary {
        total_tam,
        total_capacity,
        overall_utilization,
    };

    (results, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::coverage::build_coverage;
    use campus_map_campus_models::{CampusSource, School, SchoolSiteId};
    use campus_map_geo::Coordinate;

    fn campus(code: &str, lat: f64, lon: f64, capacity: u32) -> Campus {
        Campus {
            code: code.to_owned(),
            name: format!("{code} name"),
            coord: Coordinate::parse(lat, lon),
            rooms: capacity / 100,
            capacity,
            source: CampusSource::Catalog,
        }
    }

    fn school(id: usize, name: &str, lat: f64, lon: f64, students: u32) -> School {
        School {
            site_id: SchoolSiteId(id),
            name: name.to_owned(),
            coord: Coordinate::parse(lat, lon),
            students,
        }
    }

    fn run(
        campuses: &[Campus],
        schools: &[School],
        config: &AnalysisConfig,
    ) -> (BTreeMap<String, TamResult>, TamSummary) {
        let coverage = build_coverage(campuses, schools, config.coverage_radius_km);
        let classification = classify(&coverage);
        compute_tam(&coverage, &classification, campuses, config)
    }

    #[test]
    fn worked_example_exclusive_only() {
        // Capacity 800, exclusive 1000, no shared: TAM 16.2 truncates to
        // 16, gap 784, no overflow.
        let campuses = vec![campus("A", 10.00, 106.00, 800)];
        let schools = vec![school(0, "X", 10.01, 106.00, 1000)];

        let (results, _) = run(&campuses, &schools, &AnalysisConfig::default());
        let a = &results["A"];

        assert_eq!(a.exclusive_students, 1000);
        assert_eq!(a.competition_students, 0);
        assert_eq!(a.addressable_market, 1000);
        assert_eq!(a.tam, 16);
        assert!((a.utilization - 0.02025).abs() < 1e-9);
        assert_eq!(a.gap, 784);
        assert_eq!(a.overflow, 0);
    }

    #[test]
    fn shared_students_discounted_by_overlap_share() {
        let campuses = vec![
            campus("A", 10.00, 106.00, 800),
            campus("B", 10.02, 106.00, 800),
        ];
        let schools = vec![
            school(0, "shared", 10.01, 106.00, 600),
            // South of A, 3.3 km from B.
            school(1, "a only", 9.99, 106.00, 400),
        ];

        let (results, _) = run(&campuses, &schools, &AnalysisConfig::default());
        let a = &results["A"];

        assert_eq!(a.total_students, 1000);
        assert_eq!(a.exclusive_students, 400);
        assert_eq!(a.competition_students, 600);
        // 400 + 0.5 * 600 = 700
        assert_eq!(a.addressable_market, 700);
        assert_eq!(a.exclusive_schools, 1);
        assert_eq!(a.shared_schools, 1);

        let b = &results["B"];
        assert_eq!(b.exclusive_students, 0);
        assert_eq!(b.competition_students, 600);
        assert_eq!(b.addressable_market, 300);
    }

    #[test]
    fn zero_coverage_campus_gets_full_gap() {
        let campuses = vec![campus("A", 50.00, 10.00, 800)];
        let schools = vec![school(0, "X", 10.01, 106.00, 1000)];

        let (results, _) = run(&campuses, &schools, &AnalysisConfig::default());
        let a = &results["A"];

        assert_eq!(a.total_students, 0);
        assert_eq!(a.exclusive_students, 0);
        assert_eq!(a.addressable_market, 0);
        assert_eq!(a.tam, 0);
        assert!((a.utilization).abs() < f64::EPSILON);
        assert_eq!(a.gap, 800);
        assert_eq!(a.overflow, 0);
    }

    #[test]
    fn gap_and_overflow_are_mutually_exclusive() {
        // A penetration rate over 100% forces overflow.
        let config = AnalysisConfig {
            penetration_rate: 1.0,
            ..AnalysisConfig::default()
        };
        let campuses = vec![campus("A", 10.00, 106.00, 800)];
        let schools = vec![school(0, "X", 10.01, 106.00, 1000)];

        let (results, _) = run(&campuses, &schools, &config);
        let a = &results["A"];

        assert_eq!(a.tam, 1000);
        assert_eq!(a.overflow, 200);
        assert_eq!(a.gap, 0);
        assert!(a.utilization > 1.0);
    }

    #[test]
    fn zero_capacity_yields_zero_utilization() {
        let campuses = vec![campus("A", 10.00, 106.00, 0)];
        let schools = vec![school(0, "X", 10.01, 106.00, 1000)];

        let (results, _) = run(&campuses, &schools, &AnalysisConfig::default());
        assert!((results["A"].utilization).abs() < f64::EPSILON);
    }

    #[test]
    fn tam_monotone_in_its_inputs() {
        let campuses = vec![
            campus("A", 10.00, 106.00, 800),
            campus("B", 10.02, 106.00, 800),
        ];
        let schools = vec![
            school(0, "shared", 10.01, 106.00, 600),
            school(1, "a only", 9.99, 106.00, 400),
        ];

        let base_config = AnalysisConfig::default();
        let (base, _) = run(&campuses, &schools, &base_config);

        // More exclusive students.
        let bigger = vec![
            school(0, "shared", 10.01, 106.00, 600),
            school(1, "a only", 9.99, 106.00, 500),
        ];
        let (more_exclusive, _) = run(&campuses, &bigger, &base_config);
        assert!(more_exclusive["A"].tam >= base["A"].tam);

        // Higher overlap share.
        let (more_share, _) = run(
            &campuses,
            &schools,
            &AnalysisConfig {
                overlap_share: 0.8,
                ..base_config.clone()
            },
        );
        assert!(more_share["A"].tam >= base["A"].tam);

        // Higher penetration rate.
        let (more_pen, _) = run(
            &campuses,
            &schools,
            &AnalysisConfig {
                penetration_rate: 0.05,
                ..base_config
            },
        );
        assert!(more_pen["A"].tam >= base["A"].tam);
    }

    #[test]
    fn summary_sums_fleet_totals() {
        let campuses = vec![
            campus("A", 10.00, 106.00, 800),
            campus("B", 10.02, 106.00, 400),
        ];
        let schools = vec![school(0, "shared", 10.01, 106.00, 600)];

        let (results, summary) = run(&campuses, &schools, &AnalysisConfig::default());
        assert_eq!(summary.total_capacity, 1200);
        assert_eq!(
            summary.total_tam,
            results["A"].tam + results["B"].tam
        );
    }
}
