//! Overlap aggregator: pairwise contested-student matrix.

use campus_map_analytics_models::{
    CoverageSet, OverlapMatrix, OverlapPair, SchoolClassification, SchoolType,
};

/// Builds the symmetric campus-by-campus overlap matrix.
///
/// Off-diagonal cell `(i, j)` sums the students of shared schools whose
/// covering-campus set contains both campuses; the diagonal carries each
/// campus's own total coverage students. Fully recomputed from the
/// classifier output; never patched incrementally.
#[must_use]
pub fn build_overlap(
    coverage: &CoverageSet,
    classification: &SchoolClassification,
) -> OverlapMatrix {
    let codes: Vec<String> = coverage.campuses.keys().cloned().collect();
    let n = codes.len();

    let mut students = vec![vec![0_u64; n]; n];
    let mut pairs = Vec::new();

    for (i, code) in codes.iter().enumerate() {
        students[i][i] = coverage.total_students(code);
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let mut shared_schools = Vec::new();
            let mut shared_students = 0_u64;

            for school in classification.schools.values() {
                if school.school_type == SchoolType::Shared
                    && school.campuses.contains(&codes[i])
                    && school.campuses.contains(&codes[j])
                {
                    shared_schools.push(school.name.clone());
                    shared_students += u64::from(school.students);
                }
            }

            students[i][j] = shared_students;
            students[j][i] = shared_students;

            if shared_students > 0 {
                log::debug!(
                    "{} <-> {}: {} shared school(s), {shared_students} students",
                    codes[i],
                    codes[j],
                    shared_schools.len(),
                );
            }

            pairs.push(OverlapPair {
                campus_a: codes[i].clone(),
                campus_b: codes[j].clone(),
                school_count: shared_schools.len(),
                total_students: shared_students,
                schools: shared_schools,
            });
        }
    }

    OverlapMatrix {
        codes,
        students,
        pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::coverage::build_coverage;
    use campus_map_campus_models::{Campus, CampusSource, School, SchoolSiteId};
    use campus_map_geo::Coordinate;

    fn campus(code: &str, lat: f64, lon: f64) -> Campus {
        Campus {
            code: code.to_owned(),
            name: format!("{code} name"),
            coord: Coordinate::parse(lat, lon),
            rooms: 8,
            capacity: 800,
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

    #[test]
    fn shared_school_counted_in_pair_cell() {
        // The worked scenario: X (600 students) within 3 km of both A
        // and B, Y out of range entirely.
        let campuses = vec![campus("A", 10.00, 106.00), campus("B", 10.02, 106.00)];
        let schools = vec![
            school(0, "X", 10.01, 106.00, 600),
            school(1, "Y", 10.00, 106.05, 450),
        ];
        let coverage = build_coverage(&campuses, &schools, 3.0);
        let classification = classify(&coverage);

        let matrix = build_overlap(&coverage, &classification);
        assert_eq!(matrix.cell("A", "B"), 600);
        assert_eq!(matrix.cell("B", "A"), 600);
        assert!(matrix.is_symmetric());

        let pair = matrix.pair("A", "B").unwrap();
        assert_eq!(pair.school_count, 1);
        assert_eq!(pair.schools, vec!["X".to_owned()]);
    }

    #[test]
    fn diagonal_is_own_coverage_total_not_zero() {
        let campuses = vec![campus("A", 10.00, 106.00), campus("B", 10.02, 106.00)];
        let schools = vec![
            school(0, "X", 10.01, 106.00, 600),
            // South of A, out of B's range; still counts toward A's
            // diagonal.
            school(1, "Z", 9.99, 106.00, 250),
        ];
        let coverage = build_coverage(&campuses, &schools, 3.0);
        let classification = classify(&coverage);

        let matrix = build_overlap(&coverage, &classification);
        assert_eq!(matrix.cell("A", "A"), 850);
        assert_eq!(matrix.cell("B", "B"), 600);
    }

    #[test]
    fn disjoint_campuses_share_nothing() {
        let campuses = vec![campus("A", 10.00, 106.00), campus("B", 50.00, 10.00)];
        let schools = vec![school(0, "X", 10.01, 106.00, 600)];
        let coverage = build_coverage(&campuses, &schools, 3.0);
        let classification = classify(&coverage);

        let matrix = build_overlap(&coverage, &classification);
        assert_eq!(matrix.cell("A", "B"), 0);
        let pair = matrix.pair("A", "B").unwrap();
        assert_eq!(pair.school_count, 0);
        assert!(pair.schools.is_empty());
    }

    #[test]
    fn exclusive_schools_never_enter_off_diagonal_cells() {
        // Three campuses in a row; X shared by A and B only.
        let campuses = vec![
            campus("A", 10.00, 106.00),
            campus("B", 10.02, 106.00),
            campus("C", 10.50, 106.00),
        ];
        let schools = vec![
            school(0, "X", 10.01, 106.00, 600),
            school(1, "C only", 10.50, 106.01, 300),
        ];
        let coverage = build_coverage(&campuses, &schools, 3.0);
        let classification = classify(&coverage);

        let matrix = build_overlap(&coverage, &classification);
        assert_eq!(matrix.cell("A", "C"), 0);
        assert_eq!(matrix.cell("B", "C"), 0);
        assert_eq!(matrix.cell("C", "C"), 300);
    }
}
