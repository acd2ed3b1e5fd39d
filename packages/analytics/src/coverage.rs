//! Coverage builder: which schools fall within each campus's radius.

use std::collections::BTreeMap;

use campus_map_analytics_models::{CampusCoverage, CoverageSet, CoveredSchool};
use campus_map_campus_models::{Campus, School};
use campus_map_geo::distance_km;

/// Computes the coverage relation for every (campus, school) pair.
///
/// A pair is retained iff the great-circle distance is within
/// `radius_km`; the boundary is inclusive. Schools or campuses without a
/// usable coordinate never match. Every working-set campus gets an entry,
/// empty when nothing is in range.
#[must_use]
pub fn build_coverage(campuses: &[Campus], schools: &[School], radius_km: f64) -> CoverageSet {
    let mut by_campus: BTreeMap<String, CampusCoverage> = BTreeMap::new();

    for campus in campuses {
        let mut covered: Vec<CoveredSchool> = Vec::new();

        for school in schools {
            let Some(distance) = distance_km(campus.coord, school.coord) else {
                continue;
            };
            if distance <= radius_km {
                // school.coord is Some here, distance_km proved it.
                let Some(coord) = school.coord else { continue };
                covered.push(CoveredSchool {
                    site_id: school.site_id,
                    name: school.name.clone(),
                    coord,
                    students: school.students,
                    distance_km: distance,
                });
            }
        }

        covered.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        let total_students = covered.iter().map(|s| u64::from(s.students)).sum();
        log::debug!(
            "{}: {} school(s) within {radius_km} km, {total_students} students",
            campus.code,
            covered.len(),
        );

        by_campus.insert(
            campus.code.clone(),
            CampusCoverage {
                school_count: covered.len(),
                total_students,
                schools: covered,
            },
        );
    }

    CoverageSet {
        radius_km,
        campuses: by_campus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_map_campus_models::{CampusSource, SchoolSiteId};
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
    fn retains_only_schools_within_radius() {
        let campuses = vec![campus("A", 10.00, 106.00)];
        let schools = vec![
            school(0, "near", 10.01, 106.00, 600),  // ~1.1 km
            school(1, "far", 10.00, 106.05, 700),   // ~5.5 km
        ];

        let coverage = build_coverage(&campuses, &schools, 3.0);
        let a = &coverage.campuses["A"];
        assert_eq!(a.school_count, 1);
        assert_eq!(a.schools[0].name, "near");
        assert_eq!(a.total_students, 600);
    }

    #[test]
    fn school_without_coordinate_matches_nothing() {
        let campuses = vec![campus("A", 10.00, 106.00)];
        let schools = vec![School {
            site_id: SchoolSiteId(0),
            name: "ungeocoded".to_owned(),
            coord: None,
            students: 600,
        }];

        let coverage = build_coverage(&campuses, &schools, f64::MAX);
        assert_eq!(coverage.campuses["A"].school_count, 0);
    }

    #[test]
    fn campus_without_coordinate_covers_nothing() {
        let mut c = campus("A", 10.0, 106.0);
        c.coord = None;
        let schools = vec![school(0, "near", 10.0, 106.0, 600)];

        let coverage = build_coverage(&[c], &schools, f64::MAX);
        assert_eq!(coverage.campuses["A"].school_count, 0);
    }

    #[test]
    fn every_campus_gets_an_entry_even_when_empty() {
        let campuses = vec![campus("A", 10.0, 106.0), campus("B", 50.0, 10.0)];
        let schools = vec![school(0, "near A", 10.01, 106.0, 600)];

        let coverage = build_coverage(&campuses, &schools, 3.0);
        assert_eq!(coverage.campuses.len(), 2);
        assert_eq!(coverage.campuses["B"].school_count, 0);
        assert_eq!(coverage.campuses["B"].total_students, 0);
    }

    #[test]
    fn schools_sorted_nearest_first() {
        let campuses = vec![campus("A", 10.00, 106.00)];
        let schools = vec![
            school(0, "second", 10.02, 106.00, 100),
            school(1, "first", 10.01, 106.00, 100),
        ];

        let coverage = build_coverage(&campuses, &schools, 3.0);
        let names: Vec<&str> = coverage.campuses["A"]
            .schools
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn boundary_distance_is_included() {
        let campuses = vec![campus("A", 10.00, 106.00)];
        let target = school(0, "edge", 10.02, 106.00, 100);
        let exact = campus_map_geo::haversine_km(
            campuses[0].coord.unwrap(),
            target.coord.unwrap(),
        );

        let coverage = build_coverage(&campuses, &[target], exact);
        assert_eq!(coverage.campuses["A"].school_count, 1);
    }
}
