//! Multi-sheet spreadsheet report.
//!
//! One CSV file per sheet, written under a report directory. Sheets are
//! formatted tables over the run's structures; nothing here recomputes
//! coverage or classification.

use std::path::Path;

use campus_map_analytics_models::{AnalysisRun, SchoolType, UtilizationBand};

use crate::GenerateError;

/// Writes every report sheet under `dir`.
///
/// # Errors
///
/// Returns an error if directory creation or any sheet write fails.
pub fn write_report(run: &AnalysisRun, dir: &Path) -> Result<(), GenerateError> {
    std::fs::create_dir_all(dir)?;

    write_overview(run, &dir.join("overview.csv"))?;
    write_overlap_matrix(run, &dir.join("overlap_matrix.csv"))?;
    write_tam_analysis(run, &dir.join("tam_analysis.csv"))?;
    write_competition(run, &dir.join("competition.csv"))?;
    write_school_classification(run, &dir.join("school_classification.csv"))?;
    for code in run.coverage.campuses.keys() {
        write_campus_detail(run, code, &dir.join(format!("campus_{}.csv", sanitize(code))))?;
    }
    write_market_opportunity(run, &dir.join("market_opportunity.csv"))?;
    write_recommendations(run, &dir.join("recommendations.csv"))?;
    write_validation_summary(run, &dir.join("validation_summary.csv"))?;

    log::info!("Wrote report sheets to {}", dir.display());
    Ok(())
}

fn write_overview(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;
    sheet.write_record([
        "code",
        "name",
        "source",
        "rooms",
        "capacity",
        "schoolsInRange",
        "studentsInRange",
        "exclusiveSchools",
        "exclusiveStudents",
        "sharedSchools",
        "contestedStudents",
        "tam",
        "utilizationPct",
        "gap",
        "overflow",
    ])?;

    for campus in &run.campuses {
        let coverage = &run.coverage.campuses[&campus.code];
        let tam = &run.tam[&campus.code];
        sheet.write_record([
            campus.code.clone(),
            campus.name.clone(),
            campus.source.to_string(),
            campus.rooms.to_string(),
            campus.capacity.to_string(),
            coverage.school_count.to_string(),
            coverage.total_students.to_string(),
            tam.exclusive_schools.to_string(),
            tam.exclusive_students.to_string(),
            tam.shared_schools.to_string(),
            tam.competition_students.to_string(),
            tam.tam.to_string(),
            pct(tam.utilization),
            tam.gap.to_string(),
            tam.overflow.to_string(),
        ])?;
    }

    sheet.flush()?;
    Ok(())
}

fn write_overlap_matrix(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;

    let mut header = vec!["campus".to_owned()];
    header.extend(run.overlap.codes.iter().cloned());
    sheet.write_record(&header)?;

    for (i, code) in run.overlap.codes.iter().enumerate() {
        let mut row = vec![code.clone()];
        row.extend(run.overlap.students[i].iter().map(ToString::to_string));
        sheet.write_record(&row)?;
    }

    sheet.flush()?;
    Ok(())
}

fn write_tam_analysis(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;
    sheet.write_record([
        "code",
        "name",
        "totalStudents",
        "exclusiveStudents",
        "competitionStudents",
        "addressableMarket",
        "tam",
        "capacity",
        "utilizationPct",
        "gap",
        "overflow",
        "band",
    ])?;

    for tam in run.tam.values() {
        sheet.write_record([
            tam.campus_code.clone(),
            tam.campus_name.clone(),
            tam.total_students.to_string(),
            tam.exclusive_students.to_string(),
            tam.competition_students.to_string(),
            tam.addressable_market.to_string(),
            tam.tam.to_string(),
            tam.capacity.to_string(),
            pct(tam.utilization),
            tam.gap.to_string(),
            tam.overflow.to_string(),
            tam.band().to_string(),
        ])?;
    }

    // Fleet-wide totals as a trailing row.
    sheet.write_record([
        "TOTAL".to_owned(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        run.summary.total_tam.to_string(),
        run.summary.total_capacity.to_string(),
        pct(run.summary.overall_utilization),
        String::new(),
        String::new(),
        String::new(),
    ])?;

    sheet.flush()?;
    Ok(())
}

fn write_competition(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;
    sheet.write_record([
        "campusA",
        "campusB",
        "sharedSchools",
        "sharedStudents",
        "schools",
    ])?;

    for pair in &run.overlap.pairs {
        sheet.write_record([
            pair.campus_a.clone(),
            pair.campus_b.clone(),
            pair.school_count.to_string(),
            pair.total_students.to_string(),
            pair.schools.join("; "),
        ])?;
    }

    sheet.flush()?;
    Ok(())
}

fn write_school_classification(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;
    sheet.write_record([
        "siteId",
        "name",
        "classification",
        "campuses",
        "students",
        "lat",
        "lon",
    ])?;

    for (site_id, school) in &run.classification.schools {
        sheet.write_record([
            site_id.to_string(),
            school.name.clone(),
            school.school_type.to_string(),
            school.campuses.join("; "),
            school.students.to_string(),
            format!("{:.6}", school.coord.lat),
            format!("{:.6}", school.coord.lon),
        ])?;
    }

    sheet.flush()?;
    Ok(())
}

fn write_campus_detail(run: &AnalysisRun, code: &str, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;
    sheet.write_record(["name", "distanceKm", "students", "classification"])?;

    for school in &run.coverage.campuses[code].schools {
        let classification = run
            .classification
            .schools
            .get(&school.site_id)
            .map_or(SchoolType::Exclusive, |s| s.school_type);
        sheet.write_record([
            school.name.clone(),
            format!("{:.2}", school.distance_km),
            school.students.to_string(),
            classification.to_string(),
        ])?;
    }

    sheet.flush()?;
    Ok(())
}

fn write_market_opportunity(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;
    sheet.write_record([
        "code",
        "name",
        "opportunity",
        "overflow",
        "gap",
        "roomsNeeded",
    ])?;

    let per_room = u64::from(run.config.students_per_room.max(1));

    let mut overflowing: Vec<_> = run.tam.values().filter(|t| t.overflow > 0).collect();
    overflowing.sort_by(|a, b| b.overflow.cmp(&a.overflow));
    for tam in overflowing {
        let rooms_needed = tam.overflow.div_ceil(per_room);
        sheet.write_record([
            tam.campus_code.clone(),
            tam.campus_name.clone(),
            "expand capacity".to_owned(),
            tam.overflow.to_string(),
            "0".to_owned(),
            rooms_needed.to_string(),
        ])?;
    }

    let mut idle: Vec<_> = run.tam.values().filter(|t| t.utilization < 0.5).collect();
    idle.sort_by(|a, b| b.gap.cmp(&a.gap));
    for tam in idle {
        sheet.write_record([
            tam.campus_code.clone(),
            tam.campus_name.clone(),
            "fill spare capacity".to_owned(),
            "0".to_owned(),
            tam.gap.to_string(),
            "0".to_owned(),
        ])?;
    }

    sheet.flush()?;
    Ok(())
}

fn write_recommendations(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;
    sheet.write_record(["code", "name", "utilizationPct", "band", "recommendation"])?;

    for tam in run.tam.values() {
        let recommendation = match tam.band() {
            UtilizationBand::Underutilized => {
                "Demand is well below capacity; strengthen local marketing"
            }
            UtilizationBand::Optimal => "Healthy utilization",
            UtilizationBand::NearFull => "Approaching capacity; monitor enrollment closely",
            UtilizationBand::Overflow => {
                "Demand exceeds capacity; add rooms or open a nearby campus"
            }
        };
        sheet.write_record([
            tam.campus_code.clone(),
            tam.campus_name.clone(),
            pct(tam.utilization),
            tam.band().to_string(),
            recommendation.to_owned(),
        ])?;
    }

    sheet.flush()?;
    Ok(())
}

fn write_validation_summary(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let mut sheet = csv::Writer::from_path(path)?;
    sheet.write_record(["metric", "value"])?;

    let rows: Vec<(&str, String)> = vec![
        ("generatedAt", run.generated_at.clone()),
        ("radiusKm", run.coverage.radius_km.to_string()),
        ("penetrationRate", run.config.penetration_rate.to_string()),
        ("overlapShare", run.config.overlap_share.to_string()),
        ("studentsPerRoom", run.config.students_per_room.to_string()),
        ("campuses", run.campuses.len().to_string()),
        ("schoolsClassified", run.classification.schools.len().to_string()),
        ("exclusiveSchools", run.classification.exclusive_count().to_string()),
        ("sharedSchools", run.classification.shared_count().to_string()),
        ("reconcileRemoved", run.reconcile.removed.to_string()),
        ("reconcileReclassified", run.reconcile.reclassified.to_string()),
        ("reconcileUnchanged", run.reconcile.unchanged.to_string()),
        (
            "schoolsMissingCoordinates",
            run.quality.schools_missing_coordinates.to_string(),
        ),
        (
            "campusesMissingCoordinates",
            run.quality.campuses_missing_coordinates.to_string(),
        ),
        (
            "defaultedStudentCounts",
            run.quality.defaulted_student_counts.to_string(),
        ),
        ("registryIssues", run.quality.registry.issue_count().to_string()),
        ("enrolledMatched", run.enrolled_matched.to_string()),
        ("enrolledTotal", run.enrolled_total.to_string()),
    ];

    for (metric, value) in rows {
        sheet.write_record([metric, value.as_str()])?;
    }

    sheet.flush()?;
    Ok(())
}

fn pct(ratio: f64) -> String {
    format!("{:.1}", ratio * 100.0)
}

/// Campus codes become file names; keep only filesystem-safe characters.
fn sanitize(code: &str) -> String {
    code.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_map_campus_models::{AnalysisConfig, CatalogCampus, School, SchoolSiteId};
    use campus_map_geo::Coordinate;

    fn sample_run() -> AnalysisRun {
        let catalog = vec![
            CatalogCampus {
                code: "HCM_GR".to_owned(),
                name: "Green Campus".to_owned(),
                coord: Coordinate::parse(10.00, 106.00),
                rooms: Some(8),
            },
            CatalogCampus {
                code: "HCM_TQB".to_owned(),
                name: "Ta Quang Buu Campus".to_owned(),
                coord: Coordinate::parse(10.02, 106.00),
                rooms: Some(8),
            },
        ];
        let schools = vec![School {
            site_id: SchoolSiteId(0),
            name: "X".to_owned(),
            coord: Coordinate::parse(10.01, 106.00),
            students: 600,
        }];
        let config = AnalysisConfig {
            use_campus_selection: false,
            ..AnalysisConfig::default()
        };
        campus_map_analytics::pipeline::run(&catalog, &[], &schools, 0, &config, None).unwrap()
    }

    fn report_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("campus_map_report_tests").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn writes_every_sheet() {
        let run = sample_run();
        let dir = report_dir("all_sheets");
        write_report(&run, &dir).unwrap();

        for sheet in [
            "overview.csv",
            "overlap_matrix.csv",
            "tam_analysis.csv",
            "competition.csv",
            "school_classification.csv",
            "campus_HCM_GR.csv",
            "campus_HCM_TQB.csv",
            "market_opportunity.csv",
            "recommendations.csv",
            "validation_summary.csv",
        ] {
            assert!(dir.join(sheet).exists(), "missing sheet {sheet}");
        }
    }

    #[test]
    fn overview_has_one_row_per_campus() {
        let run = sample_run();
        let dir = report_dir("overview_rows");
        write_report(&run, &dir).unwrap();

        let content = std::fs::read_to_string(dir.join("overview.csv")).unwrap();
        assert_eq!(content.lines().count(), 1 + run.campuses.len());
    }

    #[test]
    fn matrix_sheet_mirrors_the_matrix() {
        let run = sample_run();
        let dir = report_dir("matrix");
        write_report(&run, &dir).unwrap();

        let content = std::fs::read_to_string(dir.join("overlap_matrix.csv")).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "campus,HCM_GR,HCM_TQB");
        // Diagonal holds own totals, off-diagonal the shared 600.
        assert_eq!(lines.next().unwrap(), "HCM_GR,600,600");
        assert_eq!(lines.next().unwrap(), "HCM_TQB,600,600");
    }

    #[test]
    fn sanitize_keeps_codes_filesystem_safe() {
        assert_eq!(sanitize("HCM_GR"), "HCM_GR");
        assert_eq!(sanitize("HCM/GR 2"), "HCM_GR_2");
    }
}
