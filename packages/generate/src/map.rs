//! Interactive map rendering.
//!
//! Emits the run as a GeoJSON `FeatureCollection` -- campus markers,
//! school markers, per-campus radius rings, and convex coverage hulls --
//! plus a self-contained Leaflet page that embeds the collection and
//! renders popups, layer toggles, and a legend client-side.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::Path;

use campus_map_analytics_models::AnalysisRun;
use campus_map_campus_models::SchoolSiteId;
use campus_map_geo::{Coordinate, EARTH_RADIUS_KM};
use geo::{ConvexHull as _, MultiPoint, Point};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

use crate::GenerateError;

/// Marker palette, assigned to campuses by sorted code order and wrapped
/// when there are more campuses than colors.
pub const CAMPUS_COLORS: [&str; 8] = [
    "#2a81cb", // blue
    "#cb2b3e", // red
    "#2aad27", // green
    "#9c2bcb", // purple
    "#cb8427", // orange
    "#0e5a8a", // dark blue
    "#7a1420", // dark red
    "#1a6b18", // dark green
];

/// Number of segments in a rendered radius ring.
const CIRCLE_SEGMENTS: usize = 64;

/// Color for a campus, by its position among the sorted codes.
#[must_use]
pub fn campus_color(sorted_codes: &[String], code: &str) -> &'static str {
    let index = sorted_codes.iter().position(|c| c == code).unwrap_or(0);
    CAMPUS_COLORS[index % CAMPUS_COLORS.len()]
}

/// Builds the full GeoJSON feature collection for a run.
///
/// Feature kinds are distinguished by the `featureType` property:
/// `campus`, `school`, `radius`, and `hull`.
#[must_use]
pub fn build_feature_collection(run: &AnalysisRun) -> FeatureCollection {
    let codes: Vec<String> = run.coverage.campuses.keys().cloned().collect();
    let mut features = Vec::new();

    // Per-school distance lookup for the school popups.
    let mut distances: BTreeMap<SchoolSiteId, BTreeMap<&str, f64>> = BTreeMap::new();
    for (code, coverage) in &run.coverage.campuses {
        for school in &coverage.schools {
            distances
                .entry(school.site_id)
                .or_default()
                .insert(code.as_str(), school.distance_km);
        }
    }

    for campus in &run.campuses {
        let Some(coord) = campus.coord else { continue };
        let color = campus_color(&codes, &campus.code);

        let mut props = JsonObject::new();
        props.insert("featureType".to_owned(), "campus".into());
        props.insert("code".to_owned(), campus.code.clone().into());
        props.insert("name".to_owned(), campus.name.clone().into());
        props.insert("source".to_owned(), campus.source.to_string().into());
        props.insert("rooms".to_owned(), campus.rooms.into());
        props.insert("capacity".to_owned(), campus.capacity.into());
        props.insert("color".to_owned(), color.into());
        if let Some(tam) = run.tam.get(&campus.code) {
            props.insert("schoolCount".to_owned(), run.coverage.campuses[&campus.code].school_count.into());
            props.insert("totalStudents".to_owned(), tam.total_students.into());
            props.insert("exclusiveStudents".to_owned(), tam.exclusive_students.into());
            props.insert("competitionStudents".to_owned(), tam.competition_students.into());
            props.insert("tam".to_owned(), tam.tam.into());
            props.insert(
                "utilizationPct".to_owned(),
                round1(tam.utilization * 100.0).into(),
            );
            props.insert("gap".to_owned(), tam.gap.into());
            props.insert("overflow".to_owned(), tam.overflow.into());
        }

        features.push(point_feature(coord, props));

        // Radius ring for this campus.
        let mut ring_props = JsonObject::new();
        ring_props.insert("featureType".to_owned(), "radius".into());
        ring_props.insert("code".to_owned(), campus.code.clone().into());
        ring_props.insert("radiusKm".to_owned(), run.coverage.radius_km.into());
        ring_props.insert("color".to_owned(), color.into());
        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Polygon(vec![circle_ring(
                coord,
                run.coverage.radius_km,
            )]))),
            id: None,
            properties: Some(ring_props),
            foreign_members: None,
        });
    }

    // Convex hull of each campus's covered schools (visual aid only; the
    // calculation is always the radius).
    for (code, coverage) in &run.coverage.campuses {
        if coverage.schools.len() < 3 {
            continue;
        }
        let points: Vec<Point<f64>> = coverage
            .schools
            .iter()
            .map(|s| Point::new(s.coord.lon, s.coord.lat))
            .collect();
        let hull = MultiPoint::from(points).convex_hull();

        let mut props = JsonObject::new();
        props.insert("featureType".to_owned(), "hull".into());
        props.insert("code".to_owned(), code.clone().into());
        props.insert("schoolCount".to_owned(), coverage.school_count.into());
        props.insert("color".to_owned(), campus_color(&codes, code).into());
        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::from(&hull))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    for (site_id, school) in &run.classification.schools {
        let mut props = JsonObject::new();
        props.insert("featureType".to_owned(), "school".into());
        props.insert("siteId".to_owned(), site_id.to_string().into());
        props.insert("name".to_owned(), school.name.clone().into());
        props.insert("students".to_owned(), school.students.into());
        props.insert(
            "classification".to_owned(),
            school.school_type.to_string().into(),
        );
        props.insert(
            "campuses".to_owned(),
            school
                .campuses
                .iter()
                .map(|c| serde_json::Value::from(c.as_str()))
                .collect::<Vec<_>>()
                .into(),
        );
        // Color shared schools neutrally; exclusive schools take their
        // campus's color.
        let color = if school.campuses.len() == 1 {
            campus_color(&codes, &school.campuses[0])
        } else {
            "#e89c0e"
        };
        props.insert("color".to_owned(), color.into());
        if let Some(dists) = distances.get(site_id) {
            let map: JsonObject = dists
                .iter()
                .map(|(code, km)| ((*code).to_owned(), round2(*km).into()))
                .collect();
            props.insert("distancesKm".to_owned(), map.into());
        }

        features.push(point_feature(school.coord, props));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Writes the GeoJSON data layer.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_geojson(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let collection = build_feature_collection(run);
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer(file, &collection)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Writes the self-contained Leaflet map page.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub fn write_map_html(run: &AnalysisRun, path: &Path) -> Result<(), GenerateError> {
    let collection = build_feature_collection(run);
    let geojson = serde_json::to_string(&collection)?;

    let codes: Vec<String> = run.coverage.campuses.keys().cloned().collect();
    let legend_rows: String = codes
        .iter()
        .map(|code| {
            format!(
                "<div><span class=\"swatch\" style=\"background:{}\"></span>{code}</div>",
                campus_color(&codes, code)
            )
        })
        .collect();

    let center = map_center(run);

    let html = include_str!("map_template.html")
        .replace("__TITLE__", "Campus coverage map")
        .replace("__GENERATED_AT__", &run.generated_at)
        .replace("__RADIUS_KM__", &run.coverage.radius_km.to_string())
        .replace("__CENTER_LAT__", &center.lat.to_string())
        .replace("__CENTER_LON__", &center.lon.to_string())
        .replace("__LEGEND_ROWS__", &legend_rows)
        .replace("__GEOJSON__", &geojson);

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    file.write_all(html.as_bytes())?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Mean position of the campuses with a usable coordinate, falling back
/// to the classified schools when no campus is geocoded.
fn map_center(run: &AnalysisRun) -> Coordinate {
    let campus_coords: Vec<Coordinate> = run.campuses.iter().filter_map(|c| c.coord).collect();
    let coords = if campus_coords.is_empty() {
        run.classification.schools.values().map(|s| s.coord).collect()
    } else {
        campus_coords
    };

    if coords.is_empty() {
        return Coordinate { lat: 0.0, lon: 0.0 };
    }

    #[allow(clippy::cast_precision_loss)]
    let n = coords.len() as f64;
    Coordinate {
        lat: coords.iter().map(|c| c.lat).sum::<f64>() / n,
        lon: coords.iter().map(|c| c.lon).sum::<f64>() / n,
    }
}

fn point_feature(coord: Coordinate, props: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![coord.lon, coord.lat]))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Closed ring approximating a circle of `radius_km` around `center`, in
/// GeoJSON position order (lon, lat).
fn circle_ring(center: Coordinate, radius_km: f64) -> Vec<Vec<f64>> {
    let angular = radius_km / EARTH_RADIUS_KM;
    let lat_step = angular.to_degrees();
    let lon_step = lat_step / center.lat.to_radians().cos();

    #[allow(clippy::cast_precision_loss)]
    let mut ring: Vec<Vec<f64>> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let theta = 2.0 * std::f64::consts::PI * (i as f64) / (CIRCLE_SEGMENTS as f64);
            vec![
                center.lon + lon_step * theta.sin(),
                center.lat + lat_step * theta.cos(),
            ]
        })
        .collect();
    ring.push(ring[0].clone());
    ring
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
