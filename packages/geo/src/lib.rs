#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate validity and great-circle distance.
//!
//! Leaf geometry utility used by every other crate in the workspace.
//! Distances are haversine great-circle distances in kilometers on a
//! spherical Earth. Records with unusable coordinates carry `None`
//! instead of a [`Coordinate`], and [`distance_km`] propagates that as
//! "undefined distance", which radius comparisons treat as never within
//! range.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated geographic coordinate in decimal degrees.
///
/// Construct through [`Coordinate::parse`] when the values come from
/// source data; use the struct literal only for values known to be valid
/// (e.g. in tests).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl Coordinate {
    /// Validates a raw `(lat, lon)` pair from source data.
    ///
    /// Returns `None` for non-finite values, values outside the valid
    /// degree ranges, and the exact origin `(0, 0)` -- source spreadsheets
    /// use zeroed coordinates for rows that were never geocoded.
    #[must_use]
    pub fn parse(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        if lat == 0.0 && lon == 0.0 {
            return None;
        }
        Some(Self { lat, lon })
    }
}

/// Haversine great-circle distance between two coordinates, in kilometers.
///
/// Symmetric and side-effect free.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().asin()
}

/// Distance between two optionally-present coordinates.
///
/// Returns `None` when either side is missing. Callers comparing against
/// a radius should treat `None` as out of range.
#[must_use]
pub fn distance_km(a: Option<Coordinate>, b: Option<Coordinate>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(haversine_km(a, b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let p = coord(10.7769, 106.7009);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn known_distance_along_meridian() {
        // 0.02 degrees of latitude is ~2.22 km.
        let a = coord(10.00, 106.00);
        let b = coord(10.02, 106.00);
        let d = haversine_km(a, b);
        assert!((d - 2.22).abs() < 0.01, "expected ~2.22 km, got {d}");
    }

    #[test]
    fn symmetric() {
        let a = coord(10.7769, 106.7009);
        let b = coord(21.0278, 105.8342);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-12);
    }

    #[test]
    fn missing_coordinate_has_no_distance() {
        let p = coord(10.0, 106.0);
        assert_eq!(distance_km(Some(p), None), None);
        assert_eq!(distance_km(None, Some(p)), None);
        assert_eq!(distance_km(None, None), None);
    }

    #[test]
    fn parse_rejects_unusable_values() {
        assert!(Coordinate::parse(f64::NAN, 106.0).is_none());
        assert!(Coordinate::parse(10.0, f64::INFINITY).is_none());
        assert!(Coordinate::parse(0.0, 0.0).is_none());
        assert!(Coordinate::parse(91.0, 106.0).is_none());
        assert!(Coordinate::parse(10.0, 181.0).is_none());
        assert!(Coordinate::parse(10.7769, 106.7009).is_some());
    }

    #[test]
    fn parse_allows_zero_on_one_axis() {
        // Only the exact origin is treated as "never geocoded".
        assert!(Coordinate::parse(0.0, 106.0).is_some());
        assert!(Coordinate::parse(10.0, 0.0).is_some());
    }
}
