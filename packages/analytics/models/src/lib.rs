#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for the coverage/overlap/classification engine.
//!
//! Every structure here is derived from the inputs of one run and is
//! replaced wholesale whenever an upstream stage re-runs; nothing is
//! patched in place. All types are mapping-serializable so a full run can
//! round-trip through JSON.

use std::collections::BTreeMap;

use campus_map_campus_models::{AnalysisConfig, Campus, RegistryReport, SchoolSiteId};
use campus_map_geo::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How many campuses cover a school.
///
/// The variant is always a pure function of the covering-campus set:
/// exactly one campus means exclusive, two or more mean shared. Schools
/// covered by no campus carry no classification at all.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SchoolType {
    /// Covered by exactly one campus.
    Exclusive,
    /// Covered by two or more campuses (contested demand).
    Shared,
}

impl SchoolType {
    /// Derives the type from the size of a covering-campus set.
    ///
    /// Returns `None` for an empty set: such a school is dropped from
    /// classification entirely.
    #[must_use]
    pub const fn from_campus_count(count: usize) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Exclusive),
            _ => Some(Self::Shared),
        }
    }
}

/// A school retained in one campus's coverage set, with the computed
/// distance to that campus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoveredSchool {
    /// Source row index of the school.
    pub site_id: SchoolSiteId,
    /// Display name.
    pub name: String,
    /// School location. Always present: schools without a usable
    /// coordinate never enter any coverage set.
    pub coord: Coordinate,
    /// Student count (defaults already applied at load time).
    pub students: u32,
    /// Great-circle distance to the campus, in kilometers.
    pub distance_km: f64,
}

/// One campus's coverage: the schools within the radius, nearest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampusCoverage {
    /// Retained schools, sorted by distance.
    pub schools: Vec<CoveredSchool>,
    /// Number of retained schools.
    pub school_count: usize,
    /// Sum of student counts over the retained schools.
    pub total_students: u64,
}

/// The full coverage relation for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSet {
    /// The radius the relation was computed under, in kilometers.
    pub radius_km: f64,
    /// Per-campus coverage, keyed by campus code.
    pub campuses: BTreeMap<String, CampusCoverage>,
}

impl CoverageSet {
    /// Total students in one campus's coverage, zero for unknown codes.
    #[must_use]
    pub fn total_students(&self, code: &str) -> u64 {
        self.campuses.get(code).map_or(0, |c| c.total_students)
    }
}

/// Classification of a single school site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedSchool {
    /// Display name (presentation label, not a key).
    pub name: String,
    /// School location.
    pub coord: Coordinate,
    /// Student count.
    pub students: u32,
    /// Covering campus codes, sorted.
    pub campuses: Vec<String>,
    /// Derived type; see [`SchoolType::from_campus_count`].
    pub school_type: SchoolType,
}

/// Classification of every covered school, keyed by site id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClassification {
    /// Per-school classification.
    pub schools: BTreeMap<SchoolSiteId, ClassifiedSchool>,
}

impl SchoolClassification {
    /// Number of exclusively-covered schools.
    #[must_use]
    pub fn exclusive_count(&self) -> usize {
        self.schools
            .values()
            .filter(|s| s.school_type == SchoolType::Exclusive)
            .count()
    }

    /// Number of shared (contested) schools.
    #[must_use]
    pub fn shared_count(&self) -> usize {
        self.schools
            .values()
            .filter(|s| s.school_type == SchoolType::Shared)
            .count()
    }

    /// Checks the safety invariant: every entry's type matches its
    /// covering-campus count and no entry has an empty campus set.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.schools
            .values()
            .all(|s| SchoolType::from_campus_count(s.campuses.len()) == Some(s.school_type))
    }

    /// Re-derives every entry's type from its campus set, dropping
    /// entries with no covering campus.
    ///
    /// Returns the number of corrected or dropped entries. A non-zero
    /// return indicates an upstream bug (e.g. a classification
    /// deserialized from stale data); callers log it loudly.
    pub fn enforce_invariant(&mut self) -> usize {
        let mut corrections = 0;

        self.schools
            .retain(|_, school| match SchoolType::from_campus_count(school.campuses.len()) {
                None => {
                    corrections += 1;
                    false
                }
                Some(expected) => {
                    if school.school_type != expected {
                        school.school_type = expected;
                        corrections += 1;
                    }
                    true
                }
            });

        corrections
    }
}

/// Outcome of auditing a previously computed classification against a
/// freshly derived one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    /// Entries present before but absent from the fresh classification.
    pub removed: usize,
    /// Entries whose type or campus set changed.
    pub reclassified: usize,
    /// Entries that matched exactly.
    pub unchanged: usize,
}

impl ReconcileStats {
    /// `true` when the two classifications agreed completely.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.removed == 0 && self.reclassified == 0
    }
}

/// Contested demand between one unordered pair of campuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapPair {
    /// First campus code (lexicographically smaller).
    pub campus_a: String,
    /// Second campus code.
    pub campus_b: String,
    /// Display names of the shared schools covered by both.
    pub schools: Vec<String>,
    /// Number of shared schools.
    pub school_count: usize,
    /// Sum of their student counts.
    pub total_students: u64,
}

/// Symmetric campus-by-campus matrix of contested student counts.
///
/// Off-diagonal cell `(i, j)` is the student sum over shared schools
/// covered by both campuses. The diagonal carries a different semantic:
/// cell `(i, i)` is campus `i`'s own total coverage students, not a
/// self-overlap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapMatrix {
    /// Campus codes in matrix order (sorted).
    pub codes: Vec<String>,
    /// Row-major `codes.len() x codes.len()` student counts.
    pub students: Vec<Vec<u64>>,
    /// Per-pair detail for every unordered pair of campuses (pairs with
    /// no shared schools carry empty lists).
    pub pairs: Vec<OverlapPair>,
}

impl OverlapMatrix {
    /// Cell lookup by campus code. Returns zero for unknown codes.
    #[must_use]
    pub fn cell(&self, code_a: &str, code_b: &str) -> u64 {
        let Some(i) = self.codes.iter().position(|c| c == code_a) else {
            return 0;
        };
        let Some(j) = self.codes.iter().position(|c| c == code_b) else {
            return 0;
        };
        self.students[i][j]
    }

    /// Detail for an unordered pair, if both codes are known.
    #[must_use]
    pub fn pair(&self, code_a: &str, code_b: &str) -> Option<&OverlapPair> {
        self.pairs.iter().find(|p| {
            (p.campus_a == code_a && p.campus_b == code_b)
                || (p.campus_a == code_b && p.campus_b == code_a)
        })
    }

    /// Whether the matrix is symmetric. Derivation guarantees it; tests
    /// assert it.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let n = self.codes.len();
        (0..n).all(|i| (0..n).all(|j| self.students[i][j] == self.students[j][i]))
    }
}

/// Utilization bands used by the recommendations sheet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UtilizationBand {
    /// Below 70% of capacity.
    Underutilized,
    /// 70% to 90%.
    Optimal,
    /// 90% to 100%.
    NearFull,
    /// Above capacity.
    Overflow,
}

impl UtilizationBand {
    /// Band for a utilization ratio (1.0 == at capacity).
    #[must_use]
    pub fn for_utilization(utilization: f64) -> Self {
        if utilization < 0.7 {
            Self::Underutilized
        } else if utilization < 0.9 {
            Self::Optimal
        } else if utilization <= 1.0 {
            Self::NearFull
        } else {
            Self::Overflow
        }
    }
}

/// Market sizing for one campus.
///
/// `addressable_market`, `tam`, `gap`, and `overflow` are truncated to
/// whole students at this boundary; `utilization` stays fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TamResult {
    /// Campus code.
    pub campus_code: String,
    /// Campus display name.
    pub campus_name: String,
    /// Students across every school in this campus's coverage.
    pub total_students: u64,
    /// Students at schools exclusive to this campus.
    pub exclusive_students: u64,
    /// Students at contested schools (`total - exclusive`).
    pub competition_students: u64,
    /// Number of exclusive schools in coverage.
    pub exclusive_schools: usize,
    /// Number of shared schools in coverage.
    pub shared_schools: usize,
    /// `exclusive + overlap_share * competition`, truncated.
    pub addressable_market: u64,
    /// `addressable_market * penetration_rate`, truncated.
    pub tam: u64,
    /// Campus capacity.
    pub capacity: u32,
    /// `tam / capacity`, or zero when capacity is zero.
    pub utilization: f64,
    /// Spare capacity: `max(0, capacity - tam)`.
    pub gap: u64,
    /// Demand beyond capacity: `max(0, tam - capacity)`.
    pub overflow: u64,
}

impl TamResult {
    /// Utilization band for the recommendations sheet.
    #[must_use]
    pub fn band(&self) -> UtilizationBand {
        UtilizationBand::for_utilization(self.utilization)
    }
}

/// Fleet-wide totals across every campus in the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TamSummary {
    /// Sum of per-campus TAM.
    pub total_tam: u64,
    /// Sum of per-campus capacity.
    pub total_capacity: u64,
    /// `total_tam / total_capacity`, or zero when capacity is zero.
    pub overall_utilization: f64,
}

/// Aggregate counts of per-record data-quality issues in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityReport {
    /// School rows excluded from all coverage for missing coordinates.
    pub schools_missing_coordinates: usize,
    /// Working-set campuses with no usable coordinate (cover nothing).
    pub campuses_missing_coordinates: usize,
    /// School rows whose student count fell back to the default.
    pub defaulted_student_counts: usize,
    /// Per-item campus selection issues.
    pub registry: RegistryReport,
}

/// The complete output of one analysis run.
///
/// Consumed read-only by the map and report renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRun {
    /// ISO 8601 timestamp of the run.
    pub generated_at: String,
    /// The configuration the run was computed under.
    pub config: AnalysisConfig,
    /// Resolved campus working set.
    pub campuses: Vec<Campus>,
    /// Coverage relation.
    pub coverage: CoverageSet,
    /// School classification.
    pub classification: SchoolClassification,
    /// Pairwise overlap matrix.
    pub overlap: OverlapMatrix,
    /// Market sizing per campus code.
    pub tam: BTreeMap<String, TamResult>,
    /// Fleet-wide totals.
    pub summary: TamSummary,
    /// Data-quality issue counts.
    pub quality: DataQualityReport,
    /// Outcome of the classification audit.
    pub reconcile: ReconcileStats,
    /// Enrolled students whose campus code matched the working set.
    pub enrolled_matched: u64,
    /// Total enrolled-student records loaded.
    pub enrolled_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(name: &str, campuses: &[&str], school_type: SchoolType) -> ClassifiedSchool {
        ClassifiedSchool {
            name: name.to_owned(),
            coord: Coordinate {
                lat: 10.0,
                lon: 106.0,
            },
            students: 500,
            campuses: campuses.iter().map(|&c| c.to_owned()).collect(),
            school_type,
        }
    }

    #[test]
    fn school_type_is_pure_function_of_campus_count() {
        assert_eq!(SchoolType::from_campus_count(0), None);
        assert_eq!(SchoolType::from_campus_count(1), Some(SchoolType::Exclusive));
        assert_eq!(SchoolType::from_campus_count(2), Some(SchoolType::Shared));
        assert_eq!(SchoolType::from_campus_count(7), Some(SchoolType::Shared));
    }

    #[test]
    fn enforce_invariant_corrects_mismatched_type() {
        let mut classification = SchoolClassification::default();
        // A shared label on a single-campus school: upstream bug.
        classification.schools.insert(
            SchoolSiteId(0),
            classified("A", &["HCM_GR"], SchoolType::Shared),
        );

        assert!(!classification.is_consistent());
        let corrections = classification.enforce_invariant();
        assert_eq!(corrections, 1);
        assert!(classification.is_consistent());
        assert_eq!(
            classification.schools[&SchoolSiteId(0)].school_type,
            SchoolType::Exclusive
        );
    }

    #[test]
    fn enforce_invariant_drops_uncovered_entries() {
        let mut classification = SchoolClassification::default();
        classification
            .schools
            .insert(SchoolSiteId(3), classified("B", &[], SchoolType::Exclusive));

        let corrections = classification.enforce_invariant();
        assert_eq!(corrections, 1);
        assert!(classification.schools.is_empty());
    }

    #[test]
    fn enforce_invariant_is_idempotent() {
        let mut classification = SchoolClassification::default();
        classification.schools.insert(
            SchoolSiteId(0),
            classified("A", &["HCM_GR", "HCM_TQB"], SchoolType::Exclusive),
        );

        assert_eq!(classification.enforce_invariant(), 1);
        let after_first = classification.clone();
        assert_eq!(classification.enforce_invariant(), 0);
        assert_eq!(classification, after_first);
    }

    #[test]
    fn utilization_bands_cover_boundaries() {
        assert_eq!(
            UtilizationBand::for_utilization(0.0),
            UtilizationBand::Underutilized
        );
        assert_eq!(UtilizationBand::for_utilization(0.7), UtilizationBand::Optimal);
        assert_eq!(UtilizationBand::for_utilization(0.9), UtilizationBand::NearFull);
        assert_eq!(UtilizationBand::for_utilization(1.0), UtilizationBand::NearFull);
        assert_eq!(UtilizationBand::for_utilization(1.01), UtilizationBand::Overflow);
    }

    #[test]
    fn overlap_cell_lookup_handles_unknown_codes() {
        let matrix = OverlapMatrix {
            codes: vec!["A".to_owned(), "B".to_owned()],
            students: vec![vec![100, 40], vec![40, 90]],
            pairs: Vec::new(),
        };
        assert_eq!(matrix.cell("A", "B"), 40);
        assert_eq!(matrix.cell("B", "A"), 40);
        assert_eq!(matrix.cell("A", "A"), 100);
        assert_eq!(matrix.cell("A", "Z"), 0);
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn classification_round_trips_through_json() {
        let mut classification = SchoolClassification::default();
        classification.schools.insert(
            SchoolSiteId(12),
            classified("Le Quy Don", &["HCM_GR", "HCM_TQB"], SchoolType::Shared),
        );

        let json = serde_json::to_string(&classification).unwrap();
        let back: SchoolClassification = serde_json::from_str(&json).unwrap();
        assert_eq!(back, classification);
    }
}
