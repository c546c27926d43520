#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types shared by every stage of the migration pipeline.
//!
//! Records flow strictly forward: [`RawRecord`]s from the batch loader are
//! collapsed into [`GeoAggregate`]s, placed on the map as
//! [`EnrichedRecord`]s, and finally scored into [`OutputRecord`]s. Each stage
//! owns the collection it produces.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Composite geography identity.
///
/// Ordering is `(pincode, state, district)`, which is also the order rows
/// appear in the exported dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeoKey {
    /// Bare digit-string postal code.
    pub pincode: String,
    /// State name as it appears in the batch file.
    pub state: String,
    /// District name as it appears in the batch file.
    pub district: String,
}

impl GeoKey {
    #[must_use]
    pub fn new(
        pincode: impl Into<String>,
        state: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        Self {
            pincode: pincode.into(),
            state: state.into(),
            district: district.into(),
        }
    }

    /// The `(state, district)` pair used for coordinate backfill.
    #[must_use]
    pub fn district_group(&self) -> (&str, &str) {
        (&self.state, &self.district)
    }
}

/// One normalized row from a batch file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// `None` when the source date could not be parsed. Such rows still
    /// count towards totals but not towards monthly trends.
    pub date: Option<NaiveDate>,
    pub key: GeoKey,
    /// Row-wise sum of the dataset's metric columns. Never negative.
    pub metric_value: f64,
}

/// A calendar month, e.g. `2025-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based month number.
    pub month: u32,
}

impl YearMonth {
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Truncates a date to its calendar month.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Direction of the most recent month-over-month change in demographic
/// updates for a pincode.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum TrendLabel {
    /// Latest month's total exceeded the previous month's.
    Up,
    /// Latest month's total did not exceed the previous month's, or there
    /// is no previous month to compare against.
    Down,
    /// No demographic activity was observed for the pincode.
    #[default]
    Stable,
}

/// Trend labels keyed by pincode.
///
/// Produced by the trend analyzer and handed to the scorer by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendMap(BTreeMap<String, TrendLabel>);

impl TrendMap {
    #[must_use]
    pub const fn new(labels: BTreeMap<String, TrendLabel>) -> Self {
        Self(labels)
    }

    /// Label for `pincode`, or [`TrendLabel::Stable`] when the pincode had no
    /// demographic data.
    #[must_use]
    pub fn label_for(&self, pincode: &str) -> TrendLabel {
        self.0.get(pincode).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TrendLabel)> {
        self.0.iter()
    }
}

/// Per-geography totals after the outer join of both datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoAggregate {
    pub key: GeoKey,
    /// Enrollment total; `0.0` when the geography only appeared in the
    /// demographic dataset.
    pub enrollments: f64,
    /// Demographic update total; `0.0` when the geography only appeared in
    /// the enrollment dataset.
    pub demo_updates: f64,
}

/// Latitude/longitude pair where either axis may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coordinate {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Coordinate {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

/// A [`GeoAggregate`] placed on the map.
///
/// Produced by the geo enricher; both axes are guaranteed present on every
/// record that leaves enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub aggregate: GeoAggregate,
    pub lat: f64,
    pub lng: f64,
}

/// One row of the exported dataset.
///
/// Field order and names are the wire format consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub pincode: String,
    pub state: String,
    pub district: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "Enrollments")]
    pub enrollments: f64,
    #[serde(rename = "Demo_Updates")]
    pub demo_updates: f64,
    #[serde(rename = "Migration_Score")]
    pub migration_score: f64,
    /// Migration score normalized to `[0, 1]`.
    #[serde(rename = "Intensity")]
    pub intensity: f64,
    #[serde(rename = "Trend")]
    pub trend: TrendLabel,
}

/// How a reported problem affects the run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    /// The affected input was skipped and the run continued.
    Recoverable,
    /// The run was aborted.
    Fatal,
}

/// A problem encountered while loading input, returned alongside the data
/// that did load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Dataset identifier (e.g. `"enrolment"`).
    pub dataset: String,
    /// File or directory the problem relates to.
    pub path: String,
    pub severity: Severity,
    pub message: String,
}
