//! Migration score and intensity.
//!
//! The migration score is the ratio of demographic updates to smoothed
//! enrollments. Intensity rescales it against the 99th percentile of all
//! scores so that a handful of extreme geographies do not wash out the map.

use migration_map_migration_models::{EnrichedRecord, OutputRecord, TrendMap};

/// Added to enrollments before dividing, so geographies with almost no
/// enrollments do not produce runaway scores.
pub const ENROLLMENT_SMOOTHING: f64 = 50.0;

/// Quantile of the score distribution that maps to intensity `1.0`.
pub const INTENSITY_QUANTILE: f64 = 0.99;

/// `demo_updates / (enrollments + ENROLLMENT_SMOOTHING)`.
#[must_use]
pub fn migration_score(enrollments: f64, demo_updates: f64) -> f64 {
    demo_updates / (enrollments + ENROLLMENT_SMOOTHING)
}

/// Quantile `q` (in `[0, 1]`) of `values` with linear interpolation between
/// the closest ranks. Non-finite values are ignored; returns `None` when
/// nothing is left.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - rank.floor();

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Divisor used to normalize scores into intensities.
///
/// The [`INTENSITY_QUANTILE`] of `scores`, or `1.0` when there are no scores
/// or the quantile is zero.
#[must_use]
pub fn normalization_bound(scores: &[f64]) -> f64 {
    match quantile(scores, INTENSITY_QUANTILE) {
        Some(bound) if bound != 0.0 => bound,
        _ => 1.0,
    }
}

/// `score / bound`, capped at `1.0`.
#[must_use]
pub fn intensity(score: f64, bound: f64) -> f64 {
    (score / bound).min(1.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Scores every enriched record and attaches its trend label.
///
/// Pincodes missing from `trends` are labelled
/// [`TrendLabel::Stable`](migration_map_migration_models::TrendLabel::Stable).
/// Any non-finite metric left at the end is written out as `0.0`.
#[must_use]
pub fn score_records(records: Vec<EnrichedRecord>, trends: &TrendMap) -> Vec<OutputRecord> {
    let scores: Vec<f64> = records
        .iter()
        .map(|r| migration_score(r.aggregate.enrollments, r.aggregate.demo_updates))
        .collect();

    let bound = normalization_bound(&scores);
    log::debug!("Intensity bound (p99 migration score): {bound}");

    records
        .into_iter()
        .zip(scores)
        .map(|(record, score)| {
            let trend = trends.label_for(&record.aggregate.key.pincode);
            let aggregate = record.aggregate;
            OutputRecord {
                pincode: aggregate.key.pincode,
                state: aggregate.key.state,
                district: aggregate.key.district,
                lat: record.lat,
                lng: record.lng,
                enrollments: finite_or_zero(aggregate.enrollments),
                demo_updates: finite_or_zero(aggregate.demo_updates),
                migration_score: finite_or_zero(score),
                intensity: finite_or_zero(intensity(score, bound)),
                trend,
            }
        })
        .collect()
}
