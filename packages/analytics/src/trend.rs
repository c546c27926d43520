//! Month-over-month trend detection on demographic updates.

use std::collections::BTreeMap;

use migration_map_migration_models::{RawRecord, TrendLabel, TrendMap, YearMonth};

/// Demographic update total for one pincode in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    pub pincode: String,
    pub month: YearMonth,
    pub total: f64,
}

/// Groups dated records by `(pincode, month)` and sums their metric.
///
/// Records without a date are skipped. The result is ordered by pincode,
/// then by month ascending.
#[must_use]
pub fn monthly_aggregates(records: &[RawRecord]) -> Vec<MonthlyAggregate> {
    let mut totals: BTreeMap<(&str, YearMonth), f64> = BTreeMap::new();

    for record in records {
        let Some(date) = record.date else {
            continue;
        };
        *totals
            .entry((record.key.pincode.as_str(), YearMonth::of(date)))
            .or_default() += record.metric_value;
    }

    totals
        .into_iter()
        .map(|((pincode, month), total)| MonthlyAggregate {
            pincode: pincode.to_string(),
            month,
            total,
        })
        .collect()
}

/// Labels a pincode's month-ordered totals by the sign of the latest
/// month-over-month difference.
///
/// A single month has no difference and resolves to [`TrendLabel::Down`],
/// as does a zero difference.
#[must_use]
pub fn trend_label(totals: &[f64]) -> TrendLabel {
    match totals {
        [.., previous, latest] if latest - previous > 0.0 => TrendLabel::Up,
        _ => TrendLabel::Down,
    }
}

/// Derives a trend label for every pincode with at least one dated
/// demographic record.
#[must_use]
pub fn analyze_trends(demographic: &[RawRecord]) -> TrendMap {
    let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    // `monthly_aggregates` is already ordered by (pincode, month).
    for aggregate in monthly_aggregates(demographic) {
        series
            .entry(aggregate.pincode)
            .or_default()
            .push(aggregate.total);
    }

    let labels: BTreeMap<String, TrendLabel> = series
        .into_iter()
        .map(|(pincode, totals)| {
            let label = trend_label(&totals);
            (pincode, label)
        })
        .collect();

    log::info!("Trends detected: {}", labels.len());

    TrendMap::new(labels)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use migration_map_migration_models::GeoKey;

    use super::*;

    fn record(pincode: &str, date: Option<(i32, u32, u32)>, value: f64) -> RawRecord {
        RawRecord {
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            key: GeoKey::new(pincode, "Delhi", "New Delhi"),
            metric_value: value,
        }
    }

    #[test]
    fn rising_totals_are_up() {
        let records = [
            record("110001", Some((2025, 1, 5)), 100.0),
            record("110001", Some((2025, 2, 5)), 150.0),
        ];
        assert_eq!(analyze_trends(&records).label_for("110001"), TrendLabel::Up);
    }

    #[test]
    fn falling_totals_are_down() {
        let records = [
            record("110001", Some((2025, 1, 5)), 150.0),
            record("110001", Some((2025, 2, 5)), 100.0),
        ];
        assert_eq!(
            analyze_trends(&records).label_for("110001"),
            TrendLabel::Down
        );
    }

    #[test]
    fn single_month_is_down() {
        let records = [record("110001", Some((2025, 1, 5)), 150.0)];
        assert_eq!(
            analyze_trends(&records).label_for("110001"),
            TrendLabel::Down
        );
    }

    #[test]
    fn flat_totals_are_down() {
        assert_eq!(trend_label(&[100.0, 100.0]), TrendLabel::Down);
        assert_eq!(trend_label(&[]), TrendLabel::Down);
    }

    #[test]
    fn only_the_latest_difference_counts() {
        assert_eq!(trend_label(&[10.0, 500.0, 20.0, 30.0]), TrendLabel::Up);
        assert_eq!(trend_label(&[10.0, 20.0, 30.0, 5.0]), TrendLabel::Down);
    }

    #[test]
    fn months_are_ordered_regardless_of_input_order() {
        let records = [
            record("110001", Some((2025, 2, 1)), 100.0),
            record("110001", Some((2024, 12, 31)), 40.0),
            record("110001", Some((2025, 1, 15)), 150.0),
        ];
        // Dec 40 -> Jan 150 -> Feb 100: latest change is a decrease.
        assert_eq!(
            analyze_trends(&records).label_for("110001"),
            TrendLabel::Down
        );
    }

    #[test]
    fn same_month_rows_are_summed_and_undated_rows_ignored() {
        let records = [
            record("110001", Some((2025, 1, 1)), 60.0),
            record("110001", Some((2025, 1, 20)), 60.0),
            record("110001", None, 1_000.0),
            record("110001", Some((2025, 2, 3)), 100.0),
        ];
        let monthly = monthly_aggregates(&records);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].month, YearMonth::new(2025, 1));
        assert!((monthly[0].total - 120.0).abs() < f64::EPSILON);
        assert_eq!(
            analyze_trends(&records).label_for("110001"),
            TrendLabel::Down
        );
    }

    #[test]
    fn pincodes_without_dated_rows_have_no_label() {
        let records = [
            record("110001", None, 10.0),
            record("110002", Some((2025, 1, 1)), 10.0),
        ];
        let trends = analyze_trends(&records);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends.label_for("110001"), TrendLabel::Stable);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(analyze_trends(&[]).is_empty());
    }
}
