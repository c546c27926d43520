//! Per-geography totals and the outer join of both datasets.

use std::collections::BTreeMap;

use migration_map_migration_models::{GeoAggregate, GeoKey, RawRecord};

/// Sums the metric of every record per full [`GeoKey`].
#[must_use]
pub fn totals_by_key(records: &[RawRecord]) -> BTreeMap<GeoKey, f64> {
    let mut totals: BTreeMap<GeoKey, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.key.clone()).or_default() += record.metric_value;
    }
    totals
}

/// Totals both datasets and outer-joins them on [`GeoKey`].
///
/// A geography present in only one dataset still yields a row, with the
/// other metric set to `0.0`. Rows are ordered by key.
#[must_use]
pub fn combine(enrolment: &[RawRecord], demographic: &[RawRecord]) -> Vec<GeoAggregate> {
    let mut joined: BTreeMap<GeoKey, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for (key, total) in totals_by_key(enrolment) {
        joined.entry(key).or_default().0 = Some(total);
    }
    for (key, total) in totals_by_key(demographic) {
        joined.entry(key).or_default().1 = Some(total);
    }

    let aggregates: Vec<GeoAggregate> = joined
        .into_iter()
        .map(|(key, (enrollments, demo_updates))| GeoAggregate {
            key,
            enrollments: enrollments.unwrap_or(0.0),
            demo_updates: demo_updates.unwrap_or(0.0),
        })
        .collect();

    log::info!("Aggregated {} geographies", aggregates.len());

    aggregates
}
