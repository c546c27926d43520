//! Joins aggregated geographies onto the coordinate table.
//!
//! A geography takes its coordinate from the table by pincode. Where an
//! axis is still missing, it receives the mean of that axis over the
//! geographies in the same `(state, district)` that do have one. Geographies
//! left without both axes cannot be drawn and are dropped.

use std::collections::BTreeMap;

use migration_map_migration_models::{Coordinate, EnrichedRecord, GeoAggregate};

use crate::coordinates::CoordinateTable;

/// Enriched records plus counts describing how they were placed.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub records: Vec<EnrichedRecord>,
    /// Rows whose coordinate came entirely from the table.
    pub direct: usize,
    /// Rows that needed at least one axis from their district mean.
    pub backfilled: usize,
    /// Rows dropped because no coordinate could be found.
    pub dropped: usize,
}

/// Running per-axis mean.
#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

/// Places every aggregate on the map, preserving input order.
#[must_use]
pub fn enrich(aggregates: Vec<GeoAggregate>, table: &CoordinateTable) -> Enrichment {
    let joined: Vec<(GeoAggregate, Coordinate)> = aggregates
        .into_iter()
        .map(|aggregate| {
            let coordinate = table.get(&aggregate.key.pincode).unwrap_or_default();
            (aggregate, coordinate)
        })
        .collect();

    let mut district_means: BTreeMap<(&str, &str), (Mean, Mean)> = BTreeMap::new();
    for (aggregate, coordinate) in &joined {
        let (lat, lng) = district_means
            .entry(aggregate.key.district_group())
            .or_default();
        lat.add(coordinate.lat);
        lng.add(coordinate.lng);
    }
    let row_means: Vec<(Option<f64>, Option<f64>)> = joined
        .iter()
        .map(|(aggregate, _)| {
            district_means
                .get(&aggregate.key.district_group())
                .map_or((None, None), |(lat, lng)| (lat.value(), lng.value()))
        })
        .collect();

    let mut enrichment = Enrichment::default();

    for ((aggregate, coordinate), (mean_lat, mean_lng)) in joined.into_iter().zip(row_means) {
        let lat = coordinate.lat.or(mean_lat);
        let lng = coordinate.lng.or(mean_lng);

        let (Some(lat), Some(lng)) = (lat, lng) else {
            log::debug!(
                "No coordinate for {} ({}, {})",
                aggregate.key.pincode,
                aggregate.key.district,
                aggregate.key.state
            );
            enrichment.dropped += 1;
            continue;
        };

        if coordinate.is_complete() {
            enrichment.direct += 1;
        } else {
            enrichment.backfilled += 1;
        }
        enrichment.records.push(EnrichedRecord {
            aggregate,
            lat,
            lng,
        });
    }

    log::info!(
        "Placed {} geographies ({} direct, {} from district means), dropped {} without coordinates",
        enrichment.records.len(),
        enrichment.direct,
        enrichment.backfilled,
        enrichment.dropped
    );

    enrichment
}
