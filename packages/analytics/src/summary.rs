//! Headline figures for a scored dataset.

use std::collections::BTreeSet;

use migration_map_migration_models::{OutputRecord, TrendLabel};

/// Intensity at or above which a geography counts as a hotspot.
pub const HOTSPOT_INTENSITY: f64 = 0.1;

/// Migration score above which a geography counts as a critical zone.
pub const CRITICAL_SCORE: f64 = 20.0;

/// Aggregate view of one run's output, logged at the end of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub hotspots: usize,
    pub critical_zones: usize,
    /// Distinct states containing at least one hotspot.
    pub flagged_states: usize,
    /// Hotspots as a percentage of all records.
    pub anomaly_rate: f64,
    /// District of the record with the highest migration score.
    pub top_district: Option<String>,
    pub up: usize,
    pub down: usize,
    pub stable: usize,
}

impl RunSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[OutputRecord]) -> Self {
        let hotspots: Vec<&OutputRecord> = records
            .iter()
            .filter(|r| r.intensity >= HOTSPOT_INTENSITY)
            .collect();

        let flagged_states: BTreeSet<&str> = hotspots.iter().map(|r| r.state.as_str()).collect();

        // First record wins ties.
        let top = records.iter().fold(None::<&OutputRecord>, |best, r| match best {
            Some(b) if b.migration_score >= r.migration_score => Some(b),
            _ => Some(r),
        });

        let count = |label: TrendLabel| records.iter().filter(|r| r.trend == label).count();

        let anomaly_rate = if records.is_empty() {
            0.0
        } else {
            hotspots.len() as f64 / records.len() as f64 * 100.0
        };

        Self {
            records: records.len(),
            hotspots: hotspots.len(),
            critical_zones: records
                .iter()
                .filter(|r| r.migration_score > CRITICAL_SCORE)
                .count(),
            flagged_states: flagged_states.len(),
            anomaly_rate,
            top_district: top.map(|r| r.district.clone()),
            up: count(TrendLabel::Up),
            down: count(TrendLabel::Down),
            stable: count(TrendLabel::Stable),
        }
    }

    pub fn log(&self) {
        log::info!(
            "{} geographies: {} hotspots ({:.1}%) across {} states, {} critical zones",
            self.records,
            self.hotspots,
            self.anomaly_rate,
            self.flagged_states,
            self.critical_zones
        );
        log::info!(
            "Trends: {} up, {} down, {} stable",
            self.up,
            self.down,
            self.stable
        );
        if let Some(district) = &self.top_district {
            log::info!("Highest migration score: {district}");
        }
    }
}
