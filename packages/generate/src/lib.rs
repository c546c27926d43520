#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end migration pipeline.
//!
//! [`run`] loads the enrolment and demographic batch files, derives
//! per-pincode trends, joins both datasets per geography, places each
//! geography on the map, scores it, and writes the dashboard dataset.
//!
//! Unusable input files are skipped and reported in
//! [`RunReport::diagnostics`]. The coordinate reference table is the only
//! hard dependency: if it cannot be loaded the run fails and nothing is
//! written.

pub mod export;

use std::path::PathBuf;
use std::sync::Arc;

use migration_map_analytics::aggregate::combine;
use migration_map_analytics::score::score_records;
use migration_map_analytics::summary::RunSummary;
use migration_map_analytics::trend::analyze_trends;
use migration_map_geography::GeoError;
use migration_map_geography::coordinates::{CoordinateSource, CoordinateTable};
use migration_map_geography::enrich::enrich;
use migration_map_migration_models::Diagnostic;
use migration_map_source::SourceError;
use migration_map_source::dataset_def::DatasetDefinition;
use migration_map_source::loader::load_dataset;
use migration_map_source::progress::{ProgressCallback, null_progress};
use migration_map_source::registry::{DEMOGRAPHIC, ENROLMENT, dataset};

/// Directory scanned for batch files when none is given.
pub const DEFAULT_INPUT_DIR: &str = "raw_data";

/// Where the dashboard expects its dataset.
pub const DEFAULT_OUTPUT_PATH: &str = "dashboard/src/assets/dashboard_data.json";

/// Errors that abort a run.
///
/// Problems with individual input files are not errors; they are reported
/// as diagnostics on the [`RunReport`].
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// A built-in dataset definition could not be resolved.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The coordinate reference table could not be loaded.
    #[error("geographic enrichment unavailable: {0}")]
    Coordinates(#[from] GeoError),

    /// The output dataset could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output dataset could not be serialized.
    #[error("cannot serialize output dataset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Inputs and outputs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateConfig {
    /// Directory holding the enrolment and demographic batch files.
    pub input_dir: PathBuf,
    /// Path of the JSON dataset to write.
    pub output_path: PathBuf,
    pub coordinates: CoordinateSource,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            coordinates: CoordinateSource::default(),
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadEnrolment,
    LoadDemographic,
    Trends,
    Aggregate,
    Enrich,
    Score,
    Export,
}

impl Stage {
    pub const ALL: [Self; 7] = [
        Self::LoadEnrolment,
        Self::LoadDemographic,
        Self::Trends,
        Self::Aggregate,
        Self::Enrich,
        Self::Score,
        Self::Export,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LoadEnrolment => "Loading enrolment data",
            Self::LoadDemographic => "Loading demographic data",
            Self::Trends => "Analyzing trends",
            Self::Aggregate => "Aggregating geographies",
            Self::Enrich => "Enriching with coordinates",
            Self::Score => "Scoring",
            Self::Export => "Exporting",
        }
    }
}

/// Builds the progress reporter for one dataset's file loading.
pub type FilesProgress =
    Box<dyn Fn(&DatasetDefinition) -> Arc<dyn ProgressCallback> + Send + Sync>;

/// Where a run reports its progress.
pub struct RunProgress {
    /// Advanced once per [`Stage`].
    pub stages: Arc<dyn ProgressCallback>,
    /// Called once per dataset before its files are read.
    pub files: FilesProgress,
}

impl Default for RunProgress {
    fn default() -> Self {
        Self {
            stages: null_progress(),
            files: Box::new(|_| null_progress()),
        }
    }
}

impl RunProgress {
    fn begin(&self, stage: Stage) {
        log::info!("{}...", stage.label());
        self.stages.set_message(stage.label().to_string());
    }

    fn end(&self) {
        self.stages.inc(1);
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub records_written: usize,
    /// Input files (or directories) that were skipped.
    pub diagnostics: Vec<Diagnostic>,
    /// Aggregated geographies dropped for lack of any coordinate.
    pub dropped_geographies: usize,
    pub summary: RunSummary,
}

/// Runs the full pipeline described by `config`.
///
/// # Errors
///
/// Returns [`GenerateError::Coordinates`] if the coordinate reference table
/// cannot be loaded, and [`GenerateError::Io`] or [`GenerateError::Json`] if
/// the output cannot be written. The output file is left untouched in every
/// error case.
pub async fn run(
    config: &GenerateConfig,
    progress: &RunProgress,
) -> Result<RunReport, GenerateError> {
    progress.stages.set_total(Stage::ALL.len() as u64);

    let enrolment_def = dataset(ENROLMENT)?;
    let demographic_def = dataset(DEMOGRAPHIC)?;

    progress.begin(Stage::LoadEnrolment);
    let enrolment = load_dataset(
        &config.input_dir,
        &enrolment_def,
        &(progress.files)(&enrolment_def),
    );
    progress.end();

    progress.begin(Stage::LoadDemographic);
    let demographic = load_dataset(
        &config.input_dir,
        &demographic_def,
        &(progress.files)(&demographic_def),
    );
    progress.end();

    if enrolment.is_empty() && demographic.is_empty() {
        log::warn!("No usable rows in {}", config.input_dir.display());
    }

    progress.begin(Stage::Trends);
    let trends = analyze_trends(&demographic.records);
    progress.end();

    progress.begin(Stage::Aggregate);
    let aggregates = combine(&enrolment.records, &demographic.records);
    progress.end();

    progress.begin(Stage::Enrich);
    let table = CoordinateTable::load(&config.coordinates).await?;
    let enrichment = enrich(aggregates, &table);
    progress.end();

    progress.begin(Stage::Score);
    let records = score_records(enrichment.records, &trends);
    let summary = RunSummary::from_records(&records);
    progress.end();

    progress.begin(Stage::Export);
    export::write_dataset(&config.output_path, &records)?;
    progress.end();

    let mut diagnostics = enrolment.diagnostics;
    diagnostics.extend(demographic.diagnostics);

    progress
        .stages
        .finish(format!("{} records written", records.len()));
    summary.log();
    log_diagnostics(&diagnostics);

    Ok(RunReport {
        output_path: config.output_path.clone(),
        records_written: records.len(),
        diagnostics,
        dropped_geographies: enrichment.dropped,
        summary,
    })
}

fn log_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    log::warn!("{} inputs were skipped:", diagnostics.len());
    for d in diagnostics {
        log::warn!("  [{}] {} ({}): {}", d.dataset, d.path, d.severity, d.message);
    }
}
