#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Builds the migration dashboard dataset from Aadhaar batch files.
//!
//! With no arguments, reads `raw_data/`, downloads the public pincode
//! coordinate table, and writes `dashboard/src/assets/dashboard_data.json`.

use std::path::PathBuf;

use clap::Parser;
use migration_map_cli_utils::IndicatifProgress;
use migration_map_geography::coordinates::{CoordinateSource, DEFAULT_COORDINATES_URL};
use migration_map_generate::{
    DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_PATH, GenerateConfig, RunProgress,
};

#[derive(Parser)]
#[command(
    name = "migration_map_generate",
    about = "Score pincode migration from Aadhaar enrolment and update batches"
)]
struct Cli {
    /// Directory containing the enrolment and demographic CSV batches
    #[arg(long, default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// Path of the JSON dataset to write
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Coordinate table to use: an http(s) URL or a local CSV path
    #[arg(long, default_value = DEFAULT_COORDINATES_URL)]
    coordinates: CoordinateSource,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = migration_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = GenerateConfig {
        input_dir: cli.input_dir,
        output_path: cli.output,
        coordinates: cli.coordinates,
    };

    let files_multi = multi.clone();
    let progress = RunProgress {
        stages: IndicatifProgress::stages_bar(&multi, "Pipeline"),
        files: Box::new(move |definition| {
            IndicatifProgress::files_bar(&files_multi, &definition.name)
        }),
    };

    let report = migration_map_generate::run(&config, &progress).await?;

    log::info!(
        "DONE: {} records written to {}",
        report.records_written,
        report.output_path.display()
    );
    if !report.diagnostics.is_empty() {
        log::warn!(
            "{} input files were skipped; see warnings above",
            report.diagnostics.len()
        );
    }

    Ok(())
}
