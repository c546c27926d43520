#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Places aggregated geographies on the map.
//!
//! Loads the public pincode coordinate table (over HTTP or from a local
//! copy), joins it onto the aggregated geographies, and backfills missing
//! coordinates with the mean of the surrounding district. The coordinate
//! table is a hard dependency: any failure to load it is fatal to a run.

pub mod coordinates;
pub mod enrich;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading the coordinate reference table.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Download of the coordinate table failed.
    #[error("coordinate table download failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local coordinate table could not be read.
    #[error("cannot read coordinate table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Coordinate table is not valid CSV.
    #[error("coordinate table is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Coordinate table lacks a key, latitude, or longitude column.
    #[error("coordinate table has no {column} column (expected one of: {})", candidates.join(", "))]
    MissingColumn {
        /// Role of the missing column (`"key"`, `"latitude"`, `"longitude"`).
        column: &'static str,
        /// Header names accepted for that role.
        candidates: &'static [&'static str],
    },
}
