#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch file loading for the enrolment and demographic datasets.
//!
//! Each logical dataset is described by a [`DatasetDefinition`] embedded
//! from TOML. The [`loader`] finds every batch file whose name contains the
//! dataset's keyword, reduces each row to a [`RawRecord`] and reports files
//! it could not use as recoverable [`Diagnostic`]s instead of aborting.
//!
//! [`DatasetDefinition`]: dataset_def::DatasetDefinition
//! [`RawRecord`]: migration_map_migration_models::RawRecord
//! [`Diagnostic`]: migration_map_migration_models::Diagnostic

pub mod dataset_def;
pub mod loader;
pub mod parsing;
pub mod progress;
pub mod registry;

use std::path::PathBuf;

use migration_map_migration_models::Severity;

/// Errors that can occur while discovering batch files or reading dataset
/// definitions.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error (directory listing).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset definition could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// No dataset with the requested id is registered.
    #[error("Unknown dataset: {id}")]
    UnknownDataset {
        /// The id that was looked up.
        id: String,
    },
}

/// Reasons a single batch file was skipped.
///
/// A file failure never aborts a run; see [`FileError::severity`].
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The file could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not well-formed CSV.
    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header row lacks columns the dataset requires.
    #[error("{} is missing required columns: {}", path.display(), missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
}

impl FileError {
    /// Path of the file that failed.
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. } | Self::Csv { path, .. } | Self::MissingColumns { path, .. } => {
                path
            }
        }
    }

    /// File failures only ever cost the affected file.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        Severity::Recoverable
    }
}
