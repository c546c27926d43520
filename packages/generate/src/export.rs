//! Writes the scored dataset for the dashboard.
//!
//! The artifact is a single JSON array of [`OutputRecord`]s. It is written
//! to a sibling temporary file and renamed into place, so a reader never
//! sees a half-written dataset and a failed run leaves the previous one
//! untouched.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use migration_map_migration_models::OutputRecord;

use crate::GenerateError;

/// Serializes `records` as a JSON array to `path`, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns [`GenerateError::Io`] if the file cannot be created, written, or
/// moved into place, and [`GenerateError::Json`] if serialization fails.
pub fn write_dataset(path: &Path, records: &[OutputRecord]) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let tmp_path = temporary_path(path);
    let file = File::create(&tmp_path).map_err(|e| io_error(&tmp_path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, records)?;
    writer.flush().map_err(|e| io_error(&tmp_path, e))?;
    drop(writer);

    std::fs::rename(&tmp_path, path).map_err(|e| io_error(path, e))?;

    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> GenerateError {
    GenerateError::Io {
        path: path.to_path_buf(),
        source,
    }
}
