//! Reads every batch file of one dataset into normalized [`RawRecord`]s.
//!
//! Files are processed independently: a file that cannot be opened, is not
//! valid CSV, or lacks a required column is skipped and reported as a
//! recoverable [`Diagnostic`]. Rows keep their place even when their date
//! does not parse; only rows without a usable pincode are dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use migration_map_migration_models::{Diagnostic, GeoKey, RawRecord, Severity};

use crate::dataset_def::DatasetDefinition;
use crate::parsing::{normalize_pincode, parse_day_first_date, parse_metric};
use crate::progress::ProgressCallback;
use crate::{FileError, SourceError};

/// Outcome of reading one batch file.
pub type FileResult = Result<Vec<RawRecord>, FileError>;

/// Everything loaded for one dataset, plus the files that were skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    /// Dataset identifier.
    pub dataset: String,
    /// Rows from every file that loaded, in file order.
    pub records: Vec<RawRecord>,
    /// One entry per skipped file (or unreadable input directory).
    pub diagnostics: Vec<Diagnostic>,
    /// Number of files that contributed rows.
    pub files_loaded: usize,
}

impl LoadedDataset {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Column positions resolved from a file's header row.
struct ColumnIndexes {
    date: usize,
    state: usize,
    district: usize,
    pincode: usize,
    sums: Vec<usize>,
}

impl ColumnIndexes {
    fn resolve(
        headers: &csv::StringRecord,
        definition: &DatasetDefinition,
        path: &Path,
    ) -> Result<Self, FileError> {
        let headers: Vec<&str> = headers.iter().map(str::trim).collect();
        let find = |name: &str| headers.iter().position(|h| *h == name);

        let missing: Vec<String> = definition
            .required_columns()
            .into_iter()
            .filter(|name| find(name).is_none())
            .map(str::to_string)
            .collect();

        let (Some(date), Some(state), Some(district), Some(pincode)) = (
            find(&definition.columns.date),
            find(&definition.columns.state),
            find(&definition.columns.district),
            find(&definition.columns.pincode),
        ) else {
            return Err(FileError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        };

        if !missing.is_empty() {
            return Err(FileError::MissingColumns {
                path: path.to_path_buf(),
                missing,
            });
        }

        let sums: Vec<usize> = definition
            .sum_columns
            .iter()
            .filter_map(|name| find(name))
            .collect();

        Ok(Self {
            date,
            state,
            district,
            pincode,
            sums,
        })
    }
}

/// Lists the batch files of `definition` in `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the directory cannot be listed.
pub fn discover_batch_files(
    dir: &Path,
    definition: &DatasetDefinition,
) -> Result<Vec<PathBuf>, SourceError> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if definition.matches_file_name(&name.to_string_lossy()) {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Reads one batch file and reduces each row to a [`RawRecord`].
///
/// # Errors
///
/// Returns a [`FileError`] if the file cannot be read, is malformed, or is
/// missing a required column. No rows from a failed file are returned.
pub fn read_batch_file(path: &Path, definition: &DatasetDefinition) -> FileResult {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let columns = ColumnIndexes::resolve(&headers, definition, path)?;

    let mut records = Vec::new();
    let mut dropped: u64 = 0;

    for result in reader.records() {
        let row = result.map_err(|e| csv_error(path, e))?;
        let cell = |i: usize| row.get(i).unwrap_or("");

        let Some(pincode) = normalize_pincode(cell(columns.pincode)) else {
            log::debug!("{}: row without pincode: {row:?}", path.display());
            dropped += 1;
            continue;
        };

        let metric_value = columns.sums.iter().map(|&i| parse_metric(cell(i))).sum();

        records.push(RawRecord {
            date: parse_day_first_date(cell(columns.date)),
            key: GeoKey::new(
                pincode,
                cell(columns.state).trim(),
                cell(columns.district).trim(),
            ),
            metric_value,
        });
    }

    if dropped > 0 {
        log::warn!(
            "{}: dropped {dropped} rows without a usable pincode",
            path.display()
        );
    }

    Ok(records)
}

/// `csv` folds I/O failures into its own error type; split them back out so
/// diagnostics say whether the file was unreadable or malformed.
fn csv_error(path: &Path, error: csv::Error) -> FileError {
    if error.is_io_error() {
        FileError::Io {
            path: path.to_path_buf(),
            source: error.into(),
        }
    } else {
        FileError::Csv {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

/// Lazily reads the batch files of one dataset.
pub struct DatasetLoader<'a> {
    definition: &'a DatasetDefinition,
    files: Vec<PathBuf>,
}

impl<'a> DatasetLoader<'a> {
    /// Finds the dataset's batch files in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the directory cannot be listed.
    pub fn discover(dir: &Path, definition: &'a DatasetDefinition) -> Result<Self, SourceError> {
        Ok(Self {
            definition,
            files: discover_batch_files(dir, definition)?,
        })
    }

    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Yields each file with its result; a file is read only when the
    /// iterator reaches it.
    pub fn batches(&self) -> impl Iterator<Item = (&Path, FileResult)> + '_ {
        self.files
            .iter()
            .map(|path| (path.as_path(), read_batch_file(path, self.definition)))
    }
}

/// Loads every batch file of `definition` found in `dir`.
///
/// Never fails: unreadable directories and files are reported in
/// [`LoadedDataset::diagnostics`], and a dataset with no usable files is
/// simply empty.
#[must_use]
pub fn load_dataset(
    dir: &Path,
    definition: &DatasetDefinition,
    progress: &Arc<dyn ProgressCallback>,
) -> LoadedDataset {
    log::info!("Processing {} data...", definition.id);

    let mut dataset = LoadedDataset {
        dataset: definition.id.clone(),
        ..LoadedDataset::default()
    };

    let loader = match DatasetLoader::discover(dir, definition) {
        Ok(loader) => loader,
        Err(e) => {
            log::warn!("[{}] cannot list {}: {e}", definition.id, dir.display());
            dataset.diagnostics.push(Diagnostic {
                dataset: definition.id.clone(),
                path: dir.display().to_string(),
                severity: Severity::Recoverable,
                message: e.to_string(),
            });
            progress.finish(format!("[{}] no input directory", definition.id));
            return dataset;
        }
    };

    progress.set_total(loader.files().len() as u64);
    progress.set_message(format!("Loading {}", definition.name));

    for (path, result) in loader.batches() {
        match result {
            Ok(records) => {
                log::info!(
                    "[{}] {}: {} rows",
                    definition.id,
                    path.display(),
                    records.len()
                );
                dataset.records.extend(records);
                dataset.files_loaded += 1;
            }
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                dataset.diagnostics.push(Diagnostic {
                    dataset: definition.id.clone(),
                    path: e.path().display().to_string(),
                    severity: e.severity(),
                    message: e.to_string(),
                });
            }
        }
        progress.inc(1);
    }

    log::info!(
        "[{}] loaded {} rows from {}/{} files",
        definition.id,
        dataset.records.len(),
        dataset.files_loaded,
        loader.files().len()
    );
    progress.finish(format!(
        "[{}] {} rows from {} files",
        definition.id,
        dataset.records.len(),
        dataset.files_loaded
    ));

    dataset
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::progress::null_progress;
    use crate::registry::{DEMOGRAPHIC, ENROLMENT, dataset};

    const ENROLMENT_HEADER: &str = "date,state,district,pincode,age_0_5,age_5_17,age_18_greater";

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("migration_map_loader_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_and_sums_metric_columns() {
        let dir = fixture_dir("sums");
        let path = dir.join("api_data_enrolment_0.csv");
        std::fs::write(
            &path,
            format!(
                "{ENROLMENT_HEADER}\n\
                 01-03-2025,Delhi,New Delhi,110001.0,1,2,3\n\
                 bad-date,Delhi,New Delhi,110001,4,,5\n"
            ),
        )
        .unwrap();

        let def = dataset(ENROLMENT).unwrap();
        let records = read_batch_file(&path, &def).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, GeoKey::new("110001", "Delhi", "New Delhi"));
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!((records[0].metric_value - 6.0).abs() < f64::EPSILON);
        assert_eq!(records[1].date, None);
        assert!((records[1].metric_value - 9.0).abs() < f64::EPSILON);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn extra_columns_are_ignored_and_order_does_not_matter() {
        let dir = fixture_dir("reordered");
        let path = dir.join("demographic.csv");
        std::fs::write(
            &path,
            "pincode,extra,demo_age_17_,district,state,demo_age_5_17,date\n\
             560034,x,7,Bengaluru Urban,Karnataka,3,15/01/2025\n",
        )
        .unwrap();

        let def = dataset(DEMOGRAPHIC).unwrap();
        let records = read_batch_file(&path, &def).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.state, "Karnataka");
        assert!((records[0].metric_value - 10.0).abs() < f64::EPSILON);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_column_fails_the_file() {
        let dir = fixture_dir("missing");
        let path = dir.join("enrolment.csv");
        std::fs::write(&path, "date,state,district,pincode,age_0_5\n").unwrap();

        let def = dataset(ENROLMENT).unwrap();
        let err = read_batch_file(&path, &def).unwrap_err();

        match err {
            FileError::MissingColumns { missing, .. } => {
                assert_eq!(missing, ["age_5_17", "age_18_greater"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rows_without_pincode_are_dropped() {
        let dir = fixture_dir("no_pincode");
        let path = dir.join("enrolment.csv");
        std::fs::write(
            &path,
            format!("{ENROLMENT_HEADER}\n01-03-2025,Delhi,New Delhi,,1,1,1\n"),
        )
        .unwrap();

        let def = dataset(ENROLMENT).unwrap();
        assert!(read_batch_file(&path, &def).unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn discovers_only_matching_csv_files_in_sorted_order() {
        let dir = fixture_dir("discover");
        for name in [
            "b_enrolment.csv",
            "a_enrolment.csv",
            "demographic.csv",
            "enrolment_notes.txt",
        ] {
            std::fs::write(dir.join(name), "").unwrap();
        }

        let def = dataset(ENROLMENT).unwrap();
        let files = discover_batch_files(&dir, &def).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["a_enrolment.csv", "b_enrolment.csv"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_dataset_skips_bad_files_and_keeps_good_ones() {
        let dir = fixture_dir("mixed");
        std::fs::write(
            dir.join("1_enrolment.csv"),
            format!("{ENROLMENT_HEADER}\n01-03-2025,Delhi,New Delhi,110001,1,1,1\n"),
        )
        .unwrap();
        std::fs::write(dir.join("2_enrolment.csv"), "date,state\n01-03-2025,Delhi\n").unwrap();

        let def = dataset(ENROLMENT).unwrap();
        let loaded = load_dataset(&dir, &def, &null_progress());

        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.files_loaded, 1);
        assert_eq!(loaded.diagnostics.len(), 1);
        assert_eq!(loaded.diagnostics[0].severity, Severity::Recoverable);
        assert!(loaded.diagnostics[0].path.ends_with("2_enrolment.csv"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_is_skipped_as_malformed_csv() {
        let dir = fixture_dir("corrupt");
        let mut corrupt =
            format!("{ENROLMENT_HEADER}\n01-03-2025,Delhi,New Delhi,110001,1,1,1\n").into_bytes();
        corrupt.extend_from_slice(b"01-03-2025,Delhi,New \xff\xfe Delhi,110002,1,1,1\n");
        std::fs::write(dir.join("a_enrolment.csv"), corrupt).unwrap();
        std::fs::write(
            dir.join("b_enrolment.csv"),
            format!("{ENROLMENT_HEADER}\n01-03-2025,Kerala,Idukki,685501,2,2,2\n"),
        )
        .unwrap();

        let def = dataset(ENROLMENT).unwrap();
        let err = read_batch_file(&dir.join("a_enrolment.csv"), &def).unwrap_err();
        assert!(matches!(err, FileError::Csv { .. }), "{err}");

        let loaded = load_dataset(&dir, &def, &null_progress());

        assert_eq!(loaded.files_loaded, 1);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].key.pincode, "685501");
        assert_eq!(loaded.diagnostics.len(), 1);
        assert_eq!(loaded.diagnostics[0].severity, Severity::Recoverable);
        assert!(loaded.diagnostics[0].path.ends_with("a_enrolment.csv"));
        assert!(loaded.diagnostics[0].message.starts_with("malformed CSV"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn no_matching_files_is_an_empty_dataset() {
        let dir = fixture_dir("empty");

        let def = dataset(DEMOGRAPHIC).unwrap();
        let loaded = load_dataset(&dir, &def, &null_progress());

        assert!(loaded.is_empty());
        assert!(loaded.diagnostics.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory_is_reported_not_fatal() {
        let dir = std::env::temp_dir().join("migration_map_loader_does_not_exist");
        let _ = std::fs::remove_dir_all(&dir);

        let def = dataset(ENROLMENT).unwrap();
        let loaded = load_dataset(&dir, &def, &null_progress());

        assert!(loaded.is_empty());
        assert_eq!(loaded.diagnostics.len(), 1);
    }
}
