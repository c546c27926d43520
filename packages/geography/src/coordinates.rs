//! Pincode coordinate reference table.
//!
//! The table is a CSV with a pincode key (possibly namespaced, e.g.
//! `IN/110001`) and latitude/longitude stored as strings. It is read once
//! per run, either downloaded or from a local copy.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use migration_map_migration_models::Coordinate;
use migration_map_source::parsing::{normalize_pincode, parse_coordinate};

use crate::GeoError;

/// Public pincode geocode dataset used when no other source is configured.
pub const DEFAULT_COORDINATES_URL: &str =
    "https://raw.githubusercontent.com/sanand0/pincode/master/data/IN.csv";

const USER_AGENT: &str = concat!("migration-map/", env!("CARGO_PKG_VERSION"));

/// Accepted header names, in order of preference.
const KEY_COLUMNS: &[&str] = &["key", "pincode"];
const LAT_COLUMNS: &[&str] = &["latitude", "lat"];
const LNG_COLUMNS: &[&str] = &["longitude", "lng"];

/// Where to read the coordinate table from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateSource {
    /// Download over HTTP(S).
    Url(String),
    /// Read a local CSV file.
    File(PathBuf),
}

impl Default for CoordinateSource {
    fn default() -> Self {
        Self::Url(DEFAULT_COORDINATES_URL.to_string())
    }
}

impl FromStr for CoordinateSource {
    type Err = std::convert::Infallible;

    /// `http://` and `https://` values are URLs; anything else is a path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self::Url(s.to_string()))
        } else {
            Ok(Self::File(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for CoordinateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Coordinates keyed by bare pincode.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTable {
    entries: BTreeMap<String, Coordinate>,
}

impl CoordinateTable {
    /// Reads the table from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the download or file read fails, or if the
    /// content is not a usable coordinate table.
    pub async fn load(source: &CoordinateSource) -> Result<Self, GeoError> {
        log::info!("Fetching coordinates from {source}...");

        let bytes = match source {
            CoordinateSource::Url(url) => download(url).await?,
            CoordinateSource::File(path) => {
                tokio::fs::read(path).await.map_err(|e| GeoError::Io {
                    path: path.clone(),
                    source: e,
                })?
            }
        };

        let table = Self::from_csv_reader(bytes.as_slice())?;
        log::info!("Loaded coordinates for {} pincodes", table.len());
        Ok(table)
    }

    /// Parses a coordinate table from CSV.
    ///
    /// Keys are normalized to bare digit strings; rows whose key normalizes
    /// to nothing are skipped. Unparseable latitude/longitude values become
    /// missing axes. When a pincode repeats, the first row wins.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Csv`] for malformed CSV and
    /// [`GeoError::MissingColumn`] when a required column is absent.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, GeoError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let key = find_column(&headers, "key", KEY_COLUMNS)?;
        let lat = find_column(&headers, "latitude", LAT_COLUMNS)?;
        let lng = find_column(&headers, "longitude", LNG_COLUMNS)?;

        let mut entries = BTreeMap::new();
        let mut duplicates: u64 = 0;

        for result in reader.records() {
            let row = result?;
            let Some(pincode) = row.get(key).and_then(normalize_pincode) else {
                continue;
            };
            let coordinate = Coordinate {
                lat: row.get(lat).and_then(parse_coordinate),
                lng: row.get(lng).and_then(parse_coordinate),
            };
            if entries.contains_key(&pincode) {
                duplicates += 1;
            } else {
                entries.insert(pincode, coordinate);
            }
        }

        if duplicates > 0 {
            log::debug!("Ignored {duplicates} repeated pincodes in coordinate table");
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn get(&self, pincode: &str) -> Option<Coordinate> {
        self.entries.get(pincode).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Coordinate)> for CoordinateTable {
    fn from_iter<I: IntoIterator<Item = (String, Coordinate)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn find_column(
    headers: &[String],
    column: &'static str,
    candidates: &'static [&'static str],
) -> Result<usize, GeoError> {
    candidates
        .iter()
        .find_map(|name| headers.iter().position(|h| h == name))
        .ok_or(GeoError::MissingColumn { column, candidates })
}

async fn download(url: &str) -> Result<Vec<u8>, GeoError> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    log::debug!("Downloaded {} bytes from {url}", bytes.len());
    Ok(bytes.to_vec())
}
