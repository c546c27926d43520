//! Config-driven dataset definition.
//!
//! [`DatasetDefinition`] captures everything that differs between the
//! enrolment and demographic extracts: which files belong to the dataset,
//! which columns identify the geography, and which columns are summed into
//! the dataset's metric.

use serde::Deserialize;

use crate::SourceError;

/// A logical dataset spread over any number of batch files.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"enrolment"`).
    pub id: String,
    /// Human-readable name used in progress messages.
    pub name: String,
    /// Substring a batch file name must contain to belong to this dataset.
    pub file_keyword: String,
    /// Name of the summed metric (e.g., `"Enrollments"`).
    pub metric_name: String,
    /// Source columns summed row-wise into the metric.
    pub sum_columns: Vec<String>,
    /// Names of the date and geography columns.
    #[serde(default)]
    pub columns: GeoColumns,
}

/// Header names of the date and geography columns.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoColumns {
    pub date: String,
    pub state: String,
    pub district: String,
    pub pincode: String,
}

impl Default for GeoColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            state: "state".to_string(),
            district: "district".to_string(),
            pincode: "pincode".to_string(),
        }
    }
}

impl DatasetDefinition {
    /// Every column a batch file must carry, geography columns first.
    #[must_use]
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![
            self.columns.date.as_str(),
            self.columns.state.as_str(),
            self.columns.district.as_str(),
            self.columns.pincode.as_str(),
        ];
        columns.extend(self.sum_columns.iter().map(String::as_str));
        columns
    }

    /// Whether `file_name` belongs to this dataset (`*<keyword>*.csv`).
    #[must_use]
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        file_name.contains(&self.file_keyword)
            && std::path::Path::new(file_name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    }
}

/// Parses a dataset definition from TOML.
///
/// # Errors
///
/// Returns [`SourceError::Toml`] if the document is malformed or misses a
/// required key.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, SourceError> {
    Ok(toml::from_str(toml_str)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        id = "demo"
        name = "Demo"
        file_keyword = "demographic"
        metric_name = "Demo_Updates"
        sum_columns = ["a", "b"]
    "#;

    #[test]
    fn columns_default_when_omitted() {
        let def = parse_dataset_toml(MINIMAL).unwrap();
        assert_eq!(def.columns.pincode, "pincode");
        assert_eq!(
            def.required_columns(),
            vec!["date", "state", "district", "pincode", "a", "b"]
        );
    }

    #[test]
    fn matches_keyword_and_csv_extension() {
        let def = parse_dataset_toml(MINIMAL).unwrap();
        assert!(def.matches_file_name("api_data_demographic_0_500000.csv"));
        assert!(def.matches_file_name("demographic.CSV"));
        assert!(!def.matches_file_name("api_data_demographic.xlsx"));
        assert!(!def.matches_file_name("api_data_enrolment.csv"));
    }

    #[test]
    fn rejects_missing_keys() {
        assert!(parse_dataset_toml("id = \"x\"").is_err());
    }
}
