//! Dataset registry backed by embedded TOML definitions.
//!
//! Each `.toml` file in `packages/source/datasets/` is baked into the binary
//! at compile time via [`include_str!`].

use crate::SourceError;
use crate::dataset_def::{DatasetDefinition, parse_dataset_toml};

/// Identifier of the enrolment dataset.
pub const ENROLMENT: &str = "enrolment";

/// Identifier of the demographic update dataset.
pub const DEMOGRAPHIC: &str = "demographic";

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[
    (ENROLMENT, include_str!("../datasets/enrolment.toml")),
    (DEMOGRAPHIC, include_str!("../datasets/demographic.toml")),
];

/// Returns all configured dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so the
/// registry tests catch this before release).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a single dataset definition by id.
///
/// # Errors
///
/// Returns [`SourceError::UnknownDataset`] if no dataset has that id, or
/// [`SourceError::Toml`] if its config fails to parse.
pub fn dataset(id: &str) -> Result<DatasetDefinition, SourceError> {
    let (_, toml) = DATASET_TOMLS
        .iter()
        .find(|(name, _)| *name == id)
        .ok_or_else(|| SourceError::UnknownDataset { id: id.to_string() })?;
    parse_dataset_toml(toml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_datasets() {
        let datasets = all_datasets();
        assert_eq!(datasets.len(), DATASET_TOMLS.len());
        for (def, (name, _)) in datasets.iter().zip(DATASET_TOMLS) {
            assert_eq!(def.id, *name, "id does not match registry entry");
        }
    }

    #[test]
    fn all_datasets_have_required_fields() {
        for def in &all_datasets() {
            assert!(!def.name.is_empty(), "{}: empty name", def.id);
            assert!(!def.file_keyword.is_empty(), "{}: empty keyword", def.id);
            assert!(!def.metric_name.is_empty(), "{}: empty metric", def.id);
            assert!(!def.sum_columns.is_empty(), "{}: nothing to sum", def.id);
        }
    }

    #[test]
    fn enrolment_sums_three_age_brackets() {
        let def = dataset(ENROLMENT).unwrap();
        assert_eq!(def.metric_name, "Enrollments");
        assert_eq!(def.sum_columns, ["age_0_5", "age_5_17", "age_18_greater"]);
    }

    #[test]
    fn demographic_sums_two_age_brackets() {
        let def = dataset(DEMOGRAPHIC).unwrap();
        assert_eq!(def.metric_name, "Demo_Updates");
        assert_eq!(def.sum_columns, ["demo_age_5_17", "demo_age_17_"]);
    }

    #[test]
    fn unknown_dataset_is_an_error() {
        assert!(matches!(
            dataset("biometric"),
            Err(SourceError::UnknownDataset { .. })
        ));
    }
}
