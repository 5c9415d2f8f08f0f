//! Publish preparation
//!
//! Last pass before the dataset is handed to the publisher: repair what can
//! be repaired, drop records without geometry and make field names
//! acceptable to the hosted platform.

use layerprep_core::models::{FeatureDataset, ValidityMode};
use layerprep_geo::repair::{repair_geometry, RepairOutcome};
use serde::Serialize;
use std::collections::HashSet;

/// Longest field name the hosted platform accepts
pub const MAX_FIELD_NAME_LEN: usize = 64;

/// What preparation changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreparationSummary {
    /// Source record indices whose geometry was replaced
    pub repaired: Vec<usize>,
    /// Source record indices whose geometry was left invalid, with the reason
    pub still_invalid: Vec<(usize, String)>,
    pub dropped_null_geometries: usize,
    /// `(old, new)` field renames
    pub renamed_fields: Vec<(String, String)>,
}

impl PreparationSummary {
    pub fn is_noop(&self) -> bool {
        self.repaired.is_empty()
            && self.still_invalid.is_empty()
            && self.dropped_null_geometries == 0
            && self.renamed_fields.is_empty()
    }
}

/// Prepare a dataset for publishing in place.
///
/// Geometry is only modified in lenient mode; strict mode lists invalid
/// geometries in `still_invalid` and leaves them as they are.
pub fn prepare_for_publish(dataset: &mut FeatureDataset, mode: ValidityMode) -> PreparationSummary {
    let mut summary = PreparationSummary::default();

    for (idx, record) in dataset.records.iter_mut().enumerate() {
        let Some(geometry) = &record.geometry else {
            continue;
        };
        match repair_geometry(geometry) {
            RepairOutcome::Unchanged => {}
            RepairOutcome::Repaired(fixed) if mode == ValidityMode::Lenient => {
                record.geometry = Some(fixed);
                summary.repaired.push(idx);
            }
            RepairOutcome::Repaired(_) => {
                summary.still_invalid.push((idx, "repair disabled in strict mode".to_string()));
            }
            RepairOutcome::Unrepairable(reason) => summary.still_invalid.push((idx, reason)),
        }
    }

    let before = dataset.records.len();
    dataset.records.retain(|r| r.geometry.is_some());
    summary.dropped_null_geometries = before - dataset.records.len();

    summary.renamed_fields = clean_field_names(dataset);

    tracing::info!(
        repaired = summary.repaired.len(),
        still_invalid = summary.still_invalid.len(),
        dropped = summary.dropped_null_geometries,
        renamed = summary.renamed_fields.len(),
        "Prepared dataset for publishing"
    );

    summary
}

/// Keep ASCII letters, digits and underscores, truncated to the platform limit
pub fn clean_field_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(MAX_FIELD_NAME_LEN)
        .collect();
    if cleaned.is_empty() {
        "field".to_string()
    } else {
        cleaned
    }
}

/// Rename fields in place; returns the renames made
fn clean_field_names(dataset: &mut FeatureDataset) -> Vec<(String, String)> {
    let mut taken: HashSet<String> = dataset
        .fields
        .iter()
        .filter(|f| clean_field_name(&f.name) == f.name)
        .map(|f| f.name.to_lowercase())
        .collect();
    let mut renames = Vec::new();

    for field in &mut dataset.fields {
        let cleaned = clean_field_name(&field.name);
        if cleaned == field.name {
            continue;
        }
        let new_name = unique_name(&cleaned, &taken);
        taken.insert(new_name.to_lowercase());
        renames.push((std::mem::replace(&mut field.name, new_name.clone()), new_name));
    }

    for record in &mut dataset.records {
        for (old, new) in &renames {
            if let Some(value) = record.attributes.remove(old) {
                record.attributes.insert(new.clone(), value);
            }
        }
    }

    renames
}

/// Append `_1`, `_2`, ... until the name is free, staying within the length limit
fn unique_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(&base.to_lowercase()) {
        return base.to_string();
    }
    (1..)
        .map(|n| {
            let suffix = format!("_{}", n);
            let keep = MAX_FIELD_NAME_LEN.saturating_sub(suffix.len()).min(base.len());
            format!("{}{}", &base[..keep], suffix)
        })
        .find(|candidate| !taken.contains(&candidate.to_lowercase()))
        .unwrap_or_else(|| base.to_string())
}
