//! Schema comparison and field mapping against an existing target layer

use std::collections::HashMap;

use crate::error::{IngestError, Result};
use crate::models::{
    FeatureDataset, FeatureRecord, Field, FieldMapping, SchemaComparison, TargetField,
    GEOMETRY_FIELD,
};

/// Target fields maintained by the hosting platform itself
const SYSTEM_FIELD_NAMES: &[&str] = &["objectid", "globalid", "fid", "oid"];
const SYSTEM_FIELD_TYPES: &[&str] = &["esriFieldTypeOID", "esriFieldTypeGlobalID"];

/// Whether a target field is managed by the platform and so never compared or mapped
pub fn is_system_field(field: &TargetField) -> bool {
    SYSTEM_FIELD_NAMES.contains(&field.name.to_ascii_lowercase().as_str())
        || field
            .field_type
            .as_deref()
            .is_some_and(|t| SYSTEM_FIELD_TYPES.contains(&t))
}

fn user_targets(target: &[TargetField]) -> impl Iterator<Item = &TargetField> {
    target
        .iter()
        .filter(|f| !is_system_field(f) && f.name != GEOMETRY_FIELD)
}

fn user_sources<S: AsRef<str>>(source: &[S]) -> impl Iterator<Item = &str> {
    source
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| {
            *name != GEOMETRY_FIELD
                && !SYSTEM_FIELD_NAMES.contains(&name.to_ascii_lowercase().as_str())
        })
}

/// Compare source field names with a target schema.
///
/// Lists keep source order and target order respectively.
pub fn compare_schemas<S: AsRef<str>>(source_fields: &[S], target: &[TargetField]) -> SchemaComparison {
    let sources: Vec<&str> = user_sources(source_fields).collect();
    let targets: Vec<&TargetField> = user_targets(target).collect();

    let missing_in_target: Vec<String> = sources
        .iter()
        .filter(|s| !targets.iter().any(|t| t.name == **s))
        .map(|s| s.to_string())
        .collect();
    let missing_in_source: Vec<String> = targets
        .iter()
        .filter(|t| !sources.contains(&t.name.as_str()))
        .map(|t| t.name.clone())
        .collect();
    let required_missing: Vec<String> = targets
        .iter()
        .filter(|t| !t.nullable && !sources.contains(&t.name.as_str()))
        .map(|t| t.name.clone())
        .collect();

    let compatible =
        missing_in_target.is_empty() && missing_in_source.is_empty() && required_missing.is_empty();

    let mut recommendations = Vec::new();
    if !missing_in_target.is_empty() {
        recommendations
            .push("Consider field mapping or adding missing fields to target layer".to_string());
    }
    if !missing_in_source.is_empty() {
        recommendations
            .push("Source data is missing some target fields - they will be set to null".to_string());
    }
    if !required_missing.is_empty() {
        recommendations.push(format!(
            "Required target fields have no source values: {}",
            required_missing.join(", ")
        ));
    }
    if compatible {
        recommendations.push("Schemas are compatible for direct update".to_string());
    }

    SchemaComparison {
        compatible,
        missing_in_target,
        missing_in_source,
        required_missing,
        recommendations,
    }
}

fn strip_separators(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// How a source name is matched against a target name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchRule {
    Exact,
    CaseInsensitive,
    /// Either name contains the other once `_` and `-` are stripped
    Substring,
}

impl MatchRule {
    const PASSES: [MatchRule; 3] = [MatchRule::Exact, MatchRule::CaseInsensitive, MatchRule::Substring];

    fn matches(self, source: &str, target: &str) -> bool {
        match self {
            MatchRule::Exact => source == target,
            MatchRule::CaseInsensitive => source.to_lowercase() == target.to_lowercase(),
            MatchRule::Substring => {
                let clean_source = strip_separators(source);
                let clean_target = strip_separators(target);
                !clean_source.is_empty()
                    && !clean_target.is_empty()
                    && (clean_source.contains(&clean_target) || clean_target.contains(&clean_source))
            }
        }
    }
}

/// Propose a source to target mapping.
///
/// Matching runs in three passes over all source fields: exact names, then
/// case-insensitive names, then substrings of names stripped of `_` and `-`.
/// A looser pass only sees the sources and targets the stricter passes left
/// free. Within a pass sources go in listed order, each takes the first free
/// target that matches, and each target is assigned at most once. Unmatched
/// source fields are left out.
pub fn suggest_mapping<S: AsRef<str>>(source_fields: &[S], target: &[TargetField]) -> FieldMapping {
    let sources: Vec<&str> = user_sources(source_fields).collect();
    let targets: Vec<&str> = user_targets(target).map(|t| t.name.as_str()).collect();
    let mut mapping = FieldMapping::new();

    for rule in MatchRule::PASSES {
        for source in &sources {
            if mapping.get(source).is_some() {
                continue;
            }
            let Some(matched) = targets
                .iter()
                .find(|t| !mapping.contains_target(t) && rule.matches(source, t))
            else {
                continue;
            };
            match mapping.insert(*source, *matched) {
                Ok(()) => tracing::debug!(source, target = matched, ?rule, "Suggested mapping"),
                Err(e) => tracing::debug!(source, error = %e, "Skipping mapping suggestion"),
            }
        }
    }

    for source in sources.iter().filter(|s| mapping.get(s).is_none()) {
        tracing::debug!(source, "No target field matches");
    }

    mapping
}

/// Rename mapped columns and drop every column the mapping does not name.
///
/// Mapping keys that are not dataset fields are ignored. Geometry is always
/// kept.
pub fn apply_mapping(dataset: &FeatureDataset, mapping: &FieldMapping) -> Result<FeatureDataset> {
    mapping.validate()?;

    let renames: Vec<(&Field, &str)> = dataset
        .fields
        .iter()
        .filter_map(|field| mapping.get(&field.name).map(|target| (field, target)))
        .collect();

    if renames.is_empty() {
        return Err(IngestError::EmptyMapping);
    }

    let fields = renames
        .iter()
        .map(|(field, target)| Field::new(*target, field.kind))
        .collect();

    let records = dataset
        .records
        .iter()
        .map(|record| {
            let attributes: HashMap<String, serde_json::Value> = renames
                .iter()
                .map(|(field, target)| (target.to_string(), record.value(&field.name).clone()))
                .collect();
            FeatureRecord { geometry: record.geometry.clone(), attributes }
        })
        .collect();

    tracing::debug!(
        kept = renames.len(),
        dropped = dataset.fields.len() - renames.len(),
        "Applied field mapping"
    );

    Ok(FeatureDataset {
        name: dataset.name.clone(),
        crs: dataset.crs.clone(),
        geometry_type: dataset.geometry_type,
        fields,
        records,
    })
}
