use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IngestError, Result};

/// Name of the geometry column, never part of a field mapping
pub const GEOMETRY_FIELD: &str = "geometry";

fn default_nullable() -> bool {
    true
}

/// One field of an existing target layer schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetField {
    pub name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Platform field type (e.g. `esriFieldTypeString`), when known
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

impl TargetField {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), nullable: true, field_type: None }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self { nullable: false, ..Self::new(name) }
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }
}

/// Result of comparing a source field list with a target schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaComparison {
    pub compatible: bool,
    pub missing_in_target: Vec<String>,
    pub missing_in_source: Vec<String>,
    pub required_missing: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Source field name to target field name correspondence.
///
/// Keys are distinct source names, values are distinct target names and the
/// geometry column is never a key or a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: BTreeMap<String, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pair, rejecting the geometry column on either side and reused target names
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) -> Result<()> {
        let source = source.into();
        let target = target.into();

        if source == GEOMETRY_FIELD {
            return Err(IngestError::InvalidMapping {
                reason: "the geometry field cannot be mapped".to_string(),
            });
        }
        if target == GEOMETRY_FIELD {
            return Err(IngestError::InvalidMapping {
                reason: format!("'{}' cannot be mapped onto the geometry field", source),
            });
        }
        if let Some((other, _)) = self.entries.iter().find(|(s, t)| **t == target && **s != source)
        {
            return Err(IngestError::InvalidMapping {
                reason: format!("'{}' and '{}' both map to '{}'", other, source, target),
            });
        }

        self.entries.insert(source, target);
        Ok(())
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    pub fn contains_target(&self, target: &str) -> bool {
        self.entries.values().any(|t| t == target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Re-check the invariants, e.g. after deserializing a caller supplied mapping
    pub fn validate(&self) -> Result<()> {
        let mut checked = FieldMapping::new();
        for (source, target) in self.iter() {
            checked.insert(source, target)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<(&str, &str)>> for FieldMapping {
    type Error = IngestError;

    fn try_from(pairs: Vec<(&str, &str)>) -> Result<Self> {
        let mut mapping = FieldMapping::new();
        for (source, target) in pairs {
            mapping.insert(source, target)?;
        }
        Ok(mapping)
    }
}
