use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::geometry::{Crs, Geometry, GeometryType};

/// Inferred attribute field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FieldKind {
    #[default]
    String,
    Integer,
    Double,
    Boolean,
    Date,
}

impl FieldKind {
    /// Map a dBase field type code to a field kind
    pub fn from_dbase_code(code: char) -> Self {
        match code.to_ascii_uppercase() {
            'N' | 'F' | 'B' | 'O' | 'Y' => FieldKind::Double,
            'I' => FieldKind::Integer,
            'L' => FieldKind::Boolean,
            'D' | 'T' | '@' => FieldKind::Date,
            _ => FieldKind::String,
        }
    }
}

/// Attribute field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// One record of a dataset: an optional geometry and its attribute values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub geometry: Option<Geometry>,
    pub attributes: HashMap<String, Value>,
}

impl FeatureRecord {
    pub fn new(geometry: Option<Geometry>) -> Self {
        Self { geometry, attributes: HashMap::new() }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Attribute value, treating a missing entry as null
    pub fn value(&self, field: &str) -> &Value {
        self.attributes.get(field).unwrap_or(&Value::Null)
    }
}

/// In-memory result of reading one shapefile.
///
/// `fields` carries the attribute column order; record attribute maps are
/// keyed by the same names. The geometry column is never listed in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDataset {
    /// Dataset name (shapefile base name)
    pub name: String,

    /// Coordinate reference system, `None` until normalized when the source had none
    pub crs: Option<Crs>,

    /// Canonical geometry type shared by all non-null geometries
    pub geometry_type: GeometryType,

    /// Ordered attribute fields
    pub fields: Vec<Field>,

    /// Records in source order
    pub records: Vec<FeatureRecord>,
}

impl FeatureDataset {
    pub fn feature_count(&self) -> usize {
        self.records.len()
    }

    /// Attribute field names in order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn null_geometry_count(&self) -> usize {
        self.records.iter().filter(|r| r.geometry.is_none()).count()
    }

    /// Iterate non-null geometries with their record index
    pub fn geometries(&self) -> impl Iterator<Item = (usize, &Geometry)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.geometry.as_ref().map(|g| (idx, g)))
    }

    /// Distinct native geometry types, sorted
    pub fn native_geometry_types(&self) -> Vec<GeometryType> {
        let mut types: Vec<GeometryType> =
            self.geometries().map(|(_, g)| g.geometry_type()).collect();
        types.sort();
        types.dedup();
        types
    }

    /// Add a 1-based integer identifier field numbered in record order.
    ///
    /// The field is placed first. An existing field of the same name is replaced.
    pub fn add_sequence_field(&mut self, name: &str) {
        self.fields.retain(|f| f.name != name);
        self.fields.insert(0, Field::new(name, FieldKind::Integer));
        for (idx, record) in self.records.iter_mut().enumerate() {
            record.attributes.insert(name.to_string(), Value::from(idx as u64 + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_with_points(count: usize) -> FeatureDataset {
        FeatureDataset {
            name: "points".to_string(),
            crs: None,
            geometry_type: GeometryType::Point,
            fields: vec![],
            records: (0..count)
                .map(|i| FeatureRecord::new(Some(Geometry::point(i as f64, 0.0))))
                .collect(),
        }
    }

    #[test]
    fn test_sequence_field_is_one_based() {
        let mut dataset = dataset_with_points(3);
        dataset.add_sequence_field("ID");

        assert_eq!(dataset.field_names(), vec!["ID"]);
        let ids: Vec<&Value> = dataset.records.iter().map(|r| r.value("ID")).collect();
        assert_eq!(ids, vec![&Value::from(1), &Value::from(2), &Value::from(3)]);
    }

    #[test]
    fn test_dbase_codes() {
        assert_eq!(FieldKind::from_dbase_code('C'), FieldKind::String);
        assert_eq!(FieldKind::from_dbase_code('N'), FieldKind::Double);
        assert_eq!(FieldKind::from_dbase_code('I'), FieldKind::Integer);
        assert_eq!(FieldKind::from_dbase_code('L'), FieldKind::Boolean);
        assert_eq!(FieldKind::from_dbase_code('D'), FieldKind::Date);
    }

    #[test]
    fn test_native_types_are_distinct() {
        let mut dataset = dataset_with_points(2);
        dataset.records.push(FeatureRecord::new(Some(Geometry::MultiPoint {
            coordinates: vec![[0.0, 0.0], [1.0, 1.0]],
        })));
        dataset.records.push(FeatureRecord::new(None));

        assert_eq!(
            dataset.native_geometry_types(),
            vec![GeometryType::Point, GeometryType::MultiPoint]
        );
        assert_eq!(dataset.null_geometry_count(), 1);
    }
}
