//! GeoJSON hand-off for the publisher and for backups

use geojson::{Feature, FeatureCollection, JsonObject};
use layerprep_core::error::{IngestError, Result};
use layerprep_core::models::FeatureDataset;

/// Convert a dataset into a GeoJSON FeatureCollection.
///
/// Properties follow the dataset's field order. Records without geometry
/// become features with a null geometry.
pub fn to_feature_collection(dataset: &FeatureDataset) -> Result<FeatureCollection> {
    let mut features = Vec::with_capacity(dataset.feature_count());

    for (idx, record) in dataset.records.iter().enumerate() {
        let geometry = match &record.geometry {
            Some(geom) => Some(geojson::Geometry::from_json_value(geom.to_geojson()).map_err(|e| {
                IngestError::Serialization(format!("feature {}: {}", idx, e))
            })?),
            None => None,
        };

        let mut properties = JsonObject::new();
        for field in &dataset.fields {
            properties.insert(field.name.clone(), record.value(&field.name).clone());
        }

        features.push(Feature {
            geometry,
            properties: Some(properties),
            id: None,
            bbox: None,
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

/// Pretty-printed GeoJSON text for a dataset
pub fn to_geojson_string(dataset: &FeatureDataset) -> Result<String> {
    let collection = to_feature_collection(dataset)?;
    Ok(serde_json::to_string_pretty(&collection)?)
}
