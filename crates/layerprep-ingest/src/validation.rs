use layerprep_core::models::{DatasetStatistics, FeatureDataset, GeometryType, ValidationReport};
use layerprep_geo::models::dataset_bounds;
use layerprep_geo::validation::invalid_geometry_indices;

/// Build the validation report for a dataset.
///
/// Geometry types a single layer cannot hold are errors. Null and invalid
/// geometries are warnings only; the caller decides whether to repair them.
pub fn validate_dataset(dataset: &FeatureDataset) -> ValidationReport {
    let mut report = ValidationReport::new();

    let null_count = dataset.null_geometry_count();
    if null_count > 0 {
        report.warning(format!("{} features have null geometry", null_count));
    }

    let invalid_indices = invalid_geometry_indices(dataset);
    if !invalid_indices.is_empty() {
        report.warning(format!("{} features have invalid geometry", invalid_indices.len()));
    }

    let native_types = dataset.native_geometry_types();
    let unsupported: Vec<&str> = native_types
        .iter()
        .filter(|t| !t.is_supported())
        .map(|t| t.as_str())
        .collect();
    if !unsupported.is_empty() {
        report.error(format!("Unsupported geometry types: {}", unsupported.join(", ")));
    }

    report.statistics = DatasetStatistics {
        feature_count: dataset.feature_count(),
        null_geometry_count: null_count,
        invalid_geometry_count: invalid_indices.len(),
        geometry_types: native_types.iter().map(GeometryType::to_string).collect(),
        bounds: dataset_bounds(dataset),
    };
    report.invalid_indices = invalid_indices;

    tracing::debug!(
        valid = report.valid,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Validated dataset"
    );

    report
}
