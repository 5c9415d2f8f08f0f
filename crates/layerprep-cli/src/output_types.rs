use layerprep_core::config::ConfigSource;
use layerprep_core::formats::ArchiveValidation;
use layerprep_core::models::{
    CrsReport, Field, FieldMapping, GeometryType, QualityReport, SchemaComparison,
    ValidationReport,
};
use layerprep_geo::transform::CrsAction;
use layerprep_ingest::PreparationSummary;
use serde::Serialize;

/// Output for check command
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub archive: String,
    pub validation: ArchiveValidation,
}

/// Output for ingest command
#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub archive: String,
    pub dataset_name: String,
    pub feature_count: usize,
    pub geometry_type: GeometryType,
    pub fields: Vec<Field>,
    pub crs: CrsReport,
    pub crs_action: Option<CrsAction>,
    pub warnings: Vec<String>,
    pub validation: ValidationReport,
    pub quality: QualityReport,
    pub preparation: PreparationSummary,
    pub output_file: Option<String>,
}

/// Output for quality command
#[derive(Debug, Serialize)]
pub struct QualityOutput {
    pub archive: String,
    pub feature_count: usize,
    pub quality: QualityReport,
}

/// Output for compare command
#[derive(Debug, Serialize)]
pub struct CompareOutput {
    pub archive: String,
    pub source_fields: Vec<String>,
    pub comparison: SchemaComparison,
}

/// Output for map command
#[derive(Debug, Serialize)]
pub struct MapOutput {
    pub archive: String,
    pub mapping: FieldMapping,
    pub mapped_fields: Vec<String>,
    pub feature_count: usize,
    pub output_file: Option<String>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub config_file: Option<String>,
    pub values: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: ConfigSource,
}
