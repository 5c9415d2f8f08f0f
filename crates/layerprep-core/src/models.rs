pub mod dataset;
pub mod geometry;
pub mod report;
pub mod schema;

pub use dataset::{FeatureDataset, FeatureRecord, Field, FieldKind};
pub use geometry::{find_epsg_code, Crs, Geometry, GeometryType, ValidityMode, WGS84_EPSG};
pub use report::{
    CrsReport, DatasetStatistics, QualityReport, QualityStatistics, QualityTier, ValidationReport,
};
pub use schema::{FieldMapping, SchemaComparison, TargetField, GEOMETRY_FIELD};
