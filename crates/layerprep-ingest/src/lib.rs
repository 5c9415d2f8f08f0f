//! Layerprep Ingest - Dataset validation, quality scoring and the ingest pipeline
//!
//! This crate implements the ingest use case, running an uploaded archive
//! through extraction, reading, CRS normalization, validation and quality
//! scoring, and preparing the result for the publisher.

pub mod export;
pub mod pipeline;
pub mod prepare;
pub mod quality;
pub mod validation;

pub use export::{to_feature_collection, to_geojson_string};
pub use pipeline::{IngestOutcome, IngestPipeline};
pub use prepare::{prepare_for_publish, PreparationSummary};
pub use quality::{check_fields, score_quality, FieldFindings, QualityScorer};
pub use validation::validate_dataset;
