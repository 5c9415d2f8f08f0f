//! layerprep core - Domain models, configuration and the shapefile format layer
//!
//! This crate contains the domain model and port definitions shared by the
//! ingestion pipeline, plus the stages that turn an uploaded archive into a
//! [`models::FeatureDataset`].

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod ports;
pub mod schema;

pub use error::{ErrorKind, IngestError, Result};
