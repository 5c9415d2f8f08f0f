//! Layerprep Geo - Geometry validation, repair and CRS handling
//!
//! This crate holds the geospatial side of ingestion: structural geometry
//! checks, repair of invalid geometries, CRS inspection and reprojection.

pub mod crs;
pub mod models;
pub mod repair;
pub mod transform;
pub mod validation;
