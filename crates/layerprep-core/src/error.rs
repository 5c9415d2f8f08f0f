//! Error types for layerprep

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    // Archive errors
    #[error("Invalid archive: {reason}")]
    Archive { reason: String },

    // Structural dataset errors
    #[error("Shapefile contains no features")]
    NoFeatures,

    #[error("Shapefile has no geometry")]
    NoGeometry,

    #[error("All {count} features have null geometry")]
    AllGeometryNull { count: usize },

    #[error(
        "Mixed geometry families: feature {feature_index} is {found}, layer is {expected}. \
         A single layer must have one geometry type"
    )]
    MixedGeometryFamily {
        expected: String,
        found: String,
        feature_index: usize,
    },

    #[error("Failed to read {component} component: {message}")]
    Shapefile { component: String, message: String },

    // CRS errors
    #[error("Cannot reproject from {from} to {to}: {reason}")]
    Reprojection {
        from: String,
        to: String,
        reason: String,
    },

    // Field mapping errors
    #[error("Field mapping would drop every attribute column")]
    EmptyMapping,

    #[error("Invalid field mapping: {reason}")]
    InvalidMapping { reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Stable tag for each failure kind, suitable for reporting layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Archive,
    NoFeatures,
    NoGeometry,
    AllGeometryNull,
    MixedGeometryFamily,
    Shapefile,
    Reprojection,
    EmptyMapping,
    InvalidMapping,
    Config,
    Io,
    Serialization,
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Archive { .. } => ErrorKind::Archive,
            IngestError::NoFeatures => ErrorKind::NoFeatures,
            IngestError::NoGeometry => ErrorKind::NoGeometry,
            IngestError::AllGeometryNull { .. } => ErrorKind::AllGeometryNull,
            IngestError::MixedGeometryFamily { .. } => ErrorKind::MixedGeometryFamily,
            IngestError::Shapefile { .. } => ErrorKind::Shapefile,
            IngestError::Reprojection { .. } => ErrorKind::Reprojection,
            IngestError::EmptyMapping => ErrorKind::EmptyMapping,
            IngestError::InvalidMapping { .. } => ErrorKind::InvalidMapping,
            IngestError::ConfigInvalid { .. } => ErrorKind::Config,
            IngestError::Io(_) => ErrorKind::Io,
            IngestError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether the pipeline may continue after this error.
    ///
    /// Only a failed reprojection is recoverable: the geometry is still usable
    /// in its source system, so the caller gets a warning instead.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IngestError::Reprojection { .. })
    }

    pub(crate) fn shapefile(component: &str, message: impl std::fmt::Display) -> Self {
        IngestError::Shapefile {
            component: component.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for IngestError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => IngestError::Io(io),
            other => IngestError::Archive { reason: other.to_string() },
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_reprojection_is_recoverable() {
        let reprojection = IngestError::Reprojection {
            from: "EPSG:99999".to_string(),
            to: "EPSG:4326".to_string(),
            reason: "unknown crs".to_string(),
        };
        assert!(reprojection.is_recoverable());
        assert!(!IngestError::NoFeatures.is_recoverable());
        assert!(!IngestError::EmptyMapping.is_recoverable());
    }

    #[test]
    fn test_zip_errors_become_archive_errors() {
        let err: IngestError = zip::result::ZipError::InvalidArchive("bad header".into()).into();
        assert_eq!(err.kind(), ErrorKind::Archive);
    }

    #[test]
    fn test_messages_are_human_readable() {
        let err = IngestError::MixedGeometryFamily {
            expected: "Point".to_string(),
            found: "Polygon".to_string(),
            feature_index: 3,
        };
        let message = err.to_string();
        assert!(message.contains("feature 3"));
        assert!(message.contains("Polygon"));
    }
}
