//! CRS transformation and normalization

use layerprep_core::error::{IngestError, Result};
use proj::Proj;
use serde::Serialize;
use std::fmt;

use crate::models::{Crs, FeatureDataset, Geometry};
use crate::validation::is_finite;

/// What CRS normalization did to a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CrsAction {
    /// The dataset had no CRS; the target was assigned without transforming
    Assumed { crs: String },
    /// The dataset was already in the target CRS
    Unchanged,
    /// Every geometry was transformed
    Reprojected { from: String, to: String },
}

impl fmt::Display for CrsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsAction::Assumed { crs } => write!(f, "no CRS defined, assumed {}", crs),
            CrsAction::Unchanged => write!(f, "already in target CRS"),
            CrsAction::Reprojected { from, to } => write!(f, "reprojected from {} to {}", from, to),
        }
    }
}

/// Pairwise coordinate transformation between two systems
pub struct Reprojector {
    proj: Proj,
    from: Crs,
    to: Crs,
}

impl Reprojector {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let proj = Proj::new_known_crs(&from.definition, &to.definition, None).map_err(|e| {
            IngestError::Reprojection {
                from: from.to_string(),
                to: to.to_string(),
                reason: format!("Failed to create projection: {}", e),
            }
        })?;
        Ok(Self { proj, from: from.clone(), to: to.clone() })
    }

    /// Transform one coordinate; non-finite input is passed through
    pub fn convert(&self, coord: [f64; 2]) -> Result<[f64; 2]> {
        if !is_finite(&coord) {
            return Ok(coord);
        }
        let (x, y) = self.proj.convert((coord[0], coord[1])).map_err(|e| self.error(e))?;
        if !x.is_finite() || !y.is_finite() {
            return Err(self.error(format!("({}, {}) has no finite image", coord[0], coord[1])));
        }
        Ok([x, y])
    }

    fn error(&self, reason: impl fmt::Display) -> IngestError {
        IngestError::Reprojection {
            from: self.from.to_string(),
            to: self.to.to_string(),
            reason: format!("Projection failed: {}", reason),
        }
    }

    fn convert_all(&self, coords: &[[f64; 2]]) -> Result<Vec<[f64; 2]>> {
        coords.iter().map(|c| self.convert(*c)).collect()
    }

    fn convert_rings(&self, rings: &[Vec<[f64; 2]>]) -> Result<Vec<Vec<[f64; 2]>>> {
        rings.iter().map(|r| self.convert_all(r)).collect()
    }

    /// Transform every coordinate of a geometry
    pub fn reproject(&self, geometry: &Geometry) -> Result<Geometry> {
        Ok(match geometry {
            Geometry::Point { coordinates } => Geometry::Point { coordinates: self.convert(*coordinates)? },
            Geometry::LineString { coordinates } => {
                Geometry::LineString { coordinates: self.convert_all(coordinates)? }
            }
            Geometry::Polygon { coordinates } => {
                Geometry::Polygon { coordinates: self.convert_rings(coordinates)? }
            }
            Geometry::MultiPoint { coordinates } => {
                Geometry::MultiPoint { coordinates: self.convert_all(coordinates)? }
            }
            Geometry::MultiLineString { coordinates } => {
                Geometry::MultiLineString { coordinates: self.convert_rings(coordinates)? }
            }
            Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
                coordinates: coordinates
                    .iter()
                    .map(|p| self.convert_rings(p))
                    .collect::<Result<_>>()?,
            },
            Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
                geometries: geometries.iter().map(|g| self.reproject(g)).collect::<Result<_>>()?,
            },
        })
    }
}

/// Reproject a geometry from one CRS to another
pub fn reproject_geometry(geometry: &Geometry, from_crs: &Crs, to_crs: &Crs) -> Result<Geometry> {
    // If CRS are the same, no transformation needed
    if from_crs.same_as(to_crs) {
        return Ok(geometry.clone());
    }
    Reprojector::new(from_crs, to_crs)?.reproject(geometry)
}

/// Bring a dataset into the target CRS.
///
/// A dataset without a CRS is assumed to be in the target system. On error
/// the dataset is left exactly as it was. Running this twice is a no-op the
/// second time.
pub fn normalize_crs(dataset: &mut FeatureDataset, target: &Crs) -> Result<CrsAction> {
    let Some(source) = dataset.crs.clone() else {
        tracing::info!(target = %target, "No source CRS, assuming target");
        dataset.crs = Some(target.clone());
        return Ok(CrsAction::Assumed { crs: target.to_string() });
    };

    if source.same_as(target) {
        dataset.crs = Some(target.clone());
        return Ok(CrsAction::Unchanged);
    }

    let reprojector = Reprojector::new(&source, target)?;
    let transformed = dataset
        .records
        .iter()
        .map(|r| r.geometry.as_ref().map(|g| reprojector.reproject(g)).transpose())
        .collect::<Result<Vec<Option<Geometry>>>>()?;

    for (record, geometry) in dataset.records.iter_mut().zip(transformed) {
        record.geometry = geometry;
    }
    dataset.crs = Some(target.clone());

    tracing::info!(from = %source, to = %target, features = dataset.feature_count(), "Reprojected dataset");

    Ok(CrsAction::Reprojected { from: source.to_string(), to: target.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerprep_core::models::{FeatureRecord, GeometryType};

    fn dataset(crs: Option<Crs>, points: &[[f64; 2]]) -> FeatureDataset {
        FeatureDataset {
            name: "pts".to_string(),
            crs,
            geometry_type: GeometryType::Point,
            fields: vec![],
            records: points
                .iter()
                .map(|p| FeatureRecord::new(Some(Geometry::point(p[0], p[1]))))
                .collect(),
        }
    }

    fn point(dataset: &FeatureDataset, idx: usize) -> [f64; 2] {
        match dataset.records[idx].geometry {
            Some(Geometry::Point { coordinates }) => coordinates,
            ref other => panic!("expected point, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_crs_is_assumed_without_transform() {
        let mut data = dataset(None, &[[500000.0, 4000000.0]]);
        let action = normalize_crs(&mut data, &Crs::wgs84()).unwrap();

        assert!(matches!(action, CrsAction::Assumed { .. }));
        assert_eq!(data.crs, Some(Crs::wgs84()));
        assert_eq!(point(&data, 0), [500000.0, 4000000.0]);
    }

    #[test]
    fn test_same_crs_is_unchanged() {
        let mut data = dataset(Some(Crs::epsg(4326)), &[[10.0, 20.0]]);
        let action = normalize_crs(&mut data, &Crs::wgs84()).unwrap();

        assert_eq!(action, CrsAction::Unchanged);
        assert_eq!(point(&data, 0), [10.0, 20.0]);
    }

    #[test]
    fn test_web_mercator_to_wgs84() {
        let mut data = dataset(Some(Crs::web_mercator()), &[[111319.49079327357, 0.0]]);
        let action = normalize_crs(&mut data, &Crs::wgs84()).unwrap();

        assert!(matches!(action, CrsAction::Reprojected { .. }));
        let [x, y] = point(&data, 0);
        assert!((x - 1.0).abs() < 1e-6);
        assert!(y.abs() < 1e-6);
        assert_eq!(data.crs.as_ref().and_then(|c| c.epsg_code()), Some(4326));
    }

    #[test]
    fn test_malformed_source_leaves_dataset_untouched() {
        let mut data = dataset(Some(Crs::new("NOT A CRS")), &[[1.0, 2.0]]);
        let before = data.clone();

        let err = normalize_crs(&mut data, &Crs::wgs84()).unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(data, before);
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let mut data = dataset(Some(Crs::web_mercator()), &[[222638.98, 111325.14]]);
        normalize_crs(&mut data, &Crs::wgs84()).unwrap();
        let once = data.clone();

        let action = normalize_crs(&mut data, &Crs::wgs84()).unwrap();

        assert_eq!(action, CrsAction::Unchanged);
        assert_eq!(data, once);
    }

    #[test]
    fn test_reproject_geometry_same_crs_is_clone() {
        let geom = Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]]);
        let out = reproject_geometry(&geom, &Crs::wgs84(), &Crs::epsg(4326)).unwrap();
        assert_eq!(out, geom);
    }
}
