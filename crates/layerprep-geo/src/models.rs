//! Geometry models for layerprep-geo.
//!
//! This module re-exports canonical types from `layerprep-core` and provides
//! conversions to/from the `geo` crate.

use geo::{BoundingRect, Geometry as GeoGeometry};

// Re-export canonical types from layerprep-core
pub use layerprep_core::models::{Crs, FeatureDataset, Geometry, GeometryType, ValidityMode};

fn to_line_string(coords: &[[f64; 2]]) -> geo::LineString {
    geo::LineString::new(coords.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
}

fn to_polygon(rings: &[Vec<[f64; 2]>]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => geo::Polygon::new(
            to_line_string(exterior),
            interiors.iter().map(|r| to_line_string(r)).collect(),
        ),
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

fn from_line_string(ls: &geo::LineString) -> Vec<[f64; 2]> {
    ls.coords().map(|c| [c.x, c.y]).collect()
}

fn from_polygon(p: &geo::Polygon) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(p.exterior())
        .chain(p.interiors())
        .map(from_line_string)
        .collect()
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::LineString { coordinates } => GeoGeometry::LineString(to_line_string(coordinates)),
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(to_polygon(coordinates)),
        Geometry::MultiPoint { coordinates } => GeoGeometry::MultiPoint(geo::MultiPoint::new(
            coordinates.iter().map(|c| geo::Point::new(c[0], c[1])).collect(),
        )),
        Geometry::MultiLineString { coordinates } => GeoGeometry::MultiLineString(
            geo::MultiLineString::new(coordinates.iter().map(|l| to_line_string(l)).collect()),
        ),
        Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(geo::MultiPolygon::new(
            coordinates.iter().map(|p| to_polygon(p)).collect(),
        )),
        Geometry::GeometryCollection { geometries } => GeoGeometry::GeometryCollection(
            geo::GeometryCollection::new_from(geometries.iter().map(to_geo_geometry).collect()),
        ),
    }
}

/// Convert a geo::Geometry to a canonical Geometry
pub fn from_geo_geometry(geom: &GeoGeometry) -> Geometry {
    match geom {
        GeoGeometry::Point(p) => Geometry::Point { coordinates: [p.x(), p.y()] },
        GeoGeometry::Line(l) => Geometry::LineString {
            coordinates: vec![[l.start.x, l.start.y], [l.end.x, l.end.y]],
        },
        GeoGeometry::LineString(ls) => Geometry::LineString { coordinates: from_line_string(ls) },
        GeoGeometry::Polygon(p) => Geometry::Polygon { coordinates: from_polygon(p) },
        GeoGeometry::MultiPoint(mp) => Geometry::MultiPoint {
            coordinates: mp.iter().map(|p| [p.x(), p.y()]).collect(),
        },
        GeoGeometry::MultiLineString(mls) => Geometry::MultiLineString {
            coordinates: mls.iter().map(from_line_string).collect(),
        },
        GeoGeometry::MultiPolygon(mp) => Geometry::MultiPolygon {
            coordinates: mp.iter().map(from_polygon).collect(),
        },
        GeoGeometry::GeometryCollection(gc) => Geometry::GeometryCollection {
            geometries: gc.iter().map(from_geo_geometry).collect(),
        },
        GeoGeometry::Rect(r) => from_geo_geometry(&GeoGeometry::Polygon(r.to_polygon())),
        GeoGeometry::Triangle(t) => from_geo_geometry(&GeoGeometry::Polygon(t.to_polygon())),
    }
}

/// Collapse a geo MultiPolygon into the simplest canonical form
pub fn from_geo_multi_polygon(mp: geo::MultiPolygon) -> Option<Geometry> {
    let mut polygons = mp.0;
    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(|p| Geometry::Polygon { coordinates: from_polygon(&p) }),
        _ => Some(Geometry::MultiPolygon { coordinates: polygons.iter().map(from_polygon).collect() }),
    }
}

/// Extension trait for Geometry with geo-crate operations
pub trait GeometryExt {
    /// Convert to geo::Geometry
    fn to_geo(&self) -> GeoGeometry;

    /// `[min_x, min_y, max_x, max_y]` over finite coordinates
    fn bounding_box(&self) -> Option<[f64; 4]>;
}

impl GeometryExt for Geometry {
    fn to_geo(&self) -> GeoGeometry {
        to_geo_geometry(self)
    }

    fn bounding_box(&self) -> Option<[f64; 4]> {
        let mut finite = true;
        self.for_each_coord(&mut |c: &[f64; 2]| finite &= c[0].is_finite() && c[1].is_finite());
        if !finite {
            return None;
        }
        self.to_geo()
            .bounding_rect()
            .map(|r| [r.min().x, r.min().y, r.max().x, r.max().y])
    }
}

/// Combined bounding box of every non-null geometry in a dataset
pub fn dataset_bounds(dataset: &FeatureDataset) -> Option<[f64; 4]> {
    dataset
        .geometries()
        .filter_map(|(_, g)| g.bounding_box())
        .reduce(|a, b| [a[0].min(b[0]), a[1].min(b[1]), a[2].max(b[2]), a[3].max(b[3])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerprep_core::models::FeatureRecord;

    #[test]
    fn test_point_roundtrip() {
        let geom = Geometry::point(115.0, -8.5);
        let back = from_geo_geometry(&to_geo_geometry(&geom));
        assert_eq!(geom, back);
    }

    #[test]
    fn test_polygon_with_hole_roundtrip() {
        let geom = Geometry::polygon(vec![
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
            vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
        ]);
        let back = from_geo_geometry(&to_geo_geometry(&geom));
        assert_eq!(geom, back);
    }

    #[test]
    fn test_collection_roundtrip() {
        let geom = Geometry::GeometryCollection {
            geometries: vec![Geometry::point(1.0, 2.0), Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]])],
        };
        let back = from_geo_geometry(&to_geo_geometry(&geom));
        assert_eq!(geom, back);
    }

    #[test]
    fn test_bounding_box() {
        let geom = Geometry::line_string(vec![[-1.0, 5.0], [3.0, -2.0]]);
        assert_eq!(geom.bounding_box(), Some([-1.0, -2.0, 3.0, 5.0]));

        let broken = Geometry::line_string(vec![[f64::NAN, 0.0], [1.0, 1.0]]);
        assert_eq!(broken.bounding_box(), None);
    }

    #[test]
    fn test_dataset_bounds_skip_null_geometry() {
        let dataset = FeatureDataset {
            name: "pts".to_string(),
            crs: None,
            geometry_type: GeometryType::Point,
            fields: vec![],
            records: vec![
                FeatureRecord::new(Some(Geometry::point(1.0, 1.0))),
                FeatureRecord::new(None),
                FeatureRecord::new(Some(Geometry::point(-3.0, 4.0))),
            ],
        };
        assert_eq!(dataset_bounds(&dataset), Some([-3.0, 1.0, 1.0, 4.0]));
    }

    #[test]
    fn test_multi_polygon_collapse() {
        let square = geo::Polygon::new(
            geo::LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        let single = from_geo_multi_polygon(geo::MultiPolygon::new(vec![square.clone()])).unwrap();
        assert_eq!(single.geometry_type(), GeometryType::Polygon);

        let multi = from_geo_multi_polygon(geo::MultiPolygon::new(vec![square.clone(), square])).unwrap();
        assert_eq!(multi.geometry_type(), GeometryType::MultiPolygon);

        assert_eq!(from_geo_multi_polygon(geo::MultiPolygon::new(vec![])), None);
    }
}
