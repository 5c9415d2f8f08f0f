//! Geometry repair
//!
//! Structural clean-up first (non-finite and repeated coordinates, open
//! rings, degenerate parts). Polygonal geometry that is still topologically
//! invalid (self-intersecting rings, overlapping parts) is rebuilt through a
//! boolean union, which splits or merges it into valid pieces.

use geo::BooleanOps;
use serde::Serialize;

use crate::models::{from_geo_multi_polygon, to_geo_geometry, Geometry};
use crate::validation::{is_finite, validate_geometry};

/// What repair did to a geometry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RepairOutcome {
    /// The geometry was already valid
    Unchanged,
    /// A valid replacement
    Repaired(Geometry),
    /// Nothing usable could be recovered
    Unrepairable(String),
}

impl RepairOutcome {
    pub fn is_unrepairable(&self) -> bool {
        matches!(self, RepairOutcome::Unrepairable(_))
    }
}

/// Attempt to fix an invalid geometry
pub fn repair_geometry(geometry: &Geometry) -> RepairOutcome {
    let before = validate_geometry(geometry);
    if before.is_valid {
        return RepairOutcome::Unchanged;
    }
    let reason = before.summary().unwrap_or("invalid geometry").to_string();

    let Some(cleaned) = clean(geometry) else {
        return RepairOutcome::Unrepairable(format!("{}; no valid parts remain", reason));
    };
    if validate_geometry(&cleaned).is_valid {
        return RepairOutcome::Repaired(cleaned);
    }

    match rebuild_polygonal(&cleaned) {
        Some(rebuilt) if validate_geometry(&rebuilt).is_valid => RepairOutcome::Repaired(rebuilt),
        _ => RepairOutcome::Unrepairable(reason),
    }
}

/// Drop non-finite coordinates and consecutive duplicates
fn clean_coords(coords: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut out: Vec<[f64; 2]> = Vec::with_capacity(coords.len());
    for c in coords.iter().filter(|c| is_finite(c)) {
        if out.last() != Some(c) {
            out.push(*c);
        }
    }
    out
}

fn clean_line(coords: &[[f64; 2]]) -> Option<Vec<[f64; 2]>> {
    let line = clean_coords(coords);
    (line.len() >= 2).then_some(line)
}

fn clean_ring(coords: &[[f64; 2]]) -> Option<Vec<[f64; 2]>> {
    let mut ring = clean_coords(coords);
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    // three distinct corners plus the closing point
    (ring.len() >= 4).then_some(ring)
}

/// A polygon survives only if its exterior does; degenerate holes are dropped
fn clean_polygon(rings: &[Vec<[f64; 2]>]) -> Option<Vec<Vec<[f64; 2]>>> {
    let (exterior, interiors) = rings.split_first()?;
    let mut polygon = vec![clean_ring(exterior)?];
    polygon.extend(interiors.iter().filter_map(|r| clean_ring(r)));
    Some(polygon)
}

fn clean(geometry: &Geometry) -> Option<Geometry> {
    match geometry {
        Geometry::Point { coordinates } => {
            is_finite(coordinates).then(|| geometry.clone())
        }
        Geometry::LineString { coordinates } => {
            clean_line(coordinates).map(|coordinates| Geometry::LineString { coordinates })
        }
        Geometry::Polygon { coordinates } => {
            clean_polygon(coordinates).map(|coordinates| Geometry::Polygon { coordinates })
        }
        Geometry::MultiPoint { coordinates } => {
            let points: Vec<[f64; 2]> = coordinates.iter().copied().filter(is_finite).collect();
            (!points.is_empty()).then_some(Geometry::MultiPoint { coordinates: points })
        }
        Geometry::MultiLineString { coordinates } => {
            let lines: Vec<_> = coordinates.iter().filter_map(|l| clean_line(l)).collect();
            (!lines.is_empty()).then_some(Geometry::MultiLineString { coordinates: lines })
        }
        Geometry::MultiPolygon { coordinates } => {
            let polygons: Vec<_> = coordinates.iter().filter_map(|p| clean_polygon(p)).collect();
            (!polygons.is_empty()).then_some(Geometry::MultiPolygon { coordinates: polygons })
        }
        Geometry::GeometryCollection { geometries } => {
            let members: Vec<Geometry> = geometries.iter().filter_map(clean).collect();
            (!members.is_empty()).then_some(Geometry::GeometryCollection { geometries: members })
        }
    }
}

/// Union a polygonal geometry with nothing to resolve crossings and overlaps
fn rebuild_polygonal(geometry: &Geometry) -> Option<Geometry> {
    let empty = geo::MultiPolygon::<f64>::new(vec![]);
    let unioned = match to_geo_geometry(geometry) {
        geo::Geometry::Polygon(p) => p.union(&empty),
        geo::Geometry::MultiPolygon(mp) => mp.union(&empty),
        _ => return None,
    };
    from_geo_multi_polygon(unioned)
}
