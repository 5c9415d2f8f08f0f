use geo::Validation;

use crate::models::{to_geo_geometry, FeatureDataset, Geometry};

/// Validation result with details
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<GeometryIssue>,
}

/// Validation problem with location details
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryIssue {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, issues: Vec::new() }
    }

    /// Add an issue to the result
    pub fn add_issue(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.issues.push(GeometryIssue { location, reason });
    }

    /// First reason, for one-line reporting
    pub fn summary(&self) -> Option<&str> {
        self.issues.first().map(|i| i.reason.as_str())
    }

    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for issue in other.issues {
            self.add_issue(format!("{}.{}", prefix, issue.location), issue.reason);
        }
    }
}

/// Validate a geometry.
///
/// Structure is checked on the raw coordinates first (finite values,
/// minimum point counts, ring closure). Only a structurally sound geometry
/// goes on to the topological checks.
pub fn validate_geometry(geometry: &Geometry) -> ValidationResult {
    let structure = validate_structure(geometry);
    if !structure.is_valid || matches!(geometry, Geometry::GeometryCollection { .. }) {
        return structure;
    }
    topology_issues(geometry)
}

fn validate_structure(geometry: &Geometry) -> ValidationResult {
    match geometry {
        Geometry::Point { coordinates } => validate_coords("Point", std::slice::from_ref(coordinates)),
        Geometry::LineString { coordinates } => validate_line_string("LineString", coordinates),
        Geometry::Polygon { coordinates } => validate_polygon("Polygon", coordinates),
        Geometry::MultiPoint { coordinates } => {
            let mut result = validate_coords("MultiPoint", coordinates);
            if coordinates.is_empty() {
                result.add_issue("MultiPoint".to_string(), "MultiPoint has no points".to_string());
            }
            result
        }
        Geometry::MultiLineString { coordinates } => {
            let mut result = ValidationResult::valid();
            for (i, line) in coordinates.iter().enumerate() {
                result.absorb(&format!("MultiLineString[{}]", i), validate_line_string("LineString", line));
            }
            result
        }
        Geometry::MultiPolygon { coordinates } => {
            let mut result = ValidationResult::valid();
            for (i, polygon) in coordinates.iter().enumerate() {
                result.absorb(&format!("MultiPolygon[{}]", i), validate_polygon("Polygon", polygon));
            }
            result
        }
        Geometry::GeometryCollection { geometries } => {
            let mut result = ValidationResult::valid();
            for (i, member) in geometries.iter().enumerate() {
                result.absorb(&format!("GeometryCollection[{}]", i), validate_geometry(member));
            }
            result
        }
    }
}

pub(crate) fn is_finite(c: &[f64; 2]) -> bool {
    c[0].is_finite() && c[1].is_finite()
}

fn validate_coords(location: &str, coords: &[[f64; 2]]) -> ValidationResult {
    let mut result = ValidationResult::valid();
    for (i, coord) in coords.iter().enumerate() {
        if !is_finite(coord) {
            result.add_issue(format!("{}[{}]", location, i), "Coordinates must be finite".to_string());
        }
    }
    result
}

fn validate_line_string(location: &str, coords: &[[f64; 2]]) -> ValidationResult {
    // LineString must have at least 2 points
    if coords.len() < 2 {
        let mut result = ValidationResult::valid();
        result.add_issue(
            location.to_string(),
            format!("LineString must have at least 2 points, found {}", coords.len()),
        );
        return result;
    }
    let mut result = validate_coords(location, coords);
    if coords.windows(2).all(|w| w[0] == w[1]) {
        result.add_issue(location.to_string(), "LineString has zero length".to_string());
    }
    result
}

fn validate_polygon(location: &str, rings: &[Vec<[f64; 2]>]) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if rings.is_empty() {
        result.add_issue(location.to_string(), "Polygon has no rings".to_string());
        return result;
    }

    for (i, ring) in rings.iter().enumerate() {
        let ring_location = match i {
            0 => format!("{} exterior", location),
            _ => format!("{} interior[{}]", location, i - 1),
        };

        if ring.len() < 4 {
            result.add_issue(
                ring_location.clone(),
                format!("Ring must have at least 4 points, found {}", ring.len()),
            );
        }

        if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
            if first != last {
                result.add_issue(
                    ring_location.clone(),
                    "Ring must be closed (first point == last point)".to_string(),
                );
            }
        }

        for issue in validate_coords(&ring_location, ring).issues {
            result.add_issue(issue.location, issue.reason);
        }
    }

    result
}

/// Topological rules from `geo::Validation`: simple rings, holes inside
/// their shell, rings that do not cross and multi-polygon parts that do
/// not overlap.
fn topology_issues(geometry: &Geometry) -> ValidationResult {
    let mut result = ValidationResult::valid();
    let location = geometry.geometry_type().to_string();
    for error in to_geo_geometry(geometry).validation_errors() {
        result.add_issue(location.clone(), error.to_string());
    }
    result
}

/// Count invalid geometries in a dataset
pub fn count_invalid_geometries(dataset: &FeatureDataset) -> usize {
    invalid_geometry_indices(dataset).len()
}

/// Record indices whose non-null geometry fails validation
pub fn invalid_geometry_indices(dataset: &FeatureDataset) -> Vec<usize> {
    dataset
        .geometries()
        .filter(|(_, g)| !validate_geometry(g).is_valid)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
    }

    #[test]
    fn test_valid_point() {
        assert!(validate_geometry(&Geometry::point(1.0, 2.0)).is_valid);
    }

    #[test]
    fn test_non_finite_point() {
        let result = validate_geometry(&Geometry::point(f64::NAN, 2.0));
        assert!(!result.is_valid);
        assert_eq!(result.summary(), Some("Coordinates must be finite"));
    }

    #[test]
    fn test_short_line_string() {
        let result = validate_geometry(&Geometry::line_string(vec![[0.0, 0.0]]));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_valid_polygon() {
        assert!(validate_geometry(&Geometry::polygon(vec![square()])).is_valid);
    }

    #[test]
    fn test_unclosed_polygon() {
        let mut ring = square();
        ring.pop();
        ring.push([0.0, 0.5]);
        let result = validate_geometry(&Geometry::polygon(vec![ring]));
        assert!(!result.is_valid);
        assert!(result.issues.iter().any(|i| i.reason.contains("closed")));
    }

    #[test]
    fn test_bowtie_self_intersects() {
        let bowtie = vec![[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]];
        let result = validate_geometry(&Geometry::polygon(vec![bowtie]));
        assert!(!result.is_valid);
        assert!(result.summary().unwrap().contains("self-intersection"));
    }

    #[test]
    fn test_triangle_is_not_self_intersecting() {
        let triangle = vec![[0.0, 0.0], [4.0, 0.0], [2.0, 3.0], [0.0, 0.0]];
        assert!(validate_geometry(&Geometry::polygon(vec![triangle])).is_valid);
    }

    #[test]
    fn test_multi_polygon_locations() {
        let bad = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]];
        let geom = Geometry::MultiPolygon { coordinates: vec![vec![square()], vec![bad]] };
        let result = validate_geometry(&geom);
        assert!(!result.is_valid);
        assert!(result.issues[0].location.starts_with("MultiPolygon[1]"));
    }

    #[test]
    fn test_hole_outside_shell() {
        let hole = vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0], [5.0, 5.0]];
        let result = validate_geometry(&Geometry::polygon(vec![square(), hole]));
        assert!(!result.is_valid);
        assert!(result.summary().unwrap().contains("not contained"));
    }

    #[test]
    fn test_crossing_rings() {
        let shell = vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]];
        let hole = vec![[2.0, 2.0], [6.0, 2.0], [6.0, 3.0], [2.0, 3.0], [2.0, 2.0]];
        assert!(!validate_geometry(&Geometry::polygon(vec![shell, hole])).is_valid);
    }

    #[test]
    fn test_overlapping_multi_polygon_parts() {
        let shifted: Vec<[f64; 2]> = square().iter().map(|c| [c[0] + 0.5, c[1]]).collect();
        let geom = Geometry::MultiPolygon { coordinates: vec![vec![square()], vec![shifted]] };
        let result = validate_geometry(&geom);
        assert!(!result.is_valid);
        assert_eq!(result.issues[0].location, "MultiPolygon");
    }

    #[test]
    fn test_multi_polygon_parts_touching_at_a_corner() {
        let corner: Vec<[f64; 2]> = square().iter().map(|c| [c[0] + 1.0, c[1] + 1.0]).collect();
        let geom = Geometry::MultiPolygon { coordinates: vec![vec![square()], vec![corner]] };
        assert!(validate_geometry(&geom).is_valid);
    }

    #[test]
    fn test_invalid_geometries_are_counted() {
        use layerprep_core::models::{FeatureRecord, GeometryType};

        let hole = vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0], [5.0, 5.0]];
        let dataset = FeatureDataset {
            name: "parcels".to_string(),
            crs: None,
            geometry_type: GeometryType::Polygon,
            fields: vec![],
            records: vec![
                FeatureRecord::new(Some(Geometry::polygon(vec![square()]))),
                FeatureRecord::new(Some(Geometry::polygon(vec![square(), hole]))),
                FeatureRecord::new(None),
            ],
        };
        assert_eq!(invalid_geometry_indices(&dataset), vec![1]);
        assert_eq!(count_invalid_geometries(&dataset), 1);
    }
}
