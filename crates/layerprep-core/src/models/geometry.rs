//! Canonical geometry types used across all layerprep crates.
//!
//! These types provide a bridge between GeoJSON serialization and the
//! computational geo crate types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of WGS 84, the default target system
pub const WGS84_EPSG: u32 = 4326;

/// Coordinate Reference System.
///
/// `definition` is anything PROJ accepts as a CRS: an `AUTHORITY:CODE`
/// string such as `EPSG:4326` or a WKT definition read from a `.prj` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub definition: String,
    pub name: Option<String>,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(definition: impl Into<String>) -> Self {
        Self { definition: definition.into(), name: None }
    }

    /// Build a CRS from an EPSG code
    pub fn epsg(code: u32) -> Self {
        Self::new(format!("EPSG:{}", code))
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::epsg(WGS84_EPSG).with_name("WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::epsg(3857).with_name("Web Mercator")
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse a user supplied CRS string.
    ///
    /// Accepts `EPSG:n`, a bare EPSG number, or the labels used by the upload
    /// form ("WGS84 (EPSG:4326)").
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if let Ok(code) = trimmed.parse::<u32>() {
            return Self::well_known(code);
        }
        match find_epsg_code(trimmed) {
            Some(code) if !trimmed.contains('[') => Self::well_known(code),
            _ => Self::new(trimmed),
        }
    }

    /// EPSG CRS, named when it is one of the web mapping systems
    fn well_known(code: u32) -> Self {
        match code {
            WGS84_EPSG => Self::wgs84(),
            3857 => Self::web_mercator(),
            _ => Self::epsg(code),
        }
    }

    /// EPSG code of this CRS, when one can be resolved from the definition
    pub fn epsg_code(&self) -> Option<u32> {
        find_epsg_code(&self.definition)
    }

    /// Whether two definitions denote the same system.
    ///
    /// Definitions that both resolve to an EPSG code are compared by code,
    /// anything else by exact definition text.
    pub fn same_as(&self, other: &Crs) -> bool {
        match (self.epsg_code(), other.epsg_code()) {
            (Some(a), Some(b)) => a == b,
            _ => self.definition.trim() == other.definition.trim(),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, self.epsg_code()) {
            (Some(name), Some(code)) => write!(f, "EPSG:{} ({})", code, name),
            (None, Some(code)) => write!(f, "EPSG:{}", code),
            (Some(name), None) => write!(f, "{}", name),
            (None, None) => write!(f, "custom CRS"),
        }
    }
}

/// Find an EPSG code in a CRS definition.
///
/// Looks for the `EPSG:` prefix first, then for the outermost
/// `AUTHORITY["EPSG","n"]` / `ID["EPSG",n]` clause, which in WKT is the last
/// one in the text.
pub fn find_epsg_code(definition: &str) -> Option<u32> {
    let upper = definition.to_ascii_uppercase();

    if !upper.contains('[') {
        if let Some(start) = upper.find("EPSG:") {
            let digits: String =
                upper[start + 5..].chars().take_while(|c| c.is_ascii_digit()).collect();
            return digits.parse().ok();
        }
        return None;
    }

    for marker in ["AUTHORITY[\"EPSG\",", "ID[\"EPSG\","] {
        if let Some(start) = upper.rfind(marker) {
            let digits: String = upper[start + marker.len()..]
                .chars()
                .skip_while(|c| *c == '"' || c.is_whitespace())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(code) = digits.parse() {
                return Some(code);
            }
        }
    }

    None
}

/// Native geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    /// Collapse single/multi variants of a family to the single-part name.
    ///
    /// Types outside the three families are returned unchanged.
    pub fn canonical(self) -> GeometryType {
        match self {
            GeometryType::Point | GeometryType::MultiPoint => GeometryType::Point,
            GeometryType::LineString | GeometryType::MultiLineString => GeometryType::LineString,
            GeometryType::Polygon | GeometryType::MultiPolygon => GeometryType::Polygon,
            other => other,
        }
    }

    /// Whether a single-layer feature service can hold this type
    pub fn is_supported(self) -> bool {
        !matches!(self, GeometryType::GeometryCollection)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValidityMode {
    /// Strict validation - report invalid geometries, never modify them
    Strict,
    /// Lenient validation - attempt to fix invalid geometries before publishing
    #[default]
    Lenient,
}

/// GeoJSON-compatible geometry representation
///
/// This enum directly maps to GeoJSON geometry types with coordinate arrays.
/// It can be serialized/deserialized as GeoJSON and converted to/from `geo` crate types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { coordinates: [x, y] }
    }

    /// Create a LineString geometry
    pub fn line_string(coords: Vec<[f64; 2]>) -> Self {
        Geometry::LineString { coordinates: coords }
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Get the native geometry type
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPoint { .. } => GeometryType::MultiPoint,
            Geometry::MultiLineString { .. } => GeometryType::MultiLineString,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
            Geometry::GeometryCollection { .. } => GeometryType::GeometryCollection,
        }
    }

    /// Visit every coordinate in order
    pub fn for_each_coord<F: FnMut(&[f64; 2])>(&self, f: &mut F) {
        match self {
            Geometry::Point { coordinates } => f(coordinates),
            Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
                for c in coordinates {
                    f(c);
                }
            }
            Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
                for c in coordinates.iter().flatten() {
                    f(c);
                }
            }
            Geometry::MultiPolygon { coordinates } => {
                for c in coordinates.iter().flatten().flatten() {
                    f(c);
                }
            }
            Geometry::GeometryCollection { geometries } => {
                for g in geometries {
                    g.for_each_coord(f);
                }
            }
        }
    }

    /// Number of coordinates
    pub fn coord_count(&self) -> usize {
        let mut count = 0;
        self.for_each_coord(&mut |_| count += 1);
        count
    }

    /// Try to parse from a serde_json::Value (GeoJSON)
    pub fn from_geojson(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Convert to serde_json::Value (GeoJSON)
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
