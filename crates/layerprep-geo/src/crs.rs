//! CRS inspection

use layerprep_core::models::{CrsReport, WGS84_EPSG};

use crate::models::Crs;

const WEB_MERCATOR_EPSG: u32 = 3857;

/// Whether a CRS uses angular (longitude/latitude) coordinates.
///
/// EPSG codes 4000-4999 are geographic systems; WKT definitions are judged
/// by their root node.
pub fn is_geographic(crs: &Crs) -> bool {
    if let Some(code) = crs.epsg_code() {
        return (4000..5000).contains(&code);
    }
    let root = crs.definition.trim_start().to_ascii_uppercase();
    root.starts_with("GEOGCS") || root.starts_with("GEOGCRS") || root.starts_with("GEODCRS")
}

/// Describe a dataset's CRS with advice for web publishing
pub fn describe_crs(crs: Option<&Crs>) -> CrsReport {
    let Some(crs) = crs else {
        return CrsReport {
            has_crs: false,
            recommendations: vec!["No CRS defined - consider setting to WGS84 (EPSG:4326)".to_string()],
            ..Default::default()
        };
    };

    let epsg = crs.epsg_code();
    let geographic = is_geographic(crs);
    let advice = match epsg {
        Some(WGS84_EPSG) => "WGS84 - Good for web mapping",
        Some(WEB_MERCATOR_EPSG) => "Web Mercator - Optimized for web mapping",
        _ if geographic => "Consider reprojecting to Web Mercator (EPSG:3857) for web mapping",
        _ => "Consider the coordinate system compatibility with your target layers",
    };

    CrsReport {
        has_crs: true,
        definition: Some(crs.definition.clone()),
        name: crs.name.clone(),
        epsg,
        is_geographic: geographic,
        recommendations: vec![advice.to_string()],
    }
}
