//! Shapefile geometry reader
//!
//! Reads an extracted component set into a [`FeatureDataset`]. Attribute
//! values are only read through the dBase reader when the attribute table
//! inspector found usable columns; otherwise geometry is read on its own
//! and a synthetic identifier field is added. Shapes and attribute rows are
//! read separately and paired by position, so a short table leaves the
//! trailing features with null attributes instead of dropping them.

use serde_json::Value;
use shapefile::dbase::{self, encoding::EncodingRs, FieldValue as DbaseFieldValue};
use shapefile::{PolygonRing, Shape, ShapeReader, ShapeType};
use std::fs;
use std::io::BufReader;
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::formats::archive::ExtractedSet;
use crate::formats::attributes::{AttributeTableInfo, DbfField};
use crate::formats::encoding::{encoding_for_code_page, fallback_encoding, read_code_page};
use crate::models::{
    Crs, FeatureDataset, FeatureRecord, Field, FieldKind, Geometry, GeometryType,
};

/// Read an extracted shapefile set.
///
/// `id_field` names the synthetic identifier added when the attribute table
/// has no usable columns.
pub fn read_geometry(
    set: &ExtractedSet,
    attributes: &AttributeTableInfo,
    id_field: &str,
) -> Result<FeatureDataset> {
    let reader = ShapeReader::from_path(&set.shp)
        .map_err(|e| IngestError::shapefile("shp", format!("Failed to open shapefile: {}", e)))?;
    let declared_type = reader.header().shape_type;
    let geometries = read_shapes(reader)?;

    let (fields, records) = match set.dbf.as_deref() {
        Some(dbf) if attributes.is_usable() => {
            read_with_attributes(dbf, set.cpg.as_deref(), attributes, geometries)?
        }
        _ => (Vec::new(), geometries.into_iter().map(FeatureRecord::new).collect()),
    };

    if records.is_empty() {
        return Err(IngestError::NoFeatures);
    }
    if declared_type == ShapeType::NullShape {
        return Err(IngestError::NoGeometry);
    }

    let crs = match &set.prj {
        Some(path) => read_prj(path)?,
        None => None,
    };

    let mut dataset = assemble_dataset(&set.base_name, crs, fields, records)?;
    if attributes.needs_synthetic_id() {
        tracing::info!(field = id_field, "Adding synthetic identifier field");
        dataset.add_sequence_field(id_field);
    }

    tracing::info!(
        name = %dataset.name,
        features = dataset.feature_count(),
        geometry_type = %dataset.geometry_type,
        fields = dataset.fields.len(),
        "Read shapefile"
    );

    Ok(dataset)
}

/// Build a dataset from records, enforcing the single-family rule.
///
/// The canonical geometry type comes from the first non-null geometry. A
/// later geometry from a different family is a hard failure.
pub fn assemble_dataset(
    name: &str,
    crs: Option<Crs>,
    fields: Vec<Field>,
    records: Vec<FeatureRecord>,
) -> Result<FeatureDataset> {
    if records.is_empty() {
        return Err(IngestError::NoFeatures);
    }

    let mut canonical: Option<GeometryType> = None;
    for (idx, record) in records.iter().enumerate() {
        let Some(geometry) = &record.geometry else {
            continue;
        };
        let family = geometry.geometry_type().canonical();
        match canonical {
            None => canonical = Some(family),
            Some(expected) if expected != family => {
                return Err(IngestError::MixedGeometryFamily {
                    expected: expected.to_string(),
                    found: geometry.geometry_type().to_string(),
                    feature_index: idx,
                });
            }
            Some(_) => {}
        }
    }

    let geometry_type = canonical.ok_or(IngestError::AllGeometryNull { count: records.len() })?;

    Ok(FeatureDataset {
        name: name.to_string(),
        crs,
        geometry_type,
        fields,
        records,
    })
}

fn read_shapes(mut reader: ShapeReader<BufReader<fs::File>>) -> Result<Vec<Option<Geometry>>> {
    let mut geometries = Vec::new();
    for shape in reader.iter_shapes() {
        let shape =
            shape.map_err(|e| IngestError::shapefile("shp", format!("Failed to read shape: {}", e)))?;
        geometries.push(convert_shape(&shape));
    }
    Ok(geometries)
}

fn read_with_attributes(
    dbf: &Path,
    cpg: Option<&Path>,
    attributes: &AttributeTableInfo,
    geometries: Vec<Option<Geometry>>,
) -> Result<(Vec<Field>, Vec<FeatureRecord>)> {
    let mut fields: Vec<Field> = Vec::with_capacity(attributes.fields.len());
    for descriptor in &attributes.fields {
        if !fields.iter().any(|f| f.name == descriptor.name) {
            fields.push(Field::new(descriptor.name.as_str(), descriptor.kind()));
        }
    }

    let rows = read_rows(dbf, cpg)?;
    if rows.len() != geometries.len() {
        tracing::warn!(
            shapes = geometries.len(),
            rows = rows.len(),
            "Attribute row count differs from shape count"
        );
    }

    let mut rows = rows.into_iter();
    let records: Vec<FeatureRecord> = geometries
        .into_iter()
        .map(|geometry| {
            let mut record = FeatureRecord::new(geometry);
            match rows.next() {
                Some(row) => {
                    for (name, value) in row {
                        record.attributes.insert(name.trim().to_string(), convert_dbase_value(&value));
                    }
                }
                None => {
                    for field in &fields {
                        record.attributes.insert(field.name.clone(), Value::Null);
                    }
                }
            }
            record
        })
        .collect();

    refine_numeric_kinds(&mut fields, &attributes.fields, &records);
    Ok((fields, records))
}

/// Read every attribute row, decoding text with the declared code page.
///
/// Without a recognized .cpg the rows are decoded as strict UTF-8 and read
/// again with the fallback encoding when that fails.
fn read_rows(dbf: &Path, cpg: Option<&Path>) -> Result<Vec<dbase::Record>> {
    let declared = match cpg {
        Some(path) => read_code_page(path)?,
        None => None,
    };
    let dbf_error =
        |e: dbase::Error| IngestError::shapefile("dbf", format!("Failed to read attributes: {}", e));

    if let Some(label) = declared {
        match encoding_for_code_page(&label) {
            Some(encoding) => {
                tracing::debug!(code_page = %label, encoding = encoding.name(), "Decoding attributes");
                return read_records(dbf, EncodingRs::from(encoding)).map_err(dbf_error);
            }
            None => tracing::warn!(code_page = %label, "Unrecognized code page, detecting encoding"),
        }
    }

    match read_records(dbf, dbase::Unicode) {
        Err(e) if matches!(e.kind(), dbase::ErrorKind::StringDecodeError(_)) => {
            tracing::info!(encoding = fallback_encoding().name(), "Attribute text is not UTF-8");
            read_records(dbf, EncodingRs::from(fallback_encoding()))
        }
        other => other,
    }
    .map_err(dbf_error)
}

fn read_records<E: dbase::Encoding + 'static>(
    path: &Path,
    encoding: E,
) -> std::result::Result<Vec<dbase::Record>, dbase::Error> {
    dbase::Reader::from_path_with_encoding(path, encoding)?.read()
}

/// A numeric column whose values are all whole numbers is an integer column
fn refine_numeric_kinds(fields: &mut [Field], descriptors: &[DbfField], records: &[FeatureRecord]) {
    for field in fields.iter_mut().filter(|f| f.kind == FieldKind::Double) {
        if !descriptors.iter().any(|d| d.name == field.name && d.type_code == 'N') {
            continue;
        }
        let mut values = records
            .iter()
            .map(|r| r.value(&field.name))
            .filter(|v| !v.is_null())
            .peekable();
        if values.peek().is_some() && values.all(|v| v.is_i64() || v.is_u64()) {
            field.kind = FieldKind::Integer;
        }
    }
}

/// Convert a shape to a 2D geometry. Null and empty shapes give `None`.
fn convert_shape(shape: &Shape) -> Option<Geometry> {
    match shape {
        Shape::NullShape => None,
        Shape::Point(p) => Some(Geometry::point(p.x, p.y)),
        Shape::PointM(p) => Some(Geometry::point(p.x, p.y)),
        Shape::PointZ(p) => Some(Geometry::point(p.x, p.y)),
        Shape::Multipoint(mp) => multipoint(mp.points().iter().map(|p| [p.x, p.y]).collect()),
        Shape::MultipointM(mp) => multipoint(mp.points().iter().map(|p| [p.x, p.y]).collect()),
        Shape::MultipointZ(mp) => multipoint(mp.points().iter().map(|p| [p.x, p.y]).collect()),
        Shape::Polyline(pl) => lines(
            pl.parts()
                .iter()
                .map(|part| part.iter().map(|p| [p.x, p.y]).collect())
                .collect(),
        ),
        Shape::PolylineM(pl) => lines(
            pl.parts()
                .iter()
                .map(|part| part.iter().map(|p| [p.x, p.y]).collect())
                .collect(),
        ),
        Shape::PolylineZ(pl) => lines(
            pl.parts()
                .iter()
                .map(|part| part.iter().map(|p| [p.x, p.y]).collect())
                .collect(),
        ),
        Shape::Polygon(pg) => polygons(pg.rings().iter().map(|r| ring_xy(r, |p| [p.x, p.y])).collect()),
        Shape::PolygonM(pg) => polygons(pg.rings().iter().map(|r| ring_xy(r, |p| [p.x, p.y])).collect()),
        Shape::PolygonZ(pg) => polygons(pg.rings().iter().map(|r| ring_xy(r, |p| [p.x, p.y])).collect()),
        Shape::Multipatch(patch) => {
            use shapefile::Patch;
            let geometries: Vec<Geometry> = patch
                .patches()
                .iter()
                .map(|patch| match patch {
                    Patch::TriangleStrip(points)
                    | Patch::TriangleFan(points)
                    | Patch::OuterRing(points)
                    | Patch::InnerRing(points)
                    | Patch::FirstRing(points)
                    | Patch::Ring(points) => points.iter().map(|p| [p.x, p.y]).collect::<Vec<_>>(),
                })
                .filter(|ring| !ring.is_empty())
                .map(|ring| Geometry::polygon(vec![ring]))
                .collect();
            if geometries.is_empty() {
                None
            } else {
                Some(Geometry::GeometryCollection { geometries })
            }
        }
    }
}

/// Ring coordinates tagged with whether the ring is an outer boundary
fn ring_xy<P>(ring: &PolygonRing<P>, xy: impl Fn(&P) -> [f64; 2]) -> (bool, Vec<[f64; 2]>) {
    let outer = matches!(ring, PolygonRing::Outer(_));
    (outer, ring.points().iter().map(xy).collect())
}

fn multipoint(coordinates: Vec<[f64; 2]>) -> Option<Geometry> {
    match coordinates.len() {
        0 => None,
        _ => Some(Geometry::MultiPoint { coordinates }),
    }
}

fn lines(mut parts: Vec<Vec<[f64; 2]>>) -> Option<Geometry> {
    parts.retain(|p| !p.is_empty());
    match parts.len() {
        0 => None,
        1 => Some(Geometry::LineString { coordinates: parts.remove(0) }),
        _ => Some(Geometry::MultiLineString { coordinates: parts }),
    }
}

/// Group rings into polygons: an outer ring starts a polygon, inner rings
/// attach to the polygon before them.
fn polygons(rings: Vec<(bool, Vec<[f64; 2]>)>) -> Option<Geometry> {
    let mut groups: Vec<Vec<Vec<[f64; 2]>>> = Vec::new();
    for (outer, ring) in rings {
        if ring.is_empty() {
            continue;
        }
        match groups.last_mut() {
            Some(group) if !outer => group.push(ring),
            _ => groups.push(vec![ring]),
        }
    }

    match groups.len() {
        0 => None,
        1 => Some(Geometry::Polygon { coordinates: groups.remove(0) }),
        _ => Some(Geometry::MultiPolygon { coordinates: groups }),
    }
}

/// Convert dBase field value to JSON value
fn convert_dbase_value(value: &DbaseFieldValue) -> Value {
    match value {
        DbaseFieldValue::Character(Some(s)) => {
            let trimmed = s.trim_end();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
        DbaseFieldValue::Character(None) => Value::Null,
        DbaseFieldValue::Numeric(Some(n)) => number(*n),
        DbaseFieldValue::Numeric(None) => Value::Null,
        DbaseFieldValue::Logical(Some(b)) => Value::Bool(*b),
        DbaseFieldValue::Logical(None) => Value::Null,
        DbaseFieldValue::Date(Some(date)) => {
            Value::String(format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()))
        }
        DbaseFieldValue::Date(None) => Value::Null,
        DbaseFieldValue::Float(Some(f)) => number(*f as f64),
        DbaseFieldValue::Float(None) => Value::Null,
        DbaseFieldValue::Integer(i) => Value::from(*i),
        DbaseFieldValue::Currency(c) => number(*c),
        DbaseFieldValue::DateTime(dt) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Double(d) => number(*d),
        DbaseFieldValue::Memo(s) => Value::String(s.clone()),
    }
}

/// Whole numbers come back as integers so identifiers compare cleanly
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Read a .prj file into a CRS. An empty file means no CRS.
pub fn read_prj(path: &Path) -> Result<Option<Crs>> {
    let bytes = fs::read(path)?;
    Ok(resolve_prj(&String::from_utf8_lossy(&bytes)))
}

/// Resolve a .prj definition.
///
/// An EPSG authority wins; WGS 84 geographic definitions without one map to
/// EPSG:4326; anything else is kept as WKT for PROJ to interpret.
pub fn resolve_prj(text: &str) -> Option<Crs> {
    let wkt = text.trim();
    if wkt.is_empty() {
        return None;
    }

    let name = wkt_name(wkt);
    if let Some(code) = crate::models::find_epsg_code(wkt) {
        let crs = Crs::epsg(code);
        return Some(match name {
            Some(name) => crs.with_name(name),
            None => crs,
        });
    }

    if is_wgs84_geographic(wkt) {
        return Some(Crs::wgs84());
    }

    let crs = Crs::new(wkt);
    Some(match name {
        Some(name) => crs.with_name(name),
        None => crs,
    })
}

fn is_wgs84_geographic(wkt: &str) -> bool {
    let upper = wkt.to_ascii_uppercase();
    let projected = upper.starts_with("PROJCS") || upper.starts_with("PROJCRS");
    let wgs84 = upper.contains("GCS_WGS_1984")
        || upper.contains("\"WGS 84\"")
        || upper.contains("\"WGS84\"");
    !projected && wgs84
}

/// The quoted name of the outermost WKT node
fn wkt_name(wkt: &str) -> Option<String> {
    let start = wkt.find("[\"")? + 2;
    let end = wkt[start..].find('"')?;
    let name = wkt[start..start + end].trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prj_with_authority() {
        let wkt = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]],AUTHORITY["EPSG","3857"]]"#;
        let crs = resolve_prj(wkt).unwrap();
        assert_eq!(crs.epsg_code(), Some(3857));
        assert_eq!(crs.name.as_deref(), Some("WGS 84 / Pseudo-Mercator"));
    }

    #[test]
    fn test_resolve_esri_wgs84() {
        let wkt = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        let crs = resolve_prj(wkt).unwrap();
        assert_eq!(crs.epsg_code(), Some(4326));
    }

    #[test]
    fn test_resolve_projected_without_authority_keeps_wkt() {
        let wkt = r#"PROJCS["NAD_1983_UTM_Zone_10N",GEOGCS["GCS_North_American_1983"],PROJECTION["Transverse_Mercator"]]"#;
        let crs = resolve_prj(wkt).unwrap();
        assert_eq!(crs.epsg_code(), None);
        assert_eq!(crs.definition, wkt);
        assert_eq!(crs.name.as_deref(), Some("NAD_1983_UTM_Zone_10N"));
    }

    #[test]
    fn test_resolve_empty_prj() {
        assert_eq!(resolve_prj("  \n"), None);
    }

    #[test]
    fn test_polygon_ring_grouping() {
        let outer_a = vec![[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0], [0.0, 0.0]];
        let hole = vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]];
        let outer_b = vec![[5.0, 5.0], [5.0, 6.0], [6.0, 6.0], [6.0, 5.0], [5.0, 5.0]];

        let single = polygons(vec![(true, outer_a.clone()), (false, hole.clone())]).unwrap();
        assert_eq!(single.geometry_type(), GeometryType::Polygon);

        let multi = polygons(vec![(true, outer_a), (false, hole), (true, outer_b)]).unwrap();
        match multi {
            Geometry::MultiPolygon { coordinates } => {
                assert_eq!(coordinates.len(), 2);
                assert_eq!(coordinates[0].len(), 2);
                assert_eq!(coordinates[1].len(), 1);
            }
            other => panic!("expected MultiPolygon, got {:?}", other),
        }
    }

    #[test]
    fn test_single_part_polyline_is_line_string() {
        let line = lines(vec![vec![[0.0, 0.0], [1.0, 1.0]]]).unwrap();
        assert_eq!(line.geometry_type(), GeometryType::LineString);
        assert_eq!(lines(vec![vec![]]), None);
    }

    #[test]
    fn test_assemble_collapses_multi_variants() {
        let records = vec![
            FeatureRecord::new(None),
            FeatureRecord::new(Some(Geometry::MultiPoint { coordinates: vec![[0.0, 0.0], [1.0, 1.0]] })),
            FeatureRecord::new(Some(Geometry::point(2.0, 2.0))),
        ];
        let dataset = assemble_dataset("pts", None, vec![], records).unwrap();
        assert_eq!(dataset.geometry_type, GeometryType::Point);
    }

    #[test]
    fn test_assemble_rejects_mixed_families() {
        let records = vec![
            FeatureRecord::new(Some(Geometry::point(0.0, 0.0))),
            FeatureRecord::new(Some(Geometry::polygon(vec![vec![
                [0.0, 0.0],
                [1.0, 0.0],
                [1.0, 1.0],
                [0.0, 0.0],
            ]]))),
        ];
        let err = assemble_dataset("mixed", None, vec![], records).unwrap_err();
        match err {
            IngestError::MixedGeometryFamily { expected, found, feature_index } => {
                assert_eq!(expected, "Point");
                assert_eq!(found, "Polygon");
                assert_eq!(feature_index, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_assemble_structural_failures() {
        assert!(matches!(
            assemble_dataset("empty", None, vec![], vec![]),
            Err(IngestError::NoFeatures)
        ));
        assert!(matches!(
            assemble_dataset("nulls", None, vec![], vec![FeatureRecord::new(None), FeatureRecord::new(None)]),
            Err(IngestError::AllGeometryNull { count: 2 })
        ));
    }

    #[test]
    fn test_whole_numbers_become_integers() {
        assert_eq!(number(3.0), Value::from(3));
        assert_eq!(number(2.5), serde_json::json!(2.5));
        assert_eq!(convert_dbase_value(&DbaseFieldValue::Character(Some("  ".into()))), Value::Null);
    }
}
