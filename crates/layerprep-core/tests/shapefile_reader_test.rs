//! Integration tests for the shapefile format layer
//!
//! Fixtures are encoded byte by byte, extracted through the archive layer
//! where the test is about the hand-off, and read back with the geometry
//! reader.

mod support;

use layerprep_core::formats::{
    inspect_attributes, read_geometry, ExtractedSet, ShapefileArchive,
};
use layerprep_core::models::{FieldKind, Geometry, GeometryType};
use layerprep_core::IngestError;
use serde_json::json;
use std::path::Path;
use support::*;
use tempfile::TempDir;

fn extracted(dir: &Path, base: &str, dbf: bool, prj: bool) -> ExtractedSet {
    let path = |ext: &str| dir.join(format!("{}.{}", base, ext));
    let cpg = path("cpg");
    ExtractedSet {
        base_name: base.to_string(),
        shp: path("shp"),
        shx: path("shx"),
        dbf: dbf.then(|| path("dbf")),
        prj: prj.then(|| path("prj")),
        cpg: cpg.exists().then_some(cpg),
    }
}

fn read(set: &ExtractedSet) -> layerprep_core::Result<layerprep_core::models::FeatureDataset> {
    let attributes = inspect_attributes(set.dbf.as_deref(), 33)?;
    read_geometry(set, &attributes, "ID")
}

#[test]
fn test_points_with_attributes_keep_column_order() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    let table = dbf(
        &[char_field("NAME", 12), num_field("POP", 6)],
        &[vec!["Alpha", "100"], vec!["Beta", "200"], vec!["Gamma", "300"]],
    );
    write_set(dir.path(), "towns", &[("shp", shp), ("shx", shx), ("dbf", table)]);

    let dataset = read(&extracted(dir.path(), "towns", true, false)).unwrap();

    assert_eq!(dataset.name, "towns");
    assert_eq!(dataset.feature_count(), 3);
    assert_eq!(dataset.geometry_type, GeometryType::Point);
    assert_eq!(dataset.field_names(), vec!["NAME", "POP"]);
    assert_eq!(dataset.fields[1].kind, FieldKind::Integer);
    assert_eq!(dataset.records[1].value("NAME"), &json!("Beta"));
    assert_eq!(dataset.records[2].value("POP"), &json!(300));
    assert!(!dataset.has_field("ID"));
    assert!(dataset.crs.is_none());
}

#[test]
fn test_missing_attribute_table_adds_sequence_id() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    write_set(dir.path(), "pts", &[("shp", shp), ("shx", shx)]);

    let dataset = read(&extracted(dir.path(), "pts", false, false)).unwrap();

    assert_eq!(dataset.field_names(), vec!["ID"]);
    let ids: Vec<_> = dataset.records.iter().map(|r| r.value("ID").clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn test_header_only_attribute_table_adds_sequence_id() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    write_set(
        dir.path(),
        "pts",
        &[("shp", shp), ("shx", shx), ("dbf", header_only_dbf())],
    );

    let set = extracted(dir.path(), "pts", true, false);
    let attributes = inspect_attributes(set.dbf.as_deref(), 33).unwrap();
    assert!(attributes.present);
    assert!(attributes.empty);

    let dataset = read_geometry(&set, &attributes, "ID").unwrap();
    assert_eq!(dataset.field_names(), vec!["ID"]);
}

#[test]
fn test_custom_identifier_name() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    write_set(dir.path(), "pts", &[("shp", shp), ("shx", shx)]);

    let set = extracted(dir.path(), "pts", false, false);
    let attributes = inspect_attributes(None, 33).unwrap();
    let dataset = read_geometry(&set, &attributes, "ROW_ID").unwrap();

    assert_eq!(dataset.field_names(), vec!["ROW_ID"]);
}

#[test]
fn test_polygons_with_esri_wgs84_prj() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = shp_and_shx(
        POLYGON,
        &[
            FixtureShape::Polygon(vec![unit_square(0.0, 0.0)]),
            FixtureShape::Polygon(vec![unit_square(5.0, 5.0), unit_square(8.0, 8.0)]),
        ],
    );
    write_set(
        dir.path(),
        "parcels",
        &[("shp", shp), ("shx", shx), ("prj", WGS84_PRJ.as_bytes().to_vec())],
    );

    let dataset = read(&extracted(dir.path(), "parcels", false, true)).unwrap();

    assert_eq!(dataset.geometry_type, GeometryType::Polygon);
    assert_eq!(dataset.crs.as_ref().and_then(|c| c.epsg_code()), Some(4326));
    assert_eq!(
        dataset.native_geometry_types(),
        vec![GeometryType::Polygon, GeometryType::MultiPolygon]
    );
}

#[test]
fn test_projected_prj_is_resolved() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = shp_and_shx(POINT, &[FixtureShape::Point(111319.49, 0.0)]);
    write_set(
        dir.path(),
        "merc",
        &[("shp", shp), ("shx", shx), ("prj", WEB_MERCATOR_PRJ.as_bytes().to_vec())],
    );

    let dataset = read(&extracted(dir.path(), "merc", false, true)).unwrap();
    let crs = dataset.crs.unwrap();

    assert_eq!(crs.epsg_code(), Some(3857));
    assert_eq!(crs.name.as_deref(), Some("WGS 84 / Pseudo-Mercator"));
}

#[test]
fn test_single_part_polyline() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = shp_and_shx(
        POLYLINE,
        &[FixtureShape::Polyline(vec![vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]]])],
    );
    write_set(dir.path(), "roads", &[("shp", shp), ("shx", shx)]);

    let dataset = read(&extracted(dir.path(), "roads", false, false)).unwrap();

    assert_eq!(dataset.geometry_type, GeometryType::LineString);
    assert!(matches!(
        dataset.records[0].geometry,
        Some(Geometry::LineString { ref coordinates }) if coordinates.len() == 3
    ));
}

#[test]
fn test_null_shapes_are_kept_as_null_records() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = shp_and_shx(
        POINT,
        &[FixtureShape::Point(1.0, 1.0), FixtureShape::Null, FixtureShape::Point(2.0, 2.0)],
    );
    write_set(dir.path(), "gaps", &[("shp", shp), ("shx", shx)]);

    let dataset = read(&extracted(dir.path(), "gaps", false, false)).unwrap();

    assert_eq!(dataset.feature_count(), 3);
    assert_eq!(dataset.null_geometry_count(), 1);
}

#[test]
fn test_structural_failures() {
    let dir = TempDir::new().unwrap();

    let (shp, shx) = shp_and_shx(POINT, &[]);
    write_set(dir.path(), "empty", &[("shp", shp), ("shx", shx)]);
    assert!(matches!(
        read(&extracted(dir.path(), "empty", false, false)),
        Err(IngestError::NoFeatures)
    ));

    let (shp, shx) = shp_and_shx(NULL_SHAPE, &[FixtureShape::Null, FixtureShape::Null]);
    write_set(dir.path(), "nogeom", &[("shp", shp), ("shx", shx)]);
    assert!(matches!(
        read(&extracted(dir.path(), "nogeom", false, false)),
        Err(IngestError::NoGeometry)
    ));

    let (shp, shx) = shp_and_shx(POINT, &[FixtureShape::Null, FixtureShape::Null]);
    write_set(dir.path(), "allnull", &[("shp", shp), ("shx", shx)]);
    assert!(matches!(
        read(&extracted(dir.path(), "allnull", false, false)),
        Err(IngestError::AllGeometryNull { count: 2 })
    ));
}

#[test]
fn test_not_a_shapefile() {
    let dir = TempDir::new().unwrap();
    write_set(dir.path(), "junk", &[("shp", vec![0u8; 120]), ("shx", vec![0u8; 100])]);

    let err = read(&extracted(dir.path(), "junk", false, false)).unwrap_err();
    assert!(matches!(err, IngestError::Shapefile { .. }));
}

#[test]
fn test_archive_to_dataset_hand_off() {
    let (shp, shx) = three_points();
    let table = dbf(
        &[char_field("NAME", 8)],
        &[vec!["a"], vec!["b"], vec!["c"]],
    );
    let bytes = zip_archive(&[
        ("data/Towns.SHP".to_string(), shp),
        ("data/Towns.shx".to_string(), shx),
        ("data/Towns.dbf".to_string(), table),
        ("__MACOSX/data/._Towns.shp".to_string(), vec![0u8; 10]),
    ]);

    let mut archive = ShapefileArchive::open(&bytes).unwrap();
    let validation = archive.validate();
    assert!(validation.valid);
    assert_eq!(validation.complete_sets, vec!["Towns"]);

    let dir = TempDir::new().unwrap();
    let set = archive.extract_set("Towns", dir.path()).unwrap();
    let dataset = read(&set).unwrap();

    assert_eq!(dataset.name, "Towns");
    assert_eq!(dataset.field_names(), vec!["NAME"]);
    assert_eq!(dataset.records[2].value("NAME"), &json!("c"));
}

#[test]
fn test_short_attribute_table_keeps_every_feature() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    let table = dbf(&[char_field("NAME", 8)], &[vec!["a"], vec!["b"]]);
    write_set(dir.path(), "short", &[("shp", shp), ("shx", shx), ("dbf", table)]);

    let set = extracted(dir.path(), "short", true, false);
    let attributes = inspect_attributes(set.dbf.as_deref(), 33).unwrap();
    let dataset = read_geometry(&set, &attributes, "ID").unwrap();

    assert_eq!(dataset.feature_count(), 3);
    assert_eq!(dataset.records[1].value("NAME"), &json!("b"));
    assert_eq!(dataset.records[2].value("NAME"), &serde_json::Value::Null);
    assert!(dataset.records[2].geometry.is_some());
    assert_eq!(attributes.missing_rows(dataset.feature_count()), Some(1));
}

#[test]
fn test_numeric_column_with_fractions_stays_double() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    let table = dbf(
        &[num_field("AREA", 8), num_field("RANK", 4)],
        &[vec!["1.5", "1"], vec!["2", "2"], vec!["", "3"]],
    );
    write_set(dir.path(), "areas", &[("shp", shp), ("shx", shx), ("dbf", table)]);

    let dataset = read(&extracted(dir.path(), "areas", true, false)).unwrap();

    assert_eq!(dataset.fields[0].kind, FieldKind::Double);
    assert_eq!(dataset.fields[1].kind, FieldKind::Integer);
    assert_eq!(dataset.records[0].value("AREA"), &json!(1.5));
    assert_eq!(dataset.records[2].value("AREA"), &serde_json::Value::Null);
}

#[test]
fn test_undeclared_windows_1252_text_is_decoded() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    let rows: Vec<Vec<&[u8]>> = vec![
        vec![&b"Caf\xe9"[..]],
        vec![&b"M\xfcnchen"[..]],
        vec![&b"Plain"[..]],
    ];
    let table = encoded_dbf(&[char_field("NAME", 12)], &rows);
    write_set(dir.path(), "cafes", &[("shp", shp), ("shx", shx), ("dbf", table)]);

    let dataset = read(&extracted(dir.path(), "cafes", true, false)).unwrap();

    assert_eq!(dataset.records[0].value("NAME"), &json!("Café"));
    assert_eq!(dataset.records[1].value("NAME"), &json!("München"));
    assert_eq!(dataset.records[2].value("NAME"), &json!("Plain"));
}

#[test]
fn test_code_page_file_selects_the_decoder() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    // "Київ" in Windows-1251
    let rows: Vec<Vec<&[u8]>> =
        vec![vec![&b"\xca\xe8\xbf\xe2"[..]], vec![&b"A"[..]], vec![&b"B"[..]]];
    let table = encoded_dbf(&[char_field("NAME", 8)], &rows);
    write_set(
        dir.path(),
        "cities",
        &[("shp", shp), ("shx", shx), ("dbf", table), ("cpg", b"1251".to_vec())],
    );

    let set = extracted(dir.path(), "cities", true, false);
    assert!(set.cpg.is_some());
    let dataset = read(&set).unwrap();

    assert_eq!(dataset.records[0].value("NAME"), &json!("Київ"));
}

#[test]
fn test_utf8_text_is_kept() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = three_points();
    let table = dbf(&[char_field("NAME", 12)], &[vec!["Zürich"], vec!["Köln"], vec!["Oslo"]]);
    write_set(
        dir.path(),
        "utf",
        &[("shp", shp), ("shx", shx), ("dbf", table), ("cpg", b"UTF-8".to_vec())],
    );

    let dataset = read(&extracted(dir.path(), "utf", true, false)).unwrap();

    assert_eq!(dataset.records[0].value("NAME"), &json!("Zürich"));
    assert_eq!(dataset.records[1].value("NAME"), &json!("Köln"));
}

#[test]
fn test_multipoint_shapes_collapse_to_point_family() {
    let dir = TempDir::new().unwrap();
    let (shp, shx) = shp_and_shx(
        MULTIPOINT,
        &[
            FixtureShape::Multipoint(vec![[0.0, 0.0], [1.0, 1.0]]),
            FixtureShape::Multipoint(vec![[5.0, 5.0]]),
        ],
    );
    write_set(dir.path(), "trees", &[("shp", shp), ("shx", shx)]);

    let dataset = read(&extracted(dir.path(), "trees", false, false)).unwrap();

    assert_eq!(dataset.geometry_type, GeometryType::Point);
    assert_eq!(dataset.native_geometry_types(), vec![GeometryType::MultiPoint]);
    assert!(matches!(
        dataset.records[0].geometry,
        Some(Geometry::MultiPoint { ref coordinates }) if coordinates.len() == 2
    ));
}
