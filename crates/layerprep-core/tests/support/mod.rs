//! Byte-level shapefile and archive fixtures shared by the integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;

pub const NULL_SHAPE: i32 = 0;
pub const POINT: i32 = 1;
pub const POLYLINE: i32 = 3;
pub const POLYGON: i32 = 5;
pub const MULTIPOINT: i32 = 8;

/// One record of a fixture shapefile
#[derive(Debug, Clone)]
pub enum FixtureShape {
    Null,
    Point(f64, f64),
    Polyline(Vec<Vec<[f64; 2]>>),
    Polygon(Vec<Vec<[f64; 2]>>),
    Multipoint(Vec<[f64; 2]>),
}

impl FixtureShape {
    fn content(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            FixtureShape::Null => out.extend_from_slice(&NULL_SHAPE.to_le_bytes()),
            FixtureShape::Point(x, y) => {
                out.extend_from_slice(&POINT.to_le_bytes());
                out.extend_from_slice(&x.to_le_bytes());
                out.extend_from_slice(&y.to_le_bytes());
            }
            FixtureShape::Multipoint(points) => {
                out.extend_from_slice(&MULTIPOINT.to_le_bytes());
                write_bbox(&mut out, points.iter());
                out.extend_from_slice(&(points.len() as i32).to_le_bytes());
                for p in points {
                    out.extend_from_slice(&p[0].to_le_bytes());
                    out.extend_from_slice(&p[1].to_le_bytes());
                }
            }
            FixtureShape::Polyline(parts) | FixtureShape::Polygon(parts) => {
                let code = if matches!(self, FixtureShape::Polyline(_)) { POLYLINE } else { POLYGON };
                out.extend_from_slice(&code.to_le_bytes());
                write_bbox(&mut out, parts.iter().flatten());
                let total: usize = parts.iter().map(Vec::len).sum();
                out.extend_from_slice(&(parts.len() as i32).to_le_bytes());
                out.extend_from_slice(&(total as i32).to_le_bytes());
                let mut offset = 0i32;
                for part in parts {
                    out.extend_from_slice(&offset.to_le_bytes());
                    offset += part.len() as i32;
                }
                for p in parts.iter().flatten() {
                    out.extend_from_slice(&p[0].to_le_bytes());
                    out.extend_from_slice(&p[1].to_le_bytes());
                }
            }
        }
        out
    }

    fn coords(&self) -> Vec<[f64; 2]> {
        match self {
            FixtureShape::Null => vec![],
            FixtureShape::Point(x, y) => vec![[*x, *y]],
            FixtureShape::Multipoint(points) => points.clone(),
            FixtureShape::Polyline(parts) | FixtureShape::Polygon(parts) => {
                parts.iter().flatten().copied().collect()
            }
        }
    }
}

fn write_bbox<'a>(out: &mut Vec<u8>, points: impl Iterator<Item = &'a [f64; 2]>) {
    let mut bbox = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
    let mut any = false;
    for p in points {
        any = true;
        bbox[0] = bbox[0].min(p[0]);
        bbox[1] = bbox[1].min(p[1]);
        bbox[2] = bbox[2].max(p[0]);
        bbox[3] = bbox[3].max(p[1]);
    }
    if !any {
        bbox = [0.0; 4];
    }
    for v in bbox {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn file_header(shape_type: i32, length_bytes: usize, shapes: &[FixtureShape]) -> Vec<u8> {
    let mut header = vec![0u8; 100];
    header[0..4].copy_from_slice(&9994i32.to_be_bytes());
    header[24..28].copy_from_slice(&((length_bytes / 2) as i32).to_be_bytes());
    header[28..32].copy_from_slice(&1000i32.to_le_bytes());
    header[32..36].copy_from_slice(&shape_type.to_le_bytes());

    let coords: Vec<[f64; 2]> = shapes.iter().flat_map(FixtureShape::coords).collect();
    let mut bbox = Vec::new();
    write_bbox(&mut bbox, coords.iter());
    header[36..68].copy_from_slice(&bbox);
    header
}

/// Encode matching .shp and .shx files
pub fn shp_and_shx(shape_type: i32, shapes: &[FixtureShape]) -> (Vec<u8>, Vec<u8>) {
    let mut records = Vec::new();
    let mut index = Vec::new();
    let mut offset = 100usize;

    for (i, shape) in shapes.iter().enumerate() {
        let content = shape.content();
        records.extend_from_slice(&((i + 1) as i32).to_be_bytes());
        records.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        records.extend_from_slice(&content);

        index.extend_from_slice(&((offset / 2) as i32).to_be_bytes());
        index.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        offset += 8 + content.len();
    }

    let mut shp = file_header(shape_type, 100 + records.len(), shapes);
    shp.extend_from_slice(&records);

    let mut shx = file_header(shape_type, 100 + index.len(), shapes);
    shx.extend_from_slice(&index);

    (shp, shx)
}

/// Character field of the given width
pub fn char_field(name: &str, width: u8) -> (String, u8, u8) {
    (name.to_string(), b'C', width)
}

/// Numeric integer field of the given width
pub fn num_field(name: &str, width: u8) -> (String, u8, u8) {
    (name.to_string(), b'N', width)
}

/// Encode a dBase III table
pub fn dbf(fields: &[(String, u8, u8)], rows: &[Vec<&str>]) -> Vec<u8> {
    let rows: Vec<Vec<&[u8]>> =
        rows.iter().map(|row| row.iter().map(|v| v.as_bytes()).collect()).collect();
    encoded_dbf(fields, &rows)
}

/// Encode a dBase III table whose cells are already in the table's code page
pub fn encoded_dbf(fields: &[(String, u8, u8)], rows: &[Vec<&[u8]>]) -> Vec<u8> {
    let header_len = 32 + fields.len() * 32 + 1;
    let record_len = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();

    let mut out = vec![0u8; 32];
    out[0] = 0x03;
    out[1..4].copy_from_slice(&[124, 1, 1]);
    out[4..8].copy_from_slice(&(rows.len() as u32).to_le_bytes());
    out[8..10].copy_from_slice(&(header_len as u16).to_le_bytes());
    out[10..12].copy_from_slice(&(record_len as u16).to_le_bytes());

    for (name, kind, width) in fields {
        let mut descriptor = [0u8; 32];
        descriptor[..name.len()].copy_from_slice(name.as_bytes());
        descriptor[11] = *kind;
        descriptor[16] = *width;
        out.extend_from_slice(&descriptor);
    }
    out.push(0x0D);

    for row in rows {
        out.push(b' ');
        for (value, (_, kind, width)) in row.iter().zip(fields) {
            let width = *width as usize;
            let mut cell = value[..value.len().min(width)].to_vec();
            let padding = vec![b' '; width - cell.len()];
            if *kind == b'N' {
                cell.splice(0..0, padding);
            } else {
                cell.extend(padding);
            }
            out.extend_from_slice(&cell);
        }
    }
    out.push(0x1A);
    out
}

/// A dBase header with no fields and no records: 33 bytes
pub fn header_only_dbf() -> Vec<u8> {
    let mut bytes = dbf(&[], &[]);
    bytes.pop();
    bytes
}

pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

pub const WEB_MERCATOR_PRJ: &str = r#"PROJCS["WGS 84 / Pseudo-Mercator",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Mercator_1SP"],PARAMETER["central_meridian",0],PARAMETER["scale_factor",1],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["X",EAST],AXIS["Y",NORTH],AUTHORITY["EPSG","3857"]]"#;

/// Write a component set into `dir` as `<base>.<ext>`
pub fn write_set(dir: &Path, base: &str, members: &[(&str, Vec<u8>)]) {
    for (ext, bytes) in members {
        std::fs::write(dir.join(format!("{}.{}", base, ext)), bytes).unwrap();
    }
}

/// Zip archive holding the given entries
pub fn zip_archive(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Three points as a shapefile without an attribute table
pub fn three_points() -> (Vec<u8>, Vec<u8>) {
    shp_and_shx(
        POINT,
        &[
            FixtureShape::Point(1.0, 1.0),
            FixtureShape::Point(2.0, 2.0),
            FixtureShape::Point(3.0, 3.0),
        ],
    )
}

/// Clockwise unit square, an outer ring in shapefile winding
pub fn unit_square(x: f64, y: f64) -> Vec<[f64; 2]> {
    vec![[x, y], [x, y + 1.0], [x + 1.0, y + 1.0], [x + 1.0, y], [x, y]]
}
