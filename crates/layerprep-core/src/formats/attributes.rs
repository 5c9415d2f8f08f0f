//! Attribute table (.dbf) inspection
//!
//! Decides whether a shapefile's attribute table is usable before the
//! geometry reader opens it. A table at or below the empty threshold holds a
//! header and nothing else; such tables are not handed to the dBase reader
//! at all.

use serde::Serialize;
use shapefile::dbase;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::models::FieldKind;

/// One field descriptor from a dBase header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbfField {
    pub name: String,
    pub type_code: char,
    pub length: u8,
}

impl DbfField {
    /// Kind declared by the header; numeric columns are refined from their values
    pub fn kind(&self) -> FieldKind {
        FieldKind::from_dbase_code(self.type_code)
    }

    fn from_info(info: &dbase::FieldInfo) -> Self {
        Self {
            name: info.name().trim().to_string(),
            type_code: u8::from(info.field_type()) as char,
            length: info.length(),
        }
    }
}

/// What the inspector found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeTableInfo {
    pub present: bool,
    pub empty: bool,
    pub size_bytes: u64,
    /// Record count declared by the header
    pub record_count: Option<u32>,
    /// Field descriptors in column order
    pub fields: Vec<DbfField>,
    /// Why the header could not be parsed, if it could not
    pub header_error: Option<String>,
}

impl AttributeTableInfo {
    /// Whether the dBase reader should be used for attribute values
    pub fn is_usable(&self) -> bool {
        self.present
            && !self.empty
            && !self.fields.is_empty()
            && self.record_count.is_some_and(|n| n > 0)
    }

    /// Whether a synthetic identifier field must be added
    pub fn needs_synthetic_id(&self) -> bool {
        !self.is_usable()
    }

    /// Shapes without an attribute row, when the table is usable but short
    pub fn missing_rows(&self, shape_count: usize) -> Option<usize> {
        let records = self.record_count.filter(|_| self.is_usable())? as usize;
        (records < shape_count).then(|| shape_count - records)
    }
}

/// Inspect the attribute table of an extracted set.
///
/// `empty_threshold` is inclusive: a table of exactly that many bytes is empty.
/// Larger tables have their header read by the dBase reader; a header it
/// rejects is reported in `header_error` rather than failing the inspection.
pub fn inspect_attributes(dbf_path: Option<&Path>, empty_threshold: u64) -> Result<AttributeTableInfo> {
    let Some(path) = dbf_path.filter(|p| p.exists()) else {
        return Ok(AttributeTableInfo::default());
    };

    let size_bytes = fs::metadata(path)?.len();
    let mut info = AttributeTableInfo {
        present: true,
        empty: size_bytes <= empty_threshold,
        size_bytes,
        ..Default::default()
    };

    if info.empty {
        tracing::debug!(size_bytes, threshold = empty_threshold, "Attribute table is empty");
        return Ok(info);
    }

    match dbase::Reader::from_path(path) {
        Ok(reader) => {
            info.record_count = Some(reader.header().num_records);
            info.fields = reader
                .fields()
                .iter()
                .map(DbfField::from_info)
                .filter(|f| !f.name.is_empty())
                .collect();
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Unreadable attribute table header");
            info.header_error = Some(e.to_string());
        }
    }

    Ok(info)
}
